use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    protocol::{
        endpoints, ChannelsResponse, LoginRequest, LoginResponse, RegisterResponse,
    },
    settings::{AppSettings, SettingUpdate},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub mod error;
pub mod local_store;
pub mod poll;
pub mod server;
pub mod settings_store;

pub use error::{BackendError, StoreError};
pub use local_store::LocalStore;
pub use poll::{spawn_poll, PollHandle, DEFAULT_POLL_INTERVAL};
pub use settings_store::SettingsStore;

/// Everything the page layer needs from the native side. One method per
/// bridge command.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, BackendError>;
    async fn register(
        &self,
        server: &str,
        username: &str,
        password: &str,
    ) -> Result<RegisterResponse, BackendError>;
    async fn get_settings(&self) -> Result<AppSettings, BackendError>;
    async fn update_setting(&self, update: SettingUpdate) -> Result<(), BackendError>;
    /// Reachability probe; never fails, an unreachable server is `false`.
    async fn check_dumb(&self, server: &str) -> bool;
    async fn get_channels(&self, server: &str, token: &str)
        -> Result<ChannelsResponse, BackendError>;
    async fn api_get(
        &self,
        server: &str,
        token: &str,
        endpoint: &str,
        data: Value,
    ) -> Result<Value, BackendError>;
    async fn api_post(
        &self,
        server: &str,
        token: &str,
        endpoint: &str,
        data: Value,
    ) -> Result<Value, BackendError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordLoginBody<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    two_factor_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyTwoFactorBody<'a> {
    username: &'a str,
    session_id: &'a str,
    two_factor_token: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    password: &'a str,
}

/// [`Backend`] talking HTTP to the chat server and keeping settings on disk.
pub struct NativeBackend {
    http: Client,
    settings: Mutex<SettingsStore>,
}

impl NativeBackend {
    pub fn new(settings: SettingsStore) -> Self {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(http: Client, settings: SettingsStore) -> Self {
        Self {
            http,
            settings: Mutex::new(settings),
        }
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await.map_err(BackendError::Unreachable)?;
        decode(response).await
    }
}

/// Decodes a reply body regardless of status: servers report rejections as
/// `{"success": false, "message": …}` alongside 4xx codes.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.bytes().await.map_err(BackendError::Unreachable)?;
    serde_json::from_slice(&body).map_err(|err| {
        warn!(%status, "undecodable server response: {err}");
        BackendError::Malformed(err)
    })
}

#[async_trait]
impl Backend for NativeBackend {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, BackendError> {
        let builder = match (request.two_factor.as_deref(), request.session_id.as_deref()) {
            (Some(code), Some(session_id)) => {
                let url = server::endpoint_url(&request.server, endpoints::VERIFY_TWO_FACTOR)?;
                info!(username = %request.username, "verifying two-factor login");
                self.http.post(url).json(&VerifyTwoFactorBody {
                    username: &request.username,
                    session_id,
                    two_factor_token: code,
                })
            }
            (code, _) => {
                let url = server::endpoint_url(&request.server, endpoints::LOGIN)?;
                info!(username = %request.username, "logging in");
                self.http.post(url).json(&PasswordLoginBody {
                    username: &request.username,
                    password: &request.password,
                    two_factor_token: code,
                })
            }
        };

        Self::send_json(builder).await
    }

    async fn register(
        &self,
        server: &str,
        username: &str,
        password: &str,
    ) -> Result<RegisterResponse, BackendError> {
        let url = server::endpoint_url(server, endpoints::REGISTER)?;
        info!(%username, "registering account");
        Self::send_json(
            self.http
                .post(url)
                .json(&RegisterBody { username, password }),
        )
        .await
    }

    async fn get_settings(&self) -> Result<AppSettings, BackendError> {
        let store = self.settings.lock().await;
        Ok(store.load()?)
    }

    async fn update_setting(&self, update: SettingUpdate) -> Result<(), BackendError> {
        let store = self.settings.lock().await;
        debug!(?update, "updating setting");
        store.apply(update)?;
        Ok(())
    }

    async fn check_dumb(&self, server: &str) -> bool {
        let url = match server::endpoint_url(server, endpoints::PING) {
            Ok(url) => url,
            Err(err) => {
                debug!("ping skipped: {err}");
                return false;
            }
        };

        match self.http.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(%server, "ping failed: {err}");
                false
            }
        }
    }

    async fn get_channels(
        &self,
        server: &str,
        token: &str,
    ) -> Result<ChannelsResponse, BackendError> {
        let url = server::endpoint_url(server, endpoints::CHANNELS)?;
        Self::send_json(self.http.get(url).bearer_auth(token)).await
    }

    async fn api_get(
        &self,
        server: &str,
        token: &str,
        endpoint: &str,
        data: Value,
    ) -> Result<Value, BackendError> {
        let mut url = server::endpoint_url(server, endpoint)?;
        server::append_query(&mut url, &data);
        debug!(%endpoint, "api get");
        Self::send_json(self.http.get(url).bearer_auth(token)).await
    }

    async fn api_post(
        &self,
        server: &str,
        token: &str,
        endpoint: &str,
        data: Value,
    ) -> Result<Value, BackendError> {
        let url = server::endpoint_url(server, endpoint)?;
        debug!(%endpoint, "api post");
        Self::send_json(self.http.post(url).bearer_auth(token).json(&data)).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
