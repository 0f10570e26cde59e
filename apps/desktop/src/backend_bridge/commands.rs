//! Commands accepted by the backend bridge.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{protocol::LoginRequest, settings::SettingUpdate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "args", rename_all = "snake_case")]
pub enum BackendCommand {
    Login(LoginRequest),
    Register {
        server: String,
        username: String,
        password: String,
    },
    GetSettings,
    UpdateSetting {
        update: SettingUpdate,
    },
    CheckDumb {
        server: String,
    },
    GetChannels {
        server: String,
        token: String,
    },
    ApiGet(ApiCall),
    ApiPost(ApiCall),
}

/// Arguments of the generic REST tunnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCall {
    pub server: String,
    pub token: String,
    pub endpoint: String,
    #[serde(default)]
    pub data: Value,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Login(_) => "login",
            BackendCommand::Register { .. } => "register",
            BackendCommand::GetSettings => "get_settings",
            BackendCommand::UpdateSetting { .. } => "update_setting",
            BackendCommand::CheckDumb { .. } => "check_dumb",
            BackendCommand::GetChannels { .. } => "get_channels",
            BackendCommand::ApiGet(_) => "api_get",
            BackendCommand::ApiPost(_) => "api_post",
        }
    }
}
