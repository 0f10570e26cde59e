//! State every page is built from, plus the helpers pages share.

use std::{path::PathBuf, sync::Arc, time::Duration};

use client_core::{
    local_store::{keys, LocalStore},
    Backend, StoreError, DEFAULT_POLL_INTERVAL,
};
use shared::settings::{AppSettings, SettingUpdate, Theme};
use tracing::{error, info, warn};

use crate::controller::{
    events::{Notification, UiErrorContext, UiEvent, UiEvents},
    navigation::Page,
};

#[derive(Clone)]
pub struct PageContext {
    pub backend: Arc<dyn Backend>,
    pub session_path: PathBuf,
    pub events: UiEvents,
    pub poll_interval: Duration,
}

impl PageContext {
    pub fn new(backend: Arc<dyn Backend>, session_path: PathBuf, events: UiEvents) -> Self {
        Self {
            backend,
            session_path,
            events,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn local_store(&self) -> Result<LocalStore, StoreError> {
        LocalStore::open(&self.session_path)
    }

    /// Stored token, or the page to redirect to when there is none.
    pub fn require_session(&self) -> Result<String, Page> {
        let token = match self.local_store() {
            Ok(store) => store.token().map(str::to_string),
            Err(err) => {
                error!("failed to open session store: {err}");
                None
            }
        };

        token.ok_or_else(|| {
            info!("no session token; redirecting to login");
            self.events.emit(UiEvent::Navigated(Page::Login));
            Page::Login
        })
    }

    /// Fetches settings and mirrors them into the UI. Falls back to the
    /// defaults when the backend cannot provide them.
    pub async fn load_settings(&self) -> AppSettings {
        match self.backend.get_settings().await {
            Ok(settings) => {
                self.events.emit(UiEvent::SettingsLoaded(settings.clone()));
                self.events.emit(UiEvent::ThemeApplied(settings.theme));
                settings
            }
            Err(err) => {
                error!("failed to load settings: {err}");
                AppSettings::default()
            }
        }
    }

    /// Probes the server and reports the result as a status event.
    pub async fn check_server(&self, server: &str) -> bool {
        let online = self.backend.check_dumb(server).await;
        self.events.emit(UiEvent::ServerStatus {
            server: server.to_string(),
            online,
        });
        online
    }

    /// Persists the server address and theme from the settings panel.
    pub async fn save_settings(&self, server_url: &str, theme: Theme) -> Option<AppSettings> {
        let server_url = server_url.trim().to_string();
        let result = async {
            self.backend
                .update_setting(SettingUpdate::ServerUrl(server_url.clone()))
                .await?;
            self.backend.update_setting(SettingUpdate::Theme(theme)).await
        }
        .await;

        match result {
            Ok(()) => {
                self.events.emit(UiEvent::ThemeApplied(theme));
                self.events
                    .notify(Notification::success("Settings saved successfully"));
                Some(AppSettings { server_url, theme })
            }
            Err(err) => {
                warn!("failed to save settings: {err}");
                self.events
                    .notify(Notification::error(format!("Failed to save settings: {err}")));
                None
            }
        }
    }

    /// Forgets the session and returns to the login page.
    pub fn logout(&self) -> Page {
        match self.local_store() {
            Ok(mut store) => {
                for key in [keys::TOKEN, keys::SERVER] {
                    if let Err(err) = store.remove(key) {
                        self.events
                            .error(UiErrorContext::General, format!("failed to clear {key}: {err}"));
                    }
                }
            }
            Err(err) => {
                self.events
                    .error(UiErrorContext::General, format!("failed to open session store: {err}"));
            }
        }
        info!("logged out");
        self.events.notify(Notification::info("Signed out"));
        self.events.emit(UiEvent::Navigated(Page::Login));
        Page::Login
    }
}
