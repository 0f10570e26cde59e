use client_core::{spawn_poll, PollHandle};
use shared::settings::Theme;
use tracing::{debug, error, info};

use crate::controller::{
    context::PageContext,
    events::{FormField, Notification, UiErrorContext, UiEvent},
    navigation::Page,
};

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

pub struct RegisterPage {
    ctx: PageContext,
    server: String,
    monitor: Option<PollHandle>,
    pub form: RegisterForm,
}

impl RegisterPage {
    pub async fn open(ctx: PageContext) -> Self {
        let settings = ctx.load_settings().await;
        let server = settings.server_or_default().to_string();
        ctx.check_server(&server).await;

        let mut page = Self {
            ctx,
            server,
            monitor: None,
            form: RegisterForm::default(),
        };
        page.restart_monitor();
        page
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Re-probes the current server on the poll interval until the page is
    /// dropped or the server changes.
    fn restart_monitor(&mut self) {
        let ctx = self.ctx.clone();
        let server = self.server.clone();
        self.monitor = Some(spawn_poll(self.ctx.poll_interval, move || {
            let ctx = ctx.clone();
            let server = server.clone();
            async move {
                let online = ctx.check_server(&server).await;
                debug!(%server, online, "server status");
            }
        }));
    }

    pub fn validate(&self) -> bool {
        let events = &self.ctx.events;
        events.emit(UiEvent::FieldErrorsCleared);
        let mut valid = true;

        if self.form.username.trim().is_empty() {
            events.emit(UiEvent::FieldError {
                field: FormField::Username,
                message: "Enter a username".to_string(),
            });
            valid = false;
        }
        if self.form.password.trim().is_empty() {
            events.emit(UiEvent::FieldError {
                field: FormField::Password,
                message: "Enter a password".to_string(),
            });
            valid = false;
        }
        if self.form.password != self.form.confirm_password {
            events.emit(UiEvent::FieldError {
                field: FormField::ConfirmPassword,
                message: "Passwords do not match".to_string(),
            });
            valid = false;
        }

        valid
    }

    pub async fn submit(&mut self) -> Option<Page> {
        if !self.validate() {
            return None;
        }

        self.ctx.events.emit(UiEvent::Busy(true));
        let result = self
            .ctx
            .backend
            .register(&self.server, &self.form.username, &self.form.password)
            .await;
        self.ctx.events.emit(UiEvent::Busy(false));

        match result {
            Ok(response) if response.success => {
                info!(username = %self.form.username, "account registered");
                self.ctx.events.notify(Notification::success(
                    "Registration complete. You can sign in now.",
                ));
                self.ctx.events.emit(UiEvent::Navigated(Page::Login));
                Some(Page::Login)
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "Registration failed".to_string());
                self.ctx.events.error(UiErrorContext::Register, message);
                None
            }
            Err(err) => {
                error!("register call failed: {err}");
                self.ctx
                    .events
                    .error(UiErrorContext::Register, format!("Registration error: {err}"));
                None
            }
        }
    }

    /// Saves the settings panel, then re-checks and keeps monitoring the
    /// (possibly new) server.
    pub async fn save_settings(&mut self, server_url: &str, theme: Theme) -> bool {
        if self.ctx.save_settings(server_url, theme).await.is_none() {
            return false;
        }

        let settings = self.ctx.load_settings().await;
        self.server = settings.server_or_default().to_string();
        self.ctx.check_server(&self.server).await;
        self.restart_monitor();
        true
    }

    pub fn go_to_login(&self) -> Page {
        self.ctx.events.emit(UiEvent::Navigated(Page::Login));
        Page::Login
    }
}
