use client_core::local_store::keys;
use shared::protocol::LoginRequest;
use tracing::{error, info, warn};

use crate::controller::{
    context::PageContext,
    events::{classify_login_failure, FormField, Notification, UiErrorContext, UiEvent},
    navigation::Page,
};

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub two_factor: String,
}

pub struct LoginPage {
    ctx: PageContext,
    server: String,
    two_factor_visible: bool,
    pending_session: Option<String>,
    pub form: LoginForm,
}

impl LoginPage {
    pub async fn open(ctx: PageContext) -> Self {
        let settings = ctx.load_settings().await;
        let server = settings.server_or_default().to_string();
        ctx.check_server(&server).await;

        Self {
            ctx,
            server,
            two_factor_visible: false,
            pending_session: None,
            form: LoginForm::default(),
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn two_factor_visible(&self) -> bool {
        self.two_factor_visible
    }

    /// Marks blank required fields. Returns whether the form may be sent.
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
        if self.two_factor_visible && self.form.two_factor.trim().is_empty() {
            events.emit(UiEvent::FieldError {
                field: FormField::TwoFactor,
                message: "Enter the code from your authenticator".to_string(),
            });
            valid = false;
        }

        valid
    }

    /// Sends the form. Returns the next page once a session is established.
    pub async fn submit(&mut self) -> Option<Page> {
        if !self.validate() {
            return None;
        }

        self.ctx.events.emit(UiEvent::Busy(true));
        let next = self.attempt_login().await;
        self.ctx.events.emit(UiEvent::Busy(false));
        next
    }

    async fn attempt_login(&mut self) -> Option<Page> {
        let two_factor = Some(self.form.two_factor.trim().to_string())
            .filter(|code| self.two_factor_visible && !code.is_empty());
        let request = LoginRequest {
            server: self.server.clone(),
            username: self.form.username.clone(),
            password: self.form.password.clone(),
            two_factor,
            session_id: self.pending_session.clone(),
        };

        let response = match self.ctx.backend.login(request).await {
            Ok(response) => response,
            Err(err) => {
                error!("login call failed: {err}");
                self.ctx.events.error(
                    UiErrorContext::Login,
                    classify_login_failure(&err.to_string()),
                );
                return None;
            }
        };

        if response.requires_two_factor() {
            info!(username = %self.form.username, "server requested a two-factor code");
            self.two_factor_visible = true;
            if response.session_id.is_some() {
                self.pending_session = response.session_id;
            }
            self.ctx.events.emit(UiEvent::TwoFactorRequired);
            return None;
        }

        let token = response
            .token
            .filter(|token| response.success && !token.trim().is_empty());
        let Some(token) = token else {
            let message = response
                .message
                .unwrap_or_else(|| "Invalid credentials or server unavailable".to_string());
            warn!("login rejected: {message}");
            self.ctx.events.error(UiErrorContext::Login, message);
            return None;
        };

        if let Err(err) = self.persist_session(&token) {
            self.ctx.events.error(
                UiErrorContext::Login,
                format!("failed to store session: {err}"),
            );
            return None;
        }

        info!(username = %self.form.username, "logged in");
        self.ctx
            .events
            .notify(Notification::success(format!("Signed in as {}", self.form.username)));
        self.ctx.events.emit(UiEvent::Navigated(Page::ChatList));
        Some(Page::ChatList)
    }

    fn persist_session(&self, token: &str) -> Result<(), client_core::StoreError> {
        let mut store = self.ctx.local_store()?;
        store.set(keys::TOKEN, token)?;
        store.set(keys::SERVER, self.server.clone())
    }

    pub fn go_to_register(&self) -> Page {
        self.ctx.events.emit(UiEvent::Navigated(Page::Register));
        Page::Register
    }
}
