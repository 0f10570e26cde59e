//! UI events emitted by page controllers.

use crossbeam_channel::Sender;
use shared::{
    protocol::{Channel, Message},
    settings::{AppSettings, Theme},
};

use crate::controller::navigation::Page;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    ServerStatus { server: String, online: bool },
    SettingsLoaded(AppSettings),
    ThemeApplied(Theme),
    FieldErrorsCleared,
    FieldError { field: FormField, message: String },
    TwoFactorRequired,
    Busy(bool),
    ChannelsLoaded(Vec<Channel>),
    ChannelsEmpty,
    MessagesLoaded(Vec<Message>),
    DraftCleared,
    Notify(Notification),
    Error(UiError),
    Navigated(Page),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Username,
    Password,
    ConfirmPassword,
    TwoFactor,
    ChannelName,
}

impl FormField {
    pub fn label(self) -> &'static str {
        match self {
            FormField::Username => "username",
            FormField::Password => "password",
            FormField::ConfirmPassword => "confirm password",
            FormField::TwoFactor => "two-factor code",
            FormField::ChannelName => "channel name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Error,
}

/// Transient toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Cloneable handle pages use to push events to the renderer.
#[derive(Debug, Clone)]
pub struct UiEvents {
    tx: Sender<UiEvent>,
}

impl UiEvents {
    pub fn new(tx: Sender<UiEvent>) -> Self {
        Self { tx }
    }

    /// Queues an event for the renderer. Waits while the queue is full
    /// rather than dropping lists the user is waiting for.
    pub fn emit(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("ui renderer disconnected; dropping event");
        }
    }

    pub fn error(&self, context: UiErrorContext, message: impl Into<String>) {
        self.emit(UiEvent::Error(UiError::new(context, message)));
    }

    pub fn notify(&self, notification: Notification) {
        self.emit(UiEvent::Notify(notification));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    Login,
    Register,
    LoadChannels,
    LoadMessages,
    SendMessage,
    General,
}

pub fn classify_login_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("invalid server address") {
        "Server address is not valid; fix it in settings.".to_string()
    } else if lower.contains("failed to connect")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "Server unreachable; check the address and network, then retry.".to_string()
    } else {
        format!("Login error: {message}")
    }
}

/// Failure shown next to the part of the page it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn new(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
