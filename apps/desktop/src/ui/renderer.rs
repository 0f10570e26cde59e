use std::{
    io::Write,
    thread::{self, JoinHandle},
};

use chrono::Local;
use crossbeam_channel::Receiver;
use shared::{
    protocol::{Attachment, Channel, Message},
    settings::Theme,
};

use crate::controller::{
    events::{NotificationKind, UiEvent},
    navigation::Page,
};

/// ANSI styling for one theme.
#[derive(Debug, Clone, Copy)]
struct Palette {
    accent: &'static str,
    muted: &'static str,
    error: &'static str,
    success: &'static str,
}

const RESET: &str = "\x1b[0m";

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                accent: "\x1b[34m",
                muted: "\x1b[90m",
                error: "\x1b[31m",
                success: "\x1b[32m",
            },
            Theme::Dark => Self {
                accent: "\x1b[96m",
                muted: "\x1b[37m",
                error: "\x1b[91m",
                success: "\x1b[92m",
            },
        }
    }
}

pub struct Renderer {
    palette: Palette,
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self {
            palette: Palette::for_theme(Theme::default()),
            color,
        }
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("{style}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Text for one event, or `None` for events with nothing to show.
    pub fn render(&mut self, event: &UiEvent) -> Option<String> {
        let p = self.palette;
        let line = match event {
            UiEvent::ServerStatus { server, online } => {
                if *online {
                    self.paint(p.success, &format!("● server {server} connected"))
                } else {
                    self.paint(p.error, &format!("○ server {server} unavailable"))
                }
            }
            UiEvent::SettingsLoaded(settings) => self.paint(
                p.muted,
                &format!(
                    "settings: server={} theme={:?}",
                    settings.server_or_default(),
                    settings.theme
                ),
            ),
            UiEvent::ThemeApplied(theme) => {
                self.palette = Palette::for_theme(*theme);
                return None;
            }
            UiEvent::FieldErrorsCleared | UiEvent::Busy(false) => return None,
            UiEvent::Busy(true) => self.paint(p.muted, "…"),
            UiEvent::FieldError { field, message } => {
                self.paint(p.error, &format!("{}: {message}", field.label()))
            }
            UiEvent::TwoFactorRequired => {
                self.paint(p.accent, "two-factor authentication required")
            }
            UiEvent::ChannelsLoaded(channels) => channels
                .iter()
                .map(|channel| self.channel_line(channel))
                .collect::<Vec<_>>()
                .join("\n"),
            UiEvent::ChannelsEmpty => self.paint(p.muted, "You have no chats yet"),
            UiEvent::MessagesLoaded(messages) => {
                if messages.is_empty() {
                    self.paint(p.muted, "No messages yet")
                } else {
                    messages
                        .iter()
                        .map(|message| self.message_line(message))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            UiEvent::DraftCleared => return None,
            UiEvent::Notify(notification) => {
                let style = match notification.kind {
                    NotificationKind::Success => p.success,
                    NotificationKind::Info => p.accent,
                    NotificationKind::Error => p.error,
                };
                self.paint(style, &notification.message)
            }
            UiEvent::Error(error) => self.paint(p.error, &format!("error: {}", error.message())),
            UiEvent::Navigated(page) => self.paint(p.muted, &format!("→ {}", page_title(page))),
        };
        Some(line)
    }

    fn channel_line(&self, channel: &Channel) -> String {
        let p = self.palette;
        let when = channel
            .last_activity
            .unwrap_or(channel.created_at)
            .with_timezone(&Local)
            .format("%H:%M");
        let preview = channel
            .last_message
            .clone()
            .unwrap_or_else(|| format!("Created by {}", channel.creator));
        let unread = if channel.unread_count > 0 {
            format!(" ({})", channel.unread_count)
        } else {
            String::new()
        };
        format!(
            "[{}] {}{unread} {} {}",
            channel.id,
            self.paint(p.accent, &channel.name),
            self.paint(p.muted, &when.to_string()),
            preview
        )
    }

    fn message_line(&self, message: &Message) -> String {
        let p = self.palette;
        let when = message.timestamp.with_timezone(&Local).format("%H:%M");
        let sender = if message.is_own() {
            self.paint(p.success, &message.sender)
        } else {
            self.paint(p.accent, &message.sender)
        };
        let mut line = format!(
            "{} {sender}: {}",
            self.paint(p.muted, &when.to_string()),
            message.text
        );
        match &message.attachment {
            Some(Attachment::File(file)) => {
                line.push_str(&format!(" [file {} {} B]", file.original_name, file.size));
            }
            Some(Attachment::Voice(voice)) => {
                line.push_str(&format!(" [voice {:.0}s]", voice.duration));
            }
            None => {}
        }
        line
    }
}

fn page_title(page: &Page) -> String {
    match page {
        Page::Login => "login".to_string(),
        Page::Register => "register".to_string(),
        Page::ChatList => "chats".to_string(),
        Page::Chat {
            channel_id: Some(id),
        } => format!("chat {id}"),
        Page::Chat { channel_id: None } => "chat".to_string(),
    }
}

/// Prints events on a dedicated thread until every sender is gone.
pub fn spawn_renderer(rx: Receiver<UiEvent>, color: bool) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut renderer = Renderer::new(color);
        let stdout = std::io::stdout();
        for event in rx {
            if let Some(text) = renderer.render(&event) {
                let mut out = stdout.lock();
                if writeln!(out, "{text}").is_err() {
                    break;
                }
            }
        }
    })
}
