use std::sync::Arc;

use client_core::{local_store::keys, spawn_poll, Backend, PollHandle};
use serde_json::json;
use shared::{
    domain::ChannelId,
    protocol::{endpoints, MessagesResponse},
};
use tracing::{debug, error, info, warn};

use crate::controller::{
    chat_list::ack,
    context::PageContext,
    events::{Notification, UiErrorContext, UiEvent, UiEvents},
    navigation::Page,
};

/// What the refresh loop needs to pull one channel's messages.
#[derive(Clone)]
pub struct MessageFeed {
    backend: Arc<dyn Backend>,
    events: UiEvents,
    server: String,
    token: String,
    channel_id: ChannelId,
}

impl MessageFeed {
    /// Loads and displays the channel's messages. Returns whether it worked.
    pub async fn refresh(&self) -> bool {
        let reply = self
            .backend
            .api_get(
                &self.server,
                &self.token,
                endpoints::MESSAGES,
                json!({ "channel": self.channel_id.as_str() }),
            )
            .await;

        match reply.map(serde_json::from_value::<MessagesResponse>) {
            Ok(Ok(response)) if response.success => {
                debug!(
                    channel_id = %self.channel_id,
                    count = response.messages.len(),
                    "messages refreshed"
                );
                self.events.emit(UiEvent::MessagesLoaded(response.messages));
                true
            }
            Ok(Ok(_)) | Ok(Err(_)) => {
                self.events
                    .error(UiErrorContext::LoadMessages, "Could not load messages");
                false
            }
            Err(err) => {
                error!(channel_id = %self.channel_id, "failed to load messages: {err}");
                self.events.error(
                    UiErrorContext::LoadMessages,
                    format!("Error loading messages: {err}"),
                );
                false
            }
        }
    }
}

pub struct ChatPage {
    ctx: PageContext,
    feed: MessageFeed,
    poller: Option<PollHandle>,
    pub draft: String,
}

impl ChatPage {
    /// Opens `channel_id`, or the last selected channel when none is given,
    /// loads its messages and starts the refresh loop.
    pub async fn open(ctx: PageContext, channel_id: Option<ChannelId>) -> Result<Self, Page> {
        let token = ctx.require_session()?;
        let settings = ctx.load_settings().await;

        let mut store = ctx.local_store().ok();
        let channel_id = channel_id.or_else(|| {
            store
                .as_ref()
                .and_then(|store| store.get(keys::LAST_CHANNEL))
                .map(ChannelId::from)
        });
        let Some(channel_id) = channel_id else {
            warn!("chat opened without a channel");
            ctx.events.notify(Notification::error("No channel selected"));
            ctx.events.emit(UiEvent::Navigated(Page::ChatList));
            return Err(Page::ChatList);
        };
        if let Some(store) = store.as_mut() {
            if let Err(err) = store.set(keys::LAST_CHANNEL, channel_id.as_str()) {
                warn!("failed to remember channel: {err}");
            }
        }

        let feed = MessageFeed {
            backend: Arc::clone(&ctx.backend),
            events: ctx.events.clone(),
            server: settings.server_or_default().to_string(),
            token,
            channel_id,
        };
        info!(channel_id = %feed.channel_id, "opening chat");
        feed.refresh().await;

        let poll_feed = feed.clone();
        let poller = spawn_poll(ctx.poll_interval, move || {
            let feed = poll_feed.clone();
            async move {
                feed.refresh().await;
            }
        });

        Ok(Self {
            ctx,
            feed,
            poller: Some(poller),
            draft: String::new(),
        })
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.feed.channel_id
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(PollHandle::is_running)
    }

    pub async fn refresh(&self) -> bool {
        self.feed.refresh().await
    }

    /// Posts the draft. The draft is cleared only when the server accepts
    /// the message; otherwise it is kept for another try.
    pub async fn send(&mut self) -> bool {
        let text = self.draft.trim().to_string();
        if text.is_empty() {
            return false;
        }

        let reply = self
            .ctx
            .backend
            .api_post(
                &self.feed.server,
                &self.feed.token,
                endpoints::MESSAGE,
                json!({ "channel": self.feed.channel_id.as_str(), "text": text }),
            )
            .await;

        match reply.map(ack) {
            Ok(ack) if ack.success => {
                self.draft.clear();
                self.ctx.events.emit(UiEvent::DraftCleared);
                self.feed.refresh().await;
                true
            }
            Ok(ack) => {
                let message = ack.message.unwrap_or_else(|| "Failed to send".to_string());
                warn!(channel_id = %self.feed.channel_id, "message rejected: {message}");
                self.ctx.events.error(UiErrorContext::SendMessage, message);
                false
            }
            Err(err) => {
                error!(channel_id = %self.feed.channel_id, "send failed: {err}");
                self.ctx
                    .events
                    .error(UiErrorContext::SendMessage, format!("Failed to send: {err}"));
                false
            }
        }
    }

    /// Leaves the chat; the refresh loop stops with the page.
    pub fn back(mut self) -> Page {
        self.poller.take();
        self.ctx.events.emit(UiEvent::Navigated(Page::ChatList));
        Page::ChatList
    }
}
