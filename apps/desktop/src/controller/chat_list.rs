use client_core::local_store::keys;
use serde_json::{json, Value};
use shared::{
    domain::ChannelId,
    protocol::{endpoints, AckResponse, Channel, ChannelsResponse},
    settings::Theme,
};
use tracing::{error, info, warn};

use crate::controller::{
    context::PageContext,
    events::{FormField, Notification, UiErrorContext, UiEvent},
    navigation::Page,
};

pub struct ChatListPage {
    ctx: PageContext,
    token: String,
    server: String,
    channels: Vec<Channel>,
}

impl ChatListPage {
    /// Builds the page and loads the channel list. Without a session the
    /// login page is returned instead.
    pub async fn open(ctx: PageContext) -> Result<Self, Page> {
        let token = ctx.require_session()?;
        let settings = ctx.load_settings().await;

        let mut page = Self {
            server: settings.server_or_default().to_string(),
            ctx,
            token,
            channels: Vec::new(),
        };
        page.load_channels().await;
        Ok(page)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub async fn load_channels(&mut self) {
        match self.ctx.backend.get_channels(&self.server, &self.token).await {
            Ok(response) => self.show(response),
            Err(err) => {
                error!("failed to load channels: {err}");
                self.ctx.events.error(
                    UiErrorContext::LoadChannels,
                    format!("Could not load chats: {err}"),
                );
            }
        }
    }

    /// Filters the list on the server. A blank query restores the full list.
    pub async fn search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.load_channels().await;
            return;
        }

        let reply = self
            .ctx
            .backend
            .api_get(
                &self.server,
                &self.token,
                endpoints::CHANNELS_SEARCH,
                json!({ "query": query }),
            )
            .await;
        match reply.map(serde_json::from_value::<ChannelsResponse>) {
            Ok(Ok(response)) => self.show(response),
            Ok(Err(err)) => {
                warn!("unexpected search reply: {err}");
                self.ctx.events.error(
                    UiErrorContext::LoadChannels,
                    format!("malformed search reply: {err}"),
                );
            }
            Err(err) => {
                error!(%query, "channel search failed: {err}");
                self.ctx
                    .events
                    .error(UiErrorContext::LoadChannels, format!("Search failed: {err}"));
            }
        }
    }

    pub async fn create_channel(&mut self, name: &str) -> bool {
        let name = name.trim();
        self.ctx.events.emit(UiEvent::FieldErrorsCleared);
        if name.is_empty() {
            self.ctx.events.emit(UiEvent::FieldError {
                field: FormField::ChannelName,
                message: "Enter a channel name".to_string(),
            });
            return false;
        }

        let reply = self
            .ctx
            .backend
            .api_post(
                &self.server,
                &self.token,
                endpoints::CHANNELS_CREATE,
                json!({ "name": name }),
            )
            .await;

        match reply.map(ack) {
            Ok(ack) if ack.success => {
                info!(%name, "channel created");
                self.ctx
                    .events
                    .notify(Notification::success(format!("Channel '{name}' created")));
                self.load_channels().await;
                true
            }
            Ok(ack) => {
                let message = ack
                    .message
                    .unwrap_or_else(|| "Could not create channel".to_string());
                self.ctx.events.notify(Notification::error(message));
                false
            }
            Err(err) => {
                error!(%name, "create channel failed: {err}");
                self.ctx
                    .events
                    .notify(Notification::error(format!("Could not create channel: {err}")));
                false
            }
        }
    }

    /// Remembers the channel as last selected and moves to its chat view.
    pub fn open_channel(&self, channel_id: &ChannelId) -> Page {
        match self.ctx.local_store() {
            Ok(mut store) => {
                if let Err(err) = store.set(keys::LAST_CHANNEL, channel_id.as_str()) {
                    warn!("failed to remember channel: {err}");
                }
            }
            Err(err) => warn!("failed to open session store: {err}"),
        }

        let page = Page::Chat {
            channel_id: Some(channel_id.clone()),
        };
        self.ctx.events.emit(UiEvent::Navigated(page.clone()));
        page
    }

    pub async fn save_settings(&mut self, server_url: &str, theme: Theme) -> bool {
        match self.ctx.save_settings(server_url, theme).await {
            Some(settings) => {
                self.server = settings.server_or_default().to_string();
                true
            }
            None => false,
        }
    }

    pub fn logout(self) -> Page {
        self.ctx.logout()
    }

    fn show(&mut self, response: ChannelsResponse) {
        if !response.success || response.channels.is_empty() {
            self.channels.clear();
            self.ctx.events.emit(UiEvent::ChannelsEmpty);
            return;
        }

        self.channels = response.channels;
        self.ctx
            .events
            .emit(UiEvent::ChannelsLoaded(self.channels.clone()));
    }
}

/// Reads a `{success, message?}` reply. Anything else counts as a failure.
pub(crate) fn ack(value: Value) -> AckResponse {
    serde_json::from_value(value).unwrap_or_default()
}
