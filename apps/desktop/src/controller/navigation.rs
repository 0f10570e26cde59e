use shared::domain::ChannelId;

/// Screens of the client. Each is rebuilt from scratch when navigated to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Login,
    Register,
    ChatList,
    Chat { channel_id: Option<ChannelId> },
}

impl Page {
    /// Pages that need a stored session token.
    pub fn is_protected(&self) -> bool {
        matches!(self, Page::ChatList | Page::Chat { .. })
    }
}
