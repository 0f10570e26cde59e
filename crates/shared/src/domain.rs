use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned channel identifier.
///
/// Servers emit it either as a JSON number or a string, so it is kept as an
/// opaque string on the client side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(id) => ChannelId(id),
            Raw::Number(id) => ChannelId(id.to_string()),
        })
    }
}

/// Sender name the server uses for messages written by the current user.
pub const OWN_SENDER: &str = "you";
