use serde::{Deserialize, Serialize};

/// Server address used when none has been configured yet.
pub const DEFAULT_SERVER_URL: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub server_url: String,
    pub theme: Theme,
}

impl AppSettings {
    /// The configured server, falling back to [`DEFAULT_SERVER_URL`] when blank.
    pub fn server_or_default(&self) -> &str {
        let server = self.server_url.trim();
        if server.is_empty() {
            DEFAULT_SERVER_URL
        } else {
            server
        }
    }

    pub fn apply(&mut self, update: SettingUpdate) {
        match update {
            SettingUpdate::ServerUrl(url) => self.server_url = url,
            SettingUpdate::Theme(theme) => self.theme = theme,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value")]
pub enum SettingUpdate {
    ServerUrl(String),
    Theme(Theme),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn setting_update_uses_field_value_shape() {
        let update: SettingUpdate =
            serde_json::from_value(json!({"field": "Theme", "value": "Dark"})).expect("update");
        assert_eq!(update, SettingUpdate::Theme(Theme::Dark));

        let encoded = serde_json::to_value(SettingUpdate::ServerUrl("chat.local".into()))
            .expect("encode");
        assert_eq!(encoded, json!({"field": "ServerUrl", "value": "chat.local"}));
    }

    #[test]
    fn blank_server_falls_back_to_default() {
        let settings = AppSettings {
            server_url: "   ".into(),
            theme: Theme::Light,
        };
        assert_eq!(settings.server_or_default(), DEFAULT_SERVER_URL);
    }
}
