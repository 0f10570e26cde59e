//! Dispatch of bridge commands onto a [`Backend`].

use client_core::Backend;
use serde::Serialize;
use serde_json::Value;
use shared::error::{ApiError, ErrorCode};

use crate::backend_bridge::commands::BackendCommand;

pub fn parse_command(raw: &str) -> Result<BackendCommand, ApiError> {
    serde_json::from_str(raw).map_err(|err| {
        ApiError::new(ErrorCode::Validation, format!("invalid backend command: {err}"))
    })
}

/// Runs one command and returns its reply as JSON.
pub async fn invoke(backend: &dyn Backend, command: BackendCommand) -> Result<Value, ApiError> {
    let name = command.name();
    tracing::debug!(command = name, "invoke");

    let reply = match command {
        BackendCommand::Login(request) => to_json(backend.login(request).await?),
        BackendCommand::Register {
            server,
            username,
            password,
        } => to_json(backend.register(&server, &username, &password).await?),
        BackendCommand::GetSettings => to_json(backend.get_settings().await?),
        BackendCommand::UpdateSetting { update } => {
            backend.update_setting(update).await?;
            Ok(Value::Null)
        }
        BackendCommand::CheckDumb { server } => Ok(Value::Bool(backend.check_dumb(&server).await)),
        BackendCommand::GetChannels { server, token } => {
            to_json(backend.get_channels(&server, &token).await?)
        }
        BackendCommand::ApiGet(call) => Ok(backend
            .api_get(&call.server, &call.token, &call.endpoint, call.data)
            .await?),
        BackendCommand::ApiPost(call) => Ok(backend
            .api_post(&call.server, &call.token, &call.endpoint, call.data)
            .await?),
    };

    if let Err(err) = &reply {
        tracing::warn!(command = name, "invoke failed: {}", err.message);
    }
    reply
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|err| ApiError::new(ErrorCode::Internal, err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use client_core::{NativeBackend, SettingsStore};
    use serde_json::json;
    use shared::settings::{SettingUpdate, Theme};

    use super::*;

    #[test]
    fn parses_tagged_commands() {
        let command = parse_command(
            r#"{"cmd":"update_setting","args":{"update":{"field":"Theme","value":"Dark"}}}"#,
        )
        .expect("parse");
        assert_eq!(
            command,
            BackendCommand::UpdateSetting {
                update: SettingUpdate::Theme(Theme::Dark)
            }
        );

        assert_eq!(
            parse_command(r#"{"cmd":"get_settings"}"#).expect("parse"),
            BackendCommand::GetSettings
        );

        let api = parse_command(
            r#"{"cmd":"api_get","args":{"server":"h","token":"t","endpoint":"/api/channels"}}"#,
        )
        .expect("parse");
        assert_eq!(api.name(), "api_get");
    }

    #[test]
    fn unknown_commands_are_validation_errors() {
        let err = parse_command(r#"{"cmd":"set_theme","args":{}}"#).expect_err("must fail");
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn settings_commands_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = Arc::new(NativeBackend::new(SettingsStore::in_dir(dir.path())));

        invoke(
            backend.as_ref(),
            BackendCommand::UpdateSetting {
                update: SettingUpdate::ServerUrl("chat.local".into()),
            },
        )
        .await
        .expect("update");

        let settings = invoke(backend.as_ref(), BackendCommand::GetSettings)
            .await
            .expect("get");
        assert_eq!(settings, json!({"server_url": "chat.local", "theme": "Light"}));
    }

    #[tokio::test]
    async fn backend_failures_become_api_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = NativeBackend::new(SettingsStore::in_dir(dir.path()));

        let err = invoke(
            &backend,
            BackendCommand::GetChannels {
                server: String::new(),
                token: "t".into(),
            },
        )
        .await
        .expect_err("must fail");
        assert_eq!(err.code, ErrorCode::InvalidServer);

        let reachable = invoke(
            &backend,
            BackendCommand::CheckDumb {
                server: String::new(),
            },
        )
        .await
        .expect("check");
        assert_eq!(reachable, Value::Bool(false));
    }
}
