//! Server address handling shared by every backend call.

use serde_json::Value;
use url::Url;

use crate::error::BackendError;

/// Trims trailing slashes and defaults the scheme to plain `http`.
pub fn normalize_server_url(server: &str) -> String {
    let server = server.trim();
    let (scheme, rest) = if let Some(rest) = server.strip_prefix("https://") {
        ("https://", rest)
    } else if let Some(rest) = server.strip_prefix("http://") {
        ("http://", rest)
    } else {
        ("http://", server)
    };
    format!("{scheme}{}", rest.trim_end_matches('/'))
}

/// Builds the absolute URL of `endpoint` on `server`.
///
/// Endpoints are appended verbatim to the normalized base, so a base path
/// such as `https://host/chat` is preserved and endpoints may already carry
/// a query string.
pub fn endpoint_url(server: &str, endpoint: &str) -> Result<Url, BackendError> {
    let invalid = |reason: String| BackendError::InvalidServer {
        address: server.to_string(),
        reason,
    };

    let base = normalize_server_url(server);
    let parsed = Url::parse(&base).map_err(|err| invalid(err.to_string()))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    let separator = if endpoint.starts_with('/') { "" } else { "/" };
    Url::parse(&format!("{base}{separator}{endpoint}")).map_err(|err| invalid(err.to_string()))
}

/// Appends the members of a JSON object as query parameters.
///
/// Strings go in verbatim, nulls are skipped and nested values are sent as
/// JSON text. Non-object payloads add nothing.
pub fn append_query(url: &mut Url, data: &Value) {
    let Value::Object(map) = data else {
        return;
    };
    if map.is_empty() {
        return;
    }

    let mut pairs = url.query_pairs_mut();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::String(text) => {
                pairs.append_pair(key, text);
            }
            Value::Bool(_) | Value::Number(_) => {
                pairs.append_pair(key, &value.to_string());
            }
            Value::Array(_) | Value::Object(_) => {
                pairs.append_pair(key, &value.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_host_gets_http_scheme() {
        assert_eq!(normalize_server_url("0.0.0.0:8000"), "http://0.0.0.0:8000");
        assert_eq!(
            normalize_server_url("https://chat.example.org/"),
            "https://chat.example.org"
        );
        assert_eq!(normalize_server_url(" localhost:9000// "), "http://localhost:9000");
        assert_eq!(normalize_server_url("http://"), "http://");
    }

    #[test]
    fn endpoint_keeps_base_path_and_query() {
        let url = endpoint_url("https://host/chat/", "/api/messages?channel=3").expect("url");
        assert_eq!(url.as_str(), "https://host/chat/api/messages?channel=3");

        let url = endpoint_url("host:1", "api/ping").expect("url");
        assert_eq!(url.as_str(), "http://host:1/api/ping");
    }

    #[test]
    fn blank_server_is_rejected() {
        for server in ["", "   ", "/", "http://", "https:///"] {
            match endpoint_url(server, "/api/ping") {
                Err(BackendError::InvalidServer { address, .. }) => assert_eq!(address, server),
                other => panic!("{server:?} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn query_skips_nulls_and_prints_scalars() {
        let mut url = endpoint_url("host", "/api/channels/search").expect("url");
        append_query(
            &mut url,
            &json!({"query": "gen eral", "limit": 5, "archived": false, "cursor": null}),
        );
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("archived".to_string(), "false".to_string()),
                ("limit".to_string(), "5".to_string()),
                ("query".to_string(), "gen eral".to_string()),
            ]
        );
    }
}
