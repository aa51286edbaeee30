//! Schema names: derivation from URLs and validation

use regex::Regex;
use std::sync::LazyLock;

use crate::error::RegistryError;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_]").expect("valid regex"));

static VALID_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("valid regex"));

/// Fallback when a URL yields no usable characters
pub const FALLBACK_NAME: &str = "schema";

/// Derive a stable, filesystem-safe schema name from a URL.
///
/// `https://api.example.com/users/1` becomes `api_example_com_users_1`.
pub fn schema_name_from_url(url: &str) -> String {
    let (host, path) = match url::Url::parse(url) {
        Ok(parsed) => {
            let mut host = parsed.host_str().unwrap_or_default().to_string();
            if let Some(port) = parsed.port() {
                host = format!("{}:{}", host, port);
            }
            (host, parsed.path().to_string())
        }
        Err(_) => (String::new(), url.to_string()),
    };

    let path = path.trim_matches('/').replace('/', "_");
    let host = host.replace(['.', ':'], "_");
    let raw = if path.is_empty() {
        host
    } else {
        format!("{}_{}", host, path)
    };

    let sanitized = UNSAFE_CHARS.replace_all(&raw.to_lowercase(), "_").into_owned();
    let trimmed = sanitized.trim_matches('_');

    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Check that a name can be used as a registry directory
pub fn validate_name(name: &str) -> Result<(), RegistryError> {
    if VALID_NAME.is_match(name) {
        Ok(())
    } else {
        Err(RegistryError::InvalidName(name.to_string()))
    }
}
