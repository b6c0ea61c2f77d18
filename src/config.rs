//! Runtime configuration
//!
//! Resolved once at startup from an optional JSON blob embedded in the page,
//! then overridden by URL query parameters. Nothing is persisted.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::consts::LEADERBOARD_SIZE;

/// Game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Base URL of the scores endpoint (without `/scores`)
    pub backend_url: String,
    /// Rows requested from the leaderboard
    pub leaderboard_limit: usize,
    /// Name pre-filled on the name screen and used when none is entered
    pub default_name: String,
    /// Start with sound effects muted
    pub muted: bool,
    /// Session seed; taken from the clock when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            backend_url: "/api".to_string(),
            leaderboard_limit: LEADERBOARD_SIZE,
            default_name: "Player".to_string(),
            muted: false,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Parse a JSON config blob; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Apply overrides from a URL query string (`?backend=..&name=..&muted=1&seed=..`)
    ///
    /// Unknown keys and unparseable values are ignored.
    pub fn with_query(mut self, search: &str) -> Self {
        for pair in search.trim_start_matches('?').split('&') {
            let mut it = pair.splitn(2, '=');
            let Some(key) = it.next() else { continue };
            let value = decode_component(it.next().unwrap_or(""));
            match key {
                "backend" if !value.is_empty() => self.backend_url = value,
                "name" if !value.is_empty() => self.default_name = value,
                "muted" => self.muted = matches!(value.as_str(), "" | "1" | "true" | "yes"),
                "seed" => {
                    if let Ok(seed) = value.parse() {
                        self.seed = Some(seed);
                    }
                }
                "limit" => {
                    if let Ok(limit) = value.parse::<usize>() {
                        self.leaderboard_limit = limit.clamp(1, LEADERBOARD_SIZE);
                    }
                }
                _ => {}
            }
        }
        self
    }
}

/// Decode `+` and `%XX` escapes; malformed escapes are kept verbatim
fn decode_component(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.backend_url, "/api");
        assert_eq!(config.leaderboard_limit, LEADERBOARD_SIZE);
        assert!(!config.muted);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            GameConfig::from_json(r#"{"backend_url":"https://scores.example.com","muted":true}"#)
                .unwrap();
        assert_eq!(config.backend_url, "https://scores.example.com");
        assert!(config.muted);
        assert_eq!(config.default_name, "Player");
        assert!(GameConfig::from_json("{").is_err());
    }

    #[test]
    fn test_query_overrides() {
        let config = GameConfig::default().with_query(
            "?backend=https%3A%2F%2Fscores.example.com%2Fv1&name=Ada+L&muted&seed=42&other=x",
        );
        assert_eq!(config.backend_url, "https://scores.example.com/v1");
        assert_eq!(config.default_name, "Ada L");
        assert!(config.muted);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_query_ignores_bad_values() {
        let config = GameConfig::default().with_query("seed=abc&limit=500&backend=&muted=0");
        assert_eq!(config.seed, None);
        assert_eq!(config.leaderboard_limit, LEADERBOARD_SIZE);
        assert_eq!(config.backend_url, "/api");
        assert!(!config.muted);
    }

    #[test]
    fn test_decode_component() {
        assert_eq!(decode_component("a%20b"), "a b");
        assert_eq!(decode_component("100%"), "100%");
        assert_eq!(decode_component("%zz"), "%zz");
        assert_eq!(decode_component("%C3%A9"), "é");
        assert_eq!(decode_component("a%2"), "a%2");
    }

    #[test]
    fn test_query_decodes_multibyte_and_truncated_escapes() {
        let config = GameConfig::default().with_query("name=%F0%9F%98%80x&backend=a%2");
        assert_eq!(config.default_name, "\u{1F600}x");
        assert_eq!(config.backend_url, "a%2");
    }
}
