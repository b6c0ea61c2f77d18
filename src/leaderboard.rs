//! Leaderboard model and score backends
//!
//! The board is served by an external endpoint:
//! - `GET {base}/scores?limit=N` → `{"scores": [{"name": .., "score": ..}, ..]}`
//! - `POST {base}/scores` with `{"name": .., "score": .., "reason": ..}`
//!
//! Failures never reach the player: they are logged and turned into an
//! empty board.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consts::{LEADERBOARD_SIZE, MAX_NAME_LEN};

/// Name shown in rows padding a short board
pub const PLACEHOLDER_NAME: &str = "—";

/// Entries kept by the in-memory backend
pub const MEMORY_BACKEND_CAPACITY: usize = 100;

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The player clicked a corrupted packet
    ClickedRed,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::ClickedRed => "clicked_red",
        }
    }
}

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: i64,
    /// Unix timestamp (ms), when the backend reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl LeaderboardEntry {
    pub fn new(name: impl Into<String>, score: i64) -> Self {
        Self {
            name: name.into(),
            score,
            timestamp: None,
        }
    }

    /// Lenient decode of one row; rows without a string name and a numeric score are rejected
    fn from_value(value: &Value) -> Option<Self> {
        let name = value.get("name")?.as_str()?.to_string();
        let score = value.get("score")?;
        let score = score.as_i64().or_else(|| {
            score
                .as_f64()
                .filter(|s| s.is_finite())
                .map(|s| s.round() as i64)
        })?;
        let timestamp = value.get("timestamp").and_then(Value::as_f64);
        Some(Self {
            name,
            score,
            timestamp,
        })
    }
}

/// Trim a player name and cut it to `MAX_NAME_LEN` characters
pub fn sanitize_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .take(MAX_NAME_LEN)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Body of `POST /scores`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub name: String,
    pub score: i64,
    pub reason: EndReason,
}

impl ScoreSubmission {
    pub fn new(name: &str, score: i64, reason: EndReason) -> Self {
        Self {
            name: sanitize_name(name),
            score,
            reason,
        }
    }
}

/// A displayed leaderboard row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    /// 1-indexed
    pub rank: usize,
    pub name: String,
    pub score: i64,
}

/// Top scores as served by the backend, best first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<LeaderboardEntry>) -> Self {
        Self { entries }
    }

    /// Decode a `GET /scores` body
    ///
    /// A body that is not JSON is an error. Any JSON without a `scores` array
    /// is an empty board; malformed rows are skipped.
    pub fn from_response_body(body: &str) -> Result<Self, LeaderboardError> {
        let value: Value = serde_json::from_str(body)?;
        let entries = value
            .get("scores")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(LeaderboardEntry::from_value)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self { entries })
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exactly `LEADERBOARD_SIZE` display rows, padding with `("—", 0)`
    pub fn rows(&self) -> Vec<LeaderboardRow> {
        (0..LEADERBOARD_SIZE)
            .map(|i| match self.entries.get(i) {
                Some(entry) => LeaderboardRow {
                    rank: i + 1,
                    name: entry.name.clone(),
                    score: entry.score,
                },
                None => LeaderboardRow {
                    rank: i + 1,
                    name: PLACEHOLDER_NAME.to_string(),
                    score: 0,
                },
            })
            .collect()
    }
}

/// `GET` URL for the top `limit` scores
pub fn scores_url(base_url: &str, limit: usize) -> String {
    format!("{}/scores?limit={}", base_url.trim_end_matches('/'), limit)
}

/// `POST` URL for score submission
pub fn submit_url(base_url: &str) -> String {
    format!("{}/scores", base_url.trim_end_matches('/'))
}

/// Leaderboard call failures
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Where scores are stored and served from
#[allow(async_fn_in_trait)]
pub trait ScoreBackend {
    /// Persist a finished round
    async fn submit(&self, submission: &ScoreSubmission) -> Result<(), LeaderboardError>;
    /// Fetch the best `limit` scores
    async fn top(&self, limit: usize) -> Result<Leaderboard, LeaderboardError>;
}

/// Persist a round's score, then fetch the refreshed board
///
/// A failed submission does not stop the fetch; a failed fetch yields an
/// empty board.
pub async fn submit_and_refresh<B: ScoreBackend>(
    backend: &B,
    submission: &ScoreSubmission,
    limit: usize,
) -> Leaderboard {
    if let Err(e) = backend.submit(submission).await {
        log::warn!("Score submission failed: {}", e);
    }
    fetch_or_empty(backend, limit).await
}

/// Fetch the board, logging and swallowing failures
pub async fn fetch_or_empty<B: ScoreBackend>(backend: &B, limit: usize) -> Leaderboard {
    match backend.top(limit).await {
        Ok(board) => board,
        Err(e) => {
            log::warn!("Leaderboard fetch failed: {}", e);
            Leaderboard::new()
        }
    }
}

/// In-process score store, sorted best first
///
/// Stands in for the HTTP endpoint on native builds and in tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RefCell<Vec<LeaderboardEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a score, returning its 1-indexed rank (None if it fell off the end)
    ///
    /// Ties keep the earlier entry ahead.
    pub fn record(&self, submission: &ScoreSubmission) -> Option<usize> {
        let mut entries = self.entries.borrow_mut();
        let entry = LeaderboardEntry::new(submission.name.clone(), submission.score);

        // Find insertion point (sorted descending by score)
        let pos = entries.iter().position(|e| submission.score > e.score);
        let rank = match pos {
            Some(i) => {
                entries.insert(i, entry);
                i + 1
            }
            None => {
                entries.push(entry);
                entries.len()
            }
        };

        // Trim to max size
        entries.truncate(MEMORY_BACKEND_CAPACITY);
        (rank <= MEMORY_BACKEND_CAPACITY).then_some(rank)
    }

    /// The best `limit` entries
    pub fn top_entries(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.entries.borrow().iter().take(limit).cloned().collect()
    }
}

impl ScoreBackend for MemoryBackend {
    async fn submit(&self, submission: &ScoreSubmission) -> Result<(), LeaderboardError> {
        self.record(submission);
        Ok(())
    }

    async fn top(&self, limit: usize) -> Result<Leaderboard, LeaderboardError> {
        Ok(Leaderboard::from_entries(self.top_entries(limit)))
    }
}

#[cfg(target_arch = "wasm32")]
pub use http::HttpBackend;

#[cfg(target_arch = "wasm32")]
mod http {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    use super::*;

    fn js_error(e: JsValue) -> LeaderboardError {
        LeaderboardError::Network(format!("{:?}", e))
    }

    /// Browser `fetch` client for the scores endpoint
    #[derive(Debug, Clone)]
    pub struct HttpBackend {
        base_url: String,
    }

    impl HttpBackend {
        pub fn new(base_url: impl Into<String>) -> Self {
            Self {
                base_url: base_url.into(),
            }
        }

        async fn send(&self, request: Request) -> Result<Response, LeaderboardError> {
            let window = web_sys::window()
                .ok_or_else(|| LeaderboardError::Network("no window".to_string()))?;
            let value = JsFuture::from(window.fetch_with_request(&request))
                .await
                .map_err(js_error)?;
            let response: Response = value.dyn_into().map_err(js_error)?;
            if !response.ok() {
                return Err(LeaderboardError::Status(response.status()));
            }
            Ok(response)
        }
    }

    impl ScoreBackend for HttpBackend {
        async fn submit(&self, submission: &ScoreSubmission) -> Result<(), LeaderboardError> {
            let body = serde_json::to_string(submission)?;
            let init = RequestInit::new();
            init.set_method("POST");
            init.set_mode(RequestMode::Cors);
            init.set_body(&JsValue::from_str(&body));

            let url = submit_url(&self.base_url);
            let request = Request::new_with_str_and_init(&url, &init).map_err(js_error)?;
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(js_error)?;

            self.send(request).await?;
            log::info!("Submitted score {} for {}", submission.score, submission.name);
            Ok(())
        }

        async fn top(&self, limit: usize) -> Result<Leaderboard, LeaderboardError> {
            let init = RequestInit::new();
            init.set_method("GET");
            init.set_mode(RequestMode::Cors);

            let url = scores_url(&self.base_url, limit);
            let request = Request::new_with_str_and_init(&url, &init).map_err(js_error)?;
            let response = self.send(request).await?;
            let text = JsFuture::from(response.text().map_err(js_error)?)
                .await
                .map_err(js_error)?;
            let body = text.as_string().unwrap_or_default();
            let board = Leaderboard::from_response_body(&body)?;
            log::info!("Loaded {} leaderboard entries", board.entries.len());
            Ok(board)
        }
    }
}
