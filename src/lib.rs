//! Packet Drop - A five-lane falling-packet arcade game
//!
//! Core modules:
//! - `sim`: Deterministic round simulation (lanes, difficulty, spawning, physics, hit-testing)
//! - `session`: View state machine driving rounds and leaderboard requests
//! - `leaderboard`: Top-10 board model, wire shapes and backends
//! - `config`: Runtime configuration resolved from the page URL
//! - `audio`: Sound effects for session events (Web Audio playback on wasm)

pub mod audio;
pub mod config;
pub mod leaderboard;
pub mod session;
pub mod sim;

pub use config::GameConfig;
pub use leaderboard::{Leaderboard, LeaderboardEntry, ScoreSubmission};
pub use session::{GameSession, SessionEvent, View};

/// Game configuration constants
pub mod consts {
    /// Number of spawn lanes
    pub const LANES: usize = 5;
    /// Lane slot size of a packet (pixels, square)
    pub const PACKET_SIZE: f32 = 64.0;
    /// Horizontal padding at both board edges
    pub const PAD: f32 = 12.0;
    /// Drawn sprite size relative to the lane slot
    pub const SPRITE_SCALE: f32 = 0.8;

    /// Vertical spawn position (top of the slot)
    pub const SPAWN_Y: f32 = 10.0;
    /// Minimum vertical gap between packets in one lane, as a multiple of packet size
    pub const SPAWN_GAP_FACTOR: f32 = 1.6;
    /// Probability that a spawned packet is valid
    pub const VALID_CHANCE: f64 = 0.4;
    /// Packets seeded at round start
    pub const INITIAL_PACKETS: usize = 4;
    /// Vertical stagger between seeded packets, as a multiple of packet size
    pub const SEED_ROW_FACTOR: f32 = 1.5;

    /// Space between the floor line and the bottom of the board
    pub const FLOOR_PAD: f32 = 24.0;
    /// Thickness of the drawn floor line
    pub const FLOOR_THICKNESS: f32 = 4.0;

    /// Fall speed at round start (pixels/s)
    pub const BASE_SPEED: f32 = 260.0;
    /// Relative fall speed increase per minute of play
    pub const RAMP_PER_MIN: f32 = 0.6;
    /// Spawn interval at round start (ms)
    pub const BASE_MS: f32 = 900.0;
    /// Spawn interval reduction per minute of play (ms)
    pub const ACCEL_PER_MIN: f32 = 300.0;
    /// Shortest spawn interval (ms)
    pub const MIN_MS: f32 = 320.0;

    /// Score for clicking a valid packet
    pub const SCORE_PER_HIT: i64 = 10;
    /// Score change when a valid packet reaches the floor
    pub const SCORE_GREEN_MISS: i64 = -5;

    /// Countdown before a round starts (ms)
    pub const COUNTDOWN_MS: f32 = 3000.0;
    /// Longest frame delta fed to the simulation (s)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Nominal frame delta for the first frame of a loop (s)
    pub const NOMINAL_DT: f32 = 1.0 / 60.0;

    /// Maximum player name length (chars)
    pub const MAX_NAME_LEN: usize = 20;
    /// Leaderboard rows shown
    pub const LEADERBOARD_SIZE: usize = 10;
}
