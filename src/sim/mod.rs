//! Deterministic round simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Wall-time `dt` supplied by the caller, never read from a clock
//! - Seeded RNG only
//! - Stable packet order (spawn order)
//! - No rendering or platform dependencies

pub mod difficulty;
pub mod geometry;
pub mod hit;
pub mod spawn;
pub mod state;
pub mod tick;

pub use difficulty::{Difficulty, fall_speed, spawn_interval_ms};
pub use geometry::{BoardGeometry, Rect, lane_offsets};
pub use hit::{HitOutcome, hit_test, resolve_pointer};
pub use spawn::{safe_lanes, seed_packets, spawn_packet};
pub use state::{GameEvent, Packet, RoundState, Sprite};
pub use tick::tick;
