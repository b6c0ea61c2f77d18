//! Round state and core simulation types

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::Difficulty;
use super::geometry::Rect;
use crate::consts::*;

/// Logo sprites carried by valid packets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sprite {
    Tcp,
    Udp,
    Http,
    Dns,
    Tls,
}

impl Sprite {
    /// The sprite pool spawns pick from
    pub const ALL: [Sprite; 5] = [Sprite::Tcp, Sprite::Udp, Sprite::Http, Sprite::Dns, Sprite::Tls];

    /// Short label drawn on the packet
    pub fn label(&self) -> &'static str {
        match self {
            Sprite::Tcp => "TCP",
            Sprite::Udp => "UDP",
            Sprite::Http => "HTTP",
            Sprite::Dns => "DNS",
            Sprite::Tls => "TLS",
        }
    }

    /// Fill colour as a CSS hex string
    pub fn color(&self) -> &'static str {
        match self {
            Sprite::Tcp => "#3ddc84",
            Sprite::Udp => "#4fc3f7",
            Sprite::Http => "#ffca28",
            Sprite::Dns => "#ba68c8",
            Sprite::Tls => "#26a69a",
        }
    }
}

/// A falling packet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub id: u32,
    pub lane: usize,
    /// Left edge of the lane slot, fixed for the packet's lifetime
    pub x: f32,
    /// Top edge of the lane slot
    pub y: f32,
    /// Slot edge length
    pub size: f32,
    /// Valid packets score when clicked; corrupted ones end the round
    pub valid: bool,
    /// Logo for valid packets; corrupted packets have none
    pub sprite: Option<Sprite>,
}

impl Packet {
    /// Full lane slot occupied by the packet
    pub fn slot(&self) -> Rect {
        Rect::new(self.x, self.y, self.size, self.size)
    }

    /// Box actually drawn (and clickable): sprites are scaled down and centred
    pub fn drawn_rect(&self) -> Rect {
        match self.sprite {
            Some(_) => self.slot().scaled_centered(SPRITE_SCALE),
            None => self.slot(),
        }
    }

    /// Y of the slot's bottom edge
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.size
    }
}

/// Gameplay events produced by a tick or a pointer press
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A packet entered at the top of a lane
    Spawned { id: u32, lane: usize, valid: bool },
    /// A packet reached the floor and was removed; `y` is the clamped final position
    Landed {
        id: u32,
        lane: usize,
        valid: bool,
        y: f32,
    },
    /// A valid packet was clicked
    Caught { id: u32, lane: usize },
    /// A corrupted packet was clicked
    Corrupted { id: u32, lane: usize },
}

/// State of one round
#[derive(Debug, Clone)]
pub struct RoundState {
    /// Round seed for reproducibility
    pub seed: u64,
    /// Seconds of play
    pub elapsed: f32,
    /// Unbounded in both directions
    pub score: i64,
    /// In-flight packets, oldest first
    pub packets: Vec<Packet>,
    /// Milliseconds since the last successful spawn
    pub since_spawn_ms: f32,
    rng: Pcg32,
    next_id: u32,
}

impl RoundState {
    /// Create an empty round with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            elapsed: 0.0,
            score: 0,
            packets: Vec::new(),
            since_spawn_ms: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Clear the round back to an empty, zero-score state with a new seed
    pub fn reset(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Allocate a new packet ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Difficulty at the current elapsed time
    pub fn difficulty(&self) -> Difficulty {
        Difficulty::at(self.elapsed)
    }

    pub fn packet(&self, id: u32) -> Option<&Packet> {
        self.packets.iter().find(|p| p.id == id)
    }
}
