//! Board geometry and lane layout
//!
//! Board space is in CSS pixels with the origin at the top-left corner and y
//! growing downward. Lanes are fixed columns spread evenly across the width.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Axis-aligned rectangle in board space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub min: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Bottom-right corner
    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.min.y + self.size.y
    }

    /// Point containment, edges inclusive
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.min.x && p.x <= max.x && p.y >= self.min.y && p.y <= max.y
    }

    /// A rect of `scale` times this size sharing the same centre
    pub fn scaled_centered(&self, scale: f32) -> Self {
        let size = self.size * scale;
        Self {
            min: self.min + (self.size - size) * 0.5,
            size,
        }
    }
}

/// Left x-offset of every lane for a board `width` and packet `packet_size`
///
/// Offsets are spread evenly over `[PAD, width - PAD - packet_size]`. A board
/// too narrow for that span stacks every lane at `PAD`.
pub fn lane_offsets(width: f32, packet_size: f32) -> [f32; LANES] {
    let width = if width.is_finite() { width } else { 0.0 };
    let span = (width - 2.0 * PAD - packet_size).max(0.0);
    let step = if LANES > 1 {
        span / (LANES - 1) as f32
    } else {
        0.0
    };

    let mut offsets = [PAD; LANES];
    for (lane, x) in offsets.iter_mut().enumerate() {
        *x = PAD + step * lane as f32;
    }
    offsets
}

/// Board size and derived lane positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardGeometry {
    pub width: f32,
    pub height: f32,
    pub packet_size: f32,
    pub lane_x: [f32; LANES],
}

impl Default for BoardGeometry {
    /// A zero-sized board; unplayable until the first resize
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl BoardGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_packet_size(width, height, PACKET_SIZE)
    }

    pub fn with_packet_size(width: f32, height: f32, packet_size: f32) -> Self {
        Self {
            width,
            height,
            packet_size,
            lane_x: lane_offsets(width, packet_size),
        }
    }

    /// Recompute lanes for a new board size
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.lane_x = lane_offsets(width, self.packet_size);
    }

    /// Y of the top edge of the floor line; packets are removed on contact
    #[inline]
    pub fn floor_top(&self) -> f32 {
        self.height - FLOOR_PAD - FLOOR_THICKNESS
    }

    /// X offset of a lane (lanes past the end clamp to the last one)
    #[inline]
    pub fn lane_x(&self, lane: usize) -> f32 {
        self.lane_x[lane.min(LANES - 1)]
    }

    /// Slot rectangle of a lane at a given y
    pub fn slot(&self, lane: usize, y: f32) -> Rect {
        Rect::new(self.lane_x(lane), y, self.packet_size, self.packet_size)
    }

    /// Whether the board can host a round: non-zero size with room for a
    /// freshly spawned packet above the floor
    pub fn is_playable(&self) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
            && self.packet_size > 0.0
            && self.floor_top() > SPAWN_Y + self.packet_size
    }
}
