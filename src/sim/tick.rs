//! Per-frame simulation tick
//!
//! Advances every packet by `speed * dt`, removes packets that touch the
//! floor, and spawns when the spawn interval has elapsed.

use super::geometry::BoardGeometry;
use super::spawn::spawn_packet;
use super::state::{GameEvent, RoundState};
use crate::consts::*;

/// Advance the round by `dt` seconds of wall time
///
/// Does nothing on an unplayable board. `dt` is clamped to `MAX_FRAME_DT`.
pub fn tick(state: &mut RoundState, geometry: &BoardGeometry, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if !geometry.is_playable() {
        return events;
    }

    let dt = if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    };
    state.elapsed += dt;

    let difficulty = state.difficulty();
    let step = difficulty.speed * dt;
    let floor = geometry.floor_top();

    // Reverse order so removal by index leaves earlier indices untouched
    for i in (0..state.packets.len()).rev() {
        let packet = &mut state.packets[i];
        packet.y += step;
        if packet.bottom() < floor {
            continue;
        }

        let packet = state.packets.remove(i);
        if packet.valid {
            state.score += SCORE_GREEN_MISS;
        }
        events.push(GameEvent::Landed {
            id: packet.id,
            lane: packet.lane,
            valid: packet.valid,
            y: floor - packet.size,
        });
    }

    state.since_spawn_ms += dt * 1000.0;
    if state.since_spawn_ms >= difficulty.spawn_interval_ms {
        // A blocked spawn keeps the timer running so the next frame retries
        if let Some(id) = spawn_packet(state, geometry) {
            state.since_spawn_ms = 0.0;
            if let Some(packet) = state.packet(id) {
                events.push(GameEvent::Spawned {
                    id,
                    lane: packet.lane,
                    valid: packet.valid,
                });
            }
        }
    }

    events
}
