//! Packet spawning
//!
//! New packets enter at `SPAWN_Y` in a lane whose highest packet has already
//! fallen clear of the spawn slot, so packets in one lane never overlap.

use rand::Rng;
use rand::seq::SliceRandom;

use super::geometry::BoardGeometry;
use super::state::{Packet, RoundState, Sprite};
use crate::consts::*;

/// Lanes where a new packet can enter without stacking on an existing one
pub fn safe_lanes(packets: &[Packet], packet_size: f32) -> Vec<usize> {
    let min_gap = packet_size * SPAWN_GAP_FACTOR;
    let mut highest = [f32::INFINITY; LANES];
    for packet in packets {
        if let Some(y) = highest.get_mut(packet.lane) {
            *y = y.min(packet.y);
        }
    }

    highest
        .iter()
        .enumerate()
        .filter(|&(_, &y)| y - SPAWN_Y > min_gap)
        .map(|(lane, _)| lane)
        .collect()
}

/// Roll validity and sprite for a new packet
fn roll_packet(round: &mut RoundState, geometry: &BoardGeometry, lane: usize, y: f32) -> Packet {
    let id = round.next_entity_id();
    let rng = round.rng_mut();
    let valid = rng.random_bool(VALID_CHANCE);
    let sprite = if valid {
        Some(Sprite::ALL[rng.random_range(0..Sprite::ALL.len())])
    } else {
        None
    };

    Packet {
        id,
        lane,
        x: geometry.lane_x(lane),
        y,
        size: geometry.packet_size,
        valid,
        sprite,
    }
}

/// Try to spawn one packet at the top of a random safe lane
///
/// Returns the new packet's ID, or `None` when the board is unplayable or
/// every lane is still blocked (the attempt is simply deferred).
pub fn spawn_packet(round: &mut RoundState, geometry: &BoardGeometry) -> Option<u32> {
    if !geometry.is_playable() {
        return None;
    }

    let lanes = safe_lanes(&round.packets, geometry.packet_size);
    if lanes.is_empty() {
        return None;
    }
    let lane = lanes[round.rng_mut().random_range(0..lanes.len())];

    let packet = roll_packet(round, geometry, lane, SPAWN_Y);
    let id = packet.id;
    log::debug!("Spawned packet {} in lane {} (valid: {})", id, lane, packet.valid);
    round.packets.push(packet);
    Some(id)
}

/// Seed the opening packets of a round in distinct lanes, staggered downward
///
/// Packets whose slot would not fit above the floor are skipped. Returns the
/// number of packets placed.
pub fn seed_packets(round: &mut RoundState, geometry: &BoardGeometry, count: usize) -> usize {
    if !geometry.is_playable() {
        return 0;
    }

    let mut lanes: Vec<usize> = (0..LANES).collect();
    lanes.shuffle(round.rng_mut());

    let row_step = geometry.packet_size * SEED_ROW_FACTOR;
    let floor = geometry.floor_top();
    let mut placed = 0;
    for (row, &lane) in lanes.iter().take(count).enumerate() {
        let y = SPAWN_Y + row_step * row as f32;
        if y + geometry.packet_size >= floor {
            break;
        }
        let packet = roll_packet(round, geometry, lane, y);
        round.packets.push(packet);
        placed += 1;
    }
    placed
}
