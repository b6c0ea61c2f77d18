//! Pointer hit-testing against falling packets
//!
//! Packets are drawn oldest first, so the newest packet under the pointer is
//! the one on top.

use glam::Vec2;

use super::state::{GameEvent, Packet, RoundState};
use crate::consts::*;

/// Index of the topmost packet whose drawn box contains `point`
pub fn hit_test(packets: &[Packet], point: Vec2) -> Option<usize> {
    packets
        .iter()
        .rposition(|packet| packet.drawn_rect().contains(point))
}

/// Result of a pointer press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Nothing under the pointer
    Miss,
    /// A valid packet was caught and removed
    Caught { id: u32, lane: usize },
    /// A corrupted packet was clicked; the round must end
    Corrupted { id: u32, lane: usize },
}

impl HitOutcome {
    pub fn event(&self) -> Option<GameEvent> {
        match *self {
            HitOutcome::Miss => None,
            HitOutcome::Caught { id, lane } => Some(GameEvent::Caught { id, lane }),
            HitOutcome::Corrupted { id, lane } => Some(GameEvent::Corrupted { id, lane }),
        }
    }
}

/// Resolve a pointer press at `point` against the round
///
/// A valid packet scores `SCORE_PER_HIT` and leaves the store. A corrupted
/// packet is left in place for the final frame; ending the round is up to
/// the caller.
pub fn resolve_pointer(state: &mut RoundState, point: Vec2) -> HitOutcome {
    let Some(index) = hit_test(&state.packets, point) else {
        return HitOutcome::Miss;
    };

    let packet = &state.packets[index];
    let (id, lane) = (packet.id, packet.lane);
    if !packet.valid {
        return HitOutcome::Corrupted { id, lane };
    }

    state.packets.remove(index);
    state.score += SCORE_PER_HIT;
    HitOutcome::Caught { id, lane }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Sprite;

    fn packet(id: u32, lane: usize, x: f32, y: f32, valid: bool) -> Packet {
        Packet {
            id,
            lane,
            x,
            y,
            size: PACKET_SIZE,
            valid,
            sprite: valid.then_some(Sprite::Http),
        }
    }

    #[test]
    fn test_catch_valid_packet_at_box_corner() {
        let mut state = RoundState::new(1);
        state.packets.push(packet(1, 0, 100.0, 100.0, true));
        let corner = state.packets[0].drawn_rect().min;

        assert_eq!(
            resolve_pointer(&mut state, corner),
            HitOutcome::Caught { id: 1, lane: 0 }
        );
        assert_eq!(state.score, SCORE_PER_HIT);
        assert!(state.packets.is_empty());
    }

    #[test]
    fn test_sprite_margin_is_not_clickable() {
        let mut state = RoundState::new(1);
        state.packets.push(packet(1, 0, 100.0, 100.0, true));
        // Inside the slot but outside the scaled sprite
        assert_eq!(resolve_pointer(&mut state, Vec2::new(101.0, 101.0)), HitOutcome::Miss);
        assert_eq!(state.packets.len(), 1);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_corrupted_packet_reports_and_stays() {
        let mut state = RoundState::new(1);
        state.score = 500;
        state.packets.push(packet(4, 3, 100.0, 100.0, false));
        let outcome = resolve_pointer(&mut state, Vec2::new(101.0, 101.0));
        assert_eq!(outcome, HitOutcome::Corrupted { id: 4, lane: 3 });
        assert_eq!(state.score, 500);
        assert_eq!(state.packets.len(), 1);
    }

    #[test]
    fn test_newest_packet_wins_overlap() {
        let packets = vec![
            packet(1, 0, 100.0, 100.0, true),
            packet(2, 0, 100.0, 120.0, false),
        ];
        assert_eq!(hit_test(&packets, Vec2::new(130.0, 150.0)), Some(1));
        // Only the older packet covers this point
        assert_eq!(hit_test(&packets, Vec2::new(130.0, 115.0)), Some(0));
    }

    #[test]
    fn test_click_passes_through_empty_space() {
        let mut state = RoundState::new(1);
        state.packets.push(packet(1, 0, 100.0, 100.0, false));
        assert_eq!(resolve_pointer(&mut state, Vec2::new(400.0, 400.0)), HitOutcome::Miss);
        assert_eq!(HitOutcome::Miss.event(), None);
    }
}
