//! Difficulty ramp
//!
//! Fall speed grows linearly with elapsed round time while the spawn interval
//! shrinks linearly down to a floor.

use serde::{Deserialize, Serialize};

use crate::consts::*;

#[inline]
fn sanitize_minutes(t: f32) -> f32 {
    if t.is_finite() && t > 0.0 { t } else { 0.0 }
}

/// Fall speed in pixels/s after `elapsed_min` minutes
pub fn fall_speed(elapsed_min: f32) -> f32 {
    BASE_SPEED * (1.0 + RAMP_PER_MIN * sanitize_minutes(elapsed_min))
}

/// Time between spawns in ms after `elapsed_min` minutes, within `[MIN_MS, BASE_MS]`
pub fn spawn_interval_ms(elapsed_min: f32) -> f32 {
    (BASE_MS - ACCEL_PER_MIN * sanitize_minutes(elapsed_min)).clamp(MIN_MS, BASE_MS)
}

/// Difficulty at a point in the round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    /// Pixels per second
    pub speed: f32,
    /// Milliseconds
    pub spawn_interval_ms: f32,
}

impl Difficulty {
    /// Difficulty after `elapsed_secs` seconds of play
    pub fn at(elapsed_secs: f32) -> Self {
        let minutes = elapsed_secs / 60.0;
        Self {
            speed: fall_speed(minutes),
            spawn_interval_ms: spawn_interval_ms(minutes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_start_values() {
        assert_eq!(fall_speed(0.0), BASE_SPEED);
        assert_eq!(spawn_interval_ms(0.0), BASE_MS);
        assert_eq!(Difficulty::at(0.0).speed, BASE_SPEED);
    }

    #[test]
    fn test_interval_floors() {
        assert_eq!(spawn_interval_ms(1000.0), MIN_MS);
        assert_eq!(spawn_interval_ms(f32::INFINITY), BASE_MS);
    }

    #[test]
    fn test_negative_time_is_round_start() {
        assert_eq!(fall_speed(-3.0), BASE_SPEED);
        assert_eq!(spawn_interval_ms(-3.0), BASE_MS);
        assert_eq!(fall_speed(f32::NAN), BASE_SPEED);
    }

    proptest! {
        #[test]
        fn speed_non_decreasing(a in 0.0f32..120.0, b in 0.0f32..120.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(fall_speed(lo) <= fall_speed(hi));
        }

        #[test]
        fn interval_non_increasing_and_bounded(a in 0.0f32..120.0, b in 0.0f32..120.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(spawn_interval_ms(lo) >= spawn_interval_ms(hi));
            for t in [lo, hi] {
                let interval = spawn_interval_ms(t);
                prop_assert!((MIN_MS..=BASE_MS).contains(&interval));
            }
        }
    }
}
