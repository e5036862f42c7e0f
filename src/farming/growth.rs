//! Time-derived crop growth.
//!
//! Nothing here is stored. Progress is always recomputed from the planting
//! timestamp and "now", which is what makes offline growth work after a reload.

use crate::shared::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropPhase {
    Growing,
    ReadyToHarvest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthReading {
    /// Clamped to [0, 1].
    pub fraction: f64,
    pub phase: CropPhase,
    pub remaining_secs: f64,
}

impl GrowthReading {
    pub fn is_ready(&self) -> bool {
        self.phase == CropPhase::ReadyToHarvest
    }
}

pub fn phase(planted_at: Timestamp, growth_time_secs: f64, now: Timestamp) -> GrowthReading {
    let elapsed = now.seconds_since(planted_at);
    let fraction = if growth_time_secs > 0.0 {
        (elapsed / growth_time_secs).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let phase = if elapsed < growth_time_secs {
        CropPhase::Growing
    } else {
        CropPhase::ReadyToHarvest
    };
    GrowthReading {
        fraction,
        phase,
        remaining_secs: (growth_time_secs - elapsed).max(0.0),
    }
}

/// Visual stage index in `0..stage_count`. Only drives render notifications.
pub fn stage(fraction: f64, stage_count: u32) -> u32 {
    let last = stage_count.saturating_sub(1);
    let raw = (fraction.clamp(0.0, 1.0) * f64::from(last)).floor();
    (raw as u32).min(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: f64) -> Timestamp {
        Timestamp::from_secs_f64(secs)
    }

    #[test]
    fn halfway_is_growing() {
        let reading = phase(at(0.0), 60.0, at(30.0));
        assert_eq!(reading.phase, CropPhase::Growing);
        assert_eq!(reading.fraction, 0.5);
        assert_eq!(reading.remaining_secs, 30.0);
    }

    #[test]
    fn long_after_planting_is_ready_without_polling() {
        let reading = phase(at(0.0), 60.0, at(90.0));
        assert!(reading.is_ready());
        assert_eq!(reading.fraction, 1.0);
        assert_eq!(reading.remaining_secs, 0.0);
    }

    #[test]
    fn ready_exactly_at_growth_time() {
        assert!(phase(at(10.0), 60.0, at(70.0)).is_ready());
        assert!(!phase(at(10.0), 60.0, at(69.999)).is_ready());
    }

    #[test]
    fn clock_behind_plant_time_clamps_to_zero() {
        let reading = phase(at(100.0), 60.0, at(40.0));
        assert_eq!(reading.fraction, 0.0);
        assert_eq!(reading.phase, CropPhase::Growing);
    }

    #[test]
    fn stage_floors_over_stage_count_minus_one() {
        assert_eq!(stage(0.0, 4), 0);
        assert_eq!(stage(0.32, 4), 0);
        assert_eq!(stage(0.34, 4), 1);
        assert_eq!(stage(0.5, 4), 1);
        assert_eq!(stage(0.99, 4), 2);
        assert_eq!(stage(1.0, 4), 3);
    }

    #[test]
    fn single_stage_crop_never_changes_stage() {
        assert_eq!(stage(0.0, 1), 0);
        assert_eq!(stage(1.0, 1), 0);
    }
}
