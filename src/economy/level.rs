/// Experience needed per level: `base_exp * growth_factor^(level - 1)`, floored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelCurve {
    pub base_exp: u64,
    pub growth_factor: f64,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self {
            base_exp: 1000,
            growth_factor: 1.2,
        }
    }
}

impl LevelCurve {
    pub fn max_exp_for(&self, level: u32) -> u64 {
        let exponent = i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX);
        // Nudge before flooring so 1000 * 1.2^2 lands on 1440, not 1439.
        let raw = self.base_exp as f64 * self.growth_factor.powi(exponent) + 1e-6;
        (raw.floor() as u64).max(1)
    }
}

/// Level and experience after an `add_experience` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: u32,
    pub current_exp: u64,
    pub max_exp: u64,
    pub levels_gained: u32,
}
