use serde::Deserialize;

/// Linear experience curve: reaching `level + 1` costs `(level + 1) * k1 + k2`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProgressionCurve {
    pub k1: u32,
    pub k2: u32,
}

impl Default for ProgressionCurve {
    fn default() -> Self {
        Self { k1: 100, k2: 0 }
    }
}

impl ProgressionCurve {
    pub fn experience_for_next_level(self, level: u32) -> u64 {
        (u64::from(level) + 1) * u64::from(self.k1) + u64::from(self.k2)
    }
}
