use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ids::MaterialId;

/// Completion percentage of one material, always within `0..=100`.
///
/// Construction clamps instead of failing: out-of-range input saturates at
/// the nearest bound and NaN becomes zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Percent(f64);

impl Percent {
    pub const ZERO: Percent = Percent(0.0);
    pub const COMPLETE: Percent = Percent(100.0);

    #[must_use]
    pub fn new(value: f64) -> Self {
        // -0.0 folds to ZERO as well.
        if value.is_nan() || value <= 0.0 {
            return Self::ZERO;
        }
        Self(value.min(100.0))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn is_complete(self) -> bool {
        self.0 >= 100.0
    }

    #[must_use]
    pub fn state(self) -> ProgressState {
        if self.0 <= 0.0 {
            ProgressState::Unseen
        } else if self.is_complete() {
            ProgressState::Complete
        } else {
            ProgressState::InProgress
        }
    }
}

impl From<f64> for Percent {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Percent> for f64 {
    fn from(value: Percent) -> Self {
        value.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

/// Where a material sits on the way to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressState {
    Unseen,
    InProgress,
    Complete,
}

/// Persisted progress: material id to percentage, serialized as a flat
/// JSON object.
pub type ProgressMap = BTreeMap<MaterialId, Percent>;
