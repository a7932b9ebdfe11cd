//! Per-material access rules.
//!
//! Rules are checked in a fixed order and the first match wins:
//!
//! 1. an expired trial locks everything for students;
//! 2. viewers without a paid registration only see the first
//!    [`PREVIEW_LIMIT`] videos of each group;
//! 3. registered students must finish the previous video in the group before
//!    the next one opens;
//! 4. anything else is open.

use std::fmt;

use serde::Serialize;

use crate::model::{Material, Percent, Role, Viewer};

/// Number of videos per group an unregistered viewer may open.
pub const PREVIEW_LIMIT: usize = 3;

/// Why a material is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockReason {
    /// Trial ended or the preview cap was hit; both are resolved by paying.
    TrialExpired,
    /// The previous video in the group is not complete yet.
    SequentialPrerequisiteIncomplete,
}

impl LockReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LockReason::TrialExpired => "trial-expired",
            LockReason::SequentialPrerequisiteIncomplete => "sequential-prerequisite-incomplete",
        }
    }
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`evaluate_access`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "kebab-case")]
pub enum AccessDecision {
    Unlocked,
    Locked(LockReason),
}

impl AccessDecision {
    #[must_use]
    pub fn is_locked(self) -> bool {
        matches!(self, AccessDecision::Locked(_))
    }

    #[must_use]
    pub fn reason(self) -> Option<LockReason> {
        match self {
            AccessDecision::Unlocked => None,
            AccessDecision::Locked(reason) => Some(reason),
        }
    }
}

/// Decides whether `viewer` may open `material`.
///
/// `sibling_index` is the material's position within its
/// (type, subject, topic) group and `previous_progress` the progress of the
/// sibling right before it (`None` for the first sibling).
#[must_use]
pub fn evaluate_access(
    viewer: &Viewer,
    material: &Material,
    sibling_index: usize,
    previous_progress: Option<Percent>,
) -> AccessDecision {
    if viewer.role() == Role::Student && viewer.is_trial_expired() {
        return AccessDecision::Locked(LockReason::TrialExpired);
    }

    let is_video = material.kind().is_video();

    if is_video && !viewer.is_registered() && sibling_index >= PREVIEW_LIMIT {
        return AccessDecision::Locked(LockReason::TrialExpired);
    }

    if is_video && viewer.is_registered_student() && sibling_index > 0 {
        let previous_done = previous_progress.is_some_and(Percent::is_complete);
        if !previous_done {
            return AccessDecision::Locked(LockReason::SequentialPrerequisiteIncomplete);
        }
    }

    AccessDecision::Unlocked
}
