use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::user::{AccountStatus, Role, User};

/// Length of an access-code trial.
pub const TRIAL_DAYS: i64 = 7;

/// Length of a signed-in (paid) session.
pub const PAID_SESSION_DAYS: i64 = 30;

/// A signed-in session, shaped like the session cookie.
///
/// Validating the cookie itself is the caller's job; this type only carries
/// what the access rules need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    user: User,
    expires: DateTime<Utc>,
    is_trial: bool,
}

impl Session {
    #[must_use]
    pub fn new(user: User, expires: DateTime<Utc>, is_trial: bool) -> Self {
        Self {
            user,
            expires,
            is_trial,
        }
    }

    /// Session opened with an access code: trial for [`TRIAL_DAYS`].
    #[must_use]
    pub fn start_trial(user: User, now: DateTime<Utc>) -> Self {
        Self::new(user, now + Duration::days(TRIAL_DAYS), true)
    }

    /// Session opened with credentials: not a trial.
    #[must_use]
    pub fn sign_in(user: User, now: DateTime<Utc>) -> Self {
        Self::new(user, now + Duration::days(PAID_SESSION_DAYS), false)
    }

    /// Converts a trial into a paid session and extends its expiry.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) {
        self.is_trial = false;
        self.expires = now + Duration::days(PAID_SESSION_DAYS);
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    #[must_use]
    pub fn is_trial(&self) -> bool {
        self.is_trial
    }

    /// Derives the access-relevant view of this session at `now`.
    #[must_use]
    pub fn viewer(&self, now: DateTime<Utc>) -> Viewer {
        let role = self.user.role();
        let trial_expired = self.is_trial && self.expires < now;
        let registered = role.is_staff()
            || self.user.status() == AccountStatus::Approved
            || !self.is_trial;
        Viewer::new(role, trial_expired, registered)
    }
}

/// What the access rules know about the person looking at a material.
///
/// Staff are always registered and never trial-expired, whatever flags the
/// caller passes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    role: Role,
    is_trial_expired: bool,
    is_registered: bool,
}

impl Viewer {
    #[must_use]
    pub fn new(role: Role, is_trial_expired: bool, is_registered: bool) -> Self {
        let staff = role.is_staff();
        Self {
            role,
            is_trial_expired: is_trial_expired && !staff,
            is_registered: is_registered || staff,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn is_trial_expired(&self) -> bool {
        self.is_trial_expired
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.is_registered
    }

    /// A registered viewer with the student role.
    #[must_use]
    pub fn is_registered_student(&self) -> bool {
        self.role == Role::Student && self.is_registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;
    use crate::time::fixed_now;

    fn user(role: Role, status: AccountStatus) -> User {
        User::new(UserId::new("1").unwrap(), "Alex Doe", "student@example.com", role, status)
            .unwrap()
    }

    #[test]
    fn trial_expires_after_seven_days() {
        let now = fixed_now();
        let session = Session::start_trial(user(Role::Student, AccountStatus::Pending), now);

        let fresh = session.viewer(now + Duration::days(TRIAL_DAYS) - Duration::seconds(1));
        assert!(!fresh.is_trial_expired());
        assert!(!fresh.is_registered());

        let stale = session.viewer(now + Duration::days(TRIAL_DAYS) + Duration::seconds(1));
        assert!(stale.is_trial_expired());
    }

    #[test]
    fn paying_clears_trial_and_registers() {
        let now = fixed_now();
        let mut session = Session::start_trial(user(Role::Student, AccountStatus::Pending), now);
        let later = now + Duration::days(10);
        session.mark_paid(later);

        let viewer = session.viewer(later);
        assert!(!viewer.is_trial_expired());
        assert!(viewer.is_registered_student());
        assert_eq!(session.expires(), later + Duration::days(PAID_SESSION_DAYS));
    }

    #[test]
    fn approved_trial_student_counts_as_registered() {
        let now = fixed_now();
        let session = Session::start_trial(user(Role::Student, AccountStatus::Approved), now);
        assert!(session.viewer(now).is_registered());
    }

    #[test]
    fn staff_are_never_trial_expired() {
        for role in [Role::Admin, Role::Agent] {
            let viewer = Viewer::new(role, true, false);
            assert!(!viewer.is_trial_expired());
            assert!(viewer.is_registered());
            assert!(!viewer.is_registered_student());
        }
    }

    #[test]
    fn session_json_matches_cookie_shape() {
        let now = fixed_now();
        let session = Session::sign_in(user(Role::Student, AccountStatus::Pending), now);
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["isTrial"], serde_json::json!(false));
        assert_eq!(json["user"]["role"], serde_json::json!("student"));
        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }
}
