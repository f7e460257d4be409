use chrono::{DateTime, Utc};

/// Age reported for a device that has never been heard from.
pub const NEVER_SEEN_AGE_SECONDS: u64 = 999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liveness {
    pub age_seconds: u64,
    pub online: bool,
}

impl Liveness {
    /// Explicit "going offline" snapshot; the age is still derived from the last packet.
    pub fn offline(self) -> Self {
        Self {
            online: false,
            ..self
        }
    }
}

/// Derives age and online state from the last time a device was heard from.
///
/// Negative ages caused by the wall clock stepping backwards are clamped to zero.
/// A device whose age equals the timeout is still online.
pub fn evaluate_liveness(
    last_seen_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    online_timeout_seconds: u64,
) -> Liveness {
    let Some(last_seen_at) = last_seen_at else {
        return Liveness {
            age_seconds: NEVER_SEEN_AGE_SECONDS,
            online: false,
        };
    };

    let age_seconds = (now - last_seen_at).num_seconds().max(0) as u64;

    Liveness {
        age_seconds,
        online: age_seconds <= online_timeout_seconds,
    }
}
