use chrono::NaiveDateTime;
use rollcall_types::{EnrollmentEvent, EnrollmentKey};

/// Errors surfaced by the audit pipeline.
///
/// Parser rejections are not errors: malformed lines are dropped silently.
/// The two variants here are the fail-fast policy check at task init and the
/// should-be-unreachable internal inconsistency, which aborts its key
/// without partial output.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error(
        "audit policy rejected: earliest timestamp {earliest} is later than \
         expected validation {expected}"
    )]
    PolicyMisconfiguration {
        earliest: NaiveDateTime,
        expected: NaiveDateTime,
    },
    #[error("enrollment history for {key} is internally inconsistent: {detail}; events: {events}")]
    InvariantViolation {
        key: String,
        detail: String,
        events: String,
    },
}

impl AuditError {
    /// Diagnostic for a cursor state the sorted input cannot produce.
    /// Includes the key and the full event list, since the surrounding
    /// framework only sees the failed key.
    pub(crate) fn invariant_violation(
        key: &EnrollmentKey,
        events: &[EnrollmentEvent],
        detail: &str,
    ) -> Self {
        Self::InvariantViolation {
            key: key.to_string(),
            detail: detail.to_owned(),
            events: format!("{events:?}"),
        }
    }
}
