use crate::error::AuditError;
use chrono::NaiveDateTime;

/// Reconciliation policy, passed immutably into the reducer.
///
/// Defaults are the production settings: only interior gaps are synthesized,
/// non-state round trips are skipped, and output is the compact tuple shape.
#[derive(Clone, Debug, Default)]
pub struct AuditPolicy {
    /// Synthesize events that precede the earliest real event (the inferred
    /// initial activation, or the inferred enroll/unenroll pair behind an
    /// inactive validation). Off means no synthesized event ever sorts
    /// before the first observed one.
    pub generate_before: bool,
    /// Synthesize transitions that leave active/inactive state unchanged,
    /// e.g. the deactivation implied by two consecutive activations.
    pub include_nonstate_changes: bool,
    /// Floor for synthesized timestamps; anything computed earlier is
    /// clamped to this instant.
    pub earliest_timestamp: Option<NaiveDateTime>,
    /// Stand-in for a trailing validation that never arrived. When set and
    /// the newest event is not a validation, the walk starts from a
    /// `missing` cursor at this instant.
    pub expected_validation: Option<NaiveDateTime>,
    /// Emit full JSON event clones instead of compact tuples.
    pub event_output: bool,
}

impl AuditPolicy {
    /// Fail-fast configuration check, run once at task init before any key
    /// is processed. A floor later than the expected validation would demand
    /// synthesized events after the end of history.
    pub fn validate(&self) -> Result<(), AuditError> {
        if let (Some(earliest), Some(expected)) = (self.earliest_timestamp, self.expected_validation)
        {
            if earliest > expected {
                return Err(AuditError::PolicyMisconfiguration { earliest, expected });
            }
        }
        Ok(())
    }
}
