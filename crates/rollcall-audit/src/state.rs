use rollcall_types::{EnrollmentEvent, EventKind};
use std::fmt;

/// Cursor labels for the reverse walk.
///
/// This is the closed vocabulary that reason tags are built from: every
/// synthesized event carries a `"<older> => <newer>"` tag over these labels
/// (plus the literal `start` at the left edge). Validations split into two
/// labels because the walk only ever cares about the asserted state, and
/// `Missing` stands in for an expected validation that never arrived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateLabel {
    Activate,
    Deactivate,
    ModeChange,
    ValidateActive,
    ValidateInactive,
    Missing,
}

impl StateLabel {
    /// Classify an observed event.
    pub fn of(event: &EnrollmentEvent) -> Self {
        match event.kind {
            EventKind::Activated => Self::Activate,
            EventKind::Deactivated => Self::Deactivate,
            EventKind::ModeChanged => Self::ModeChange,
            EventKind::Validated => {
                debug_assert!(
                    event.validation.is_some(),
                    "validated events always carry validation info"
                );
                match &event.validation {
                    Some(info) if info.is_active => Self::ValidateActive,
                    _ => Self::ValidateInactive,
                }
            }
        }
    }

    /// The enrollment state this label implies the user is in immediately
    /// after the event. A mode change presupposes an enrolled user; a
    /// missing validation never reaches this (the walk handles it first).
    pub fn implies_active(self) -> bool {
        matches!(self, Self::Activate | Self::ValidateActive | Self::ModeChange)
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::ModeChange => "mode_change",
            Self::ValidateActive => "validate(active)",
            Self::ValidateInactive => "validate(inactive)",
            Self::Missing => "missing",
        };
        write!(f, "{label}")
    }
}
