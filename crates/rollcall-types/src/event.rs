use crate::course_key::CourseKey;
use crate::timestamp::EventTimestamp;
use std::fmt;

/// The four recognized enrollment lifecycle event kinds.
///
/// `Validated` is not a real lifecycle transition: it is produced by a
/// periodic database snapshot and asserts ground-truth state at dump time.
/// The other three are real events written by the platform as they happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// User became enrolled.
    Activated,
    /// User became unenrolled.
    Deactivated,
    /// Enrollment mode changed without changing active/inactive state.
    ModeChanged,
    /// Snapshot-reported ground truth for one `(course, user)` pair.
    Validated,
}

impl EventKind {
    /// The wire name carried in the log's `event_type` field.
    pub fn event_type(self) -> &'static str {
        match self {
            Self::Activated => "course.enrollment.activated",
            Self::Deactivated => "course.enrollment.deactivated",
            Self::ModeChanged => "course.enrollment.mode_changed",
            Self::Validated => "course.enrollment.validated",
        }
    }

    /// Map a wire name back to a kind. Unrecognized names yield `None`,
    /// which the parser treats as "not an enrollment event".
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            "course.enrollment.activated" => Some(Self::Activated),
            "course.enrollment.deactivated" => Some(Self::Deactivated),
            "course.enrollment.mode_changed" => Some(Self::ModeChanged),
            "course.enrollment.validated" => Some(Self::Validated),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_type())
    }
}

/// Snapshot metadata carried only by `Validated` events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationInfo {
    /// Ground-truth enrollment state at dump time.
    pub is_active: bool,
    /// When the enrollment row was first created.
    pub created: EventTimestamp,
    /// Start of the snapshot dump window.
    pub dump_start: EventTimestamp,
    /// End of the snapshot dump window. Real events inside
    /// `[dump_start, dump_end]` race the snapshot.
    pub dump_end: EventTimestamp,
}

/// One enrollment event as seen by the reconciler.
///
/// `validation` is present iff `kind == Validated`; the parser enforces this.
/// `mode` is an opaque enrollment flavor (`"honor"`, `"verified"`, ...) and
/// may legitimately be absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrollmentEvent {
    pub timestamp: EventTimestamp,
    pub kind: EventKind,
    pub mode: Option<String>,
    pub validation: Option<ValidationInfo>,
}

/// The reconciliation scope: all processing happens per `(course, user)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnrollmentKey {
    pub course_id: CourseKey,
    pub user_id: i64,
}

impl fmt::Display for EnrollmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} user {}", self.course_id, self.user_id)
    }
}
