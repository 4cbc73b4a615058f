use crate::error::AuditError;
use crate::policy::AuditPolicy;
use crate::state::StateLabel;
use rollcall_types::{EnrollmentEvent, EnrollmentKey, EventKind, EventTimestamp};
use tracing::debug;

/// An event the reconciler inferred the log must have dropped.
///
/// `after` and `before` are the bracketing timestamps the inference was made
/// from: the older one (absent when the left edge had no validation to
/// anchor on) and the newer one. Real events are never altered; synthesized
/// ones are inserted between them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntheticEvent {
    pub timestamp: EventTimestamp,
    pub kind: EventKind,
    pub mode: Option<String>,
    pub reason: String,
    pub after: Option<EventTimestamp>,
    pub before: EventTimestamp,
}

/// What the walk knows about enrollment state immediately after the
/// previous (newer) event.
struct Cursor {
    label: StateLabel,
    time: EventTimestamp,
    mode: Option<String>,
}

/// Reconcile one key's events against themselves and the policy's implicit
/// boundaries, returning the synthesized events in non-decreasing timestamp
/// order.
///
/// The walk runs newest-to-oldest because the trailing validation carries
/// the most authoritative state; the left edge is closed at the end of the
/// same pass. Pure per key: no shared state, deterministic output.
pub fn reconcile(
    key: &EnrollmentKey,
    mut events: Vec<EnrollmentEvent>,
    policy: &AuditPolicy,
) -> Result<Vec<SyntheticEvent>, AuditError> {
    if events.is_empty() {
        return Ok(Vec::new());
    }

    resolve_dump_races(key, &mut events);

    // Validations sort after real events at the same instant: a snapshot
    // observes the world at dump end. Ties between real events keep arrival
    // order (the sort is stable).
    events.sort_by(|a, b| {
        (a.timestamp.value(), sort_rank(a)).cmp(&(b.timestamp.value(), sort_rank(b)))
    });

    let mut cursor = initial_cursor(&events, policy);
    let mut creation: Option<EventTimestamp> = None;
    let mut synthesized = Vec::new();

    for event in events.iter().rev() {
        let label = StateLabel::of(event);
        if let Some(info) = &event.validation {
            creation = Some(info.created.clone());
        }
        if let Some(newer) = &cursor {
            if let Some(synth) = bridge_gap(event, label, newer, policy) {
                debug!(
                    course_id = %key.course_id,
                    user_id = key.user_id,
                    reason = %synth.reason,
                    time = synth.timestamp.text(),
                    "synthesizing missing enrollment event"
                );
                synthesized.push(synth);
            }
        }
        cursor = Some(Cursor {
            label,
            time: event.timestamp.clone(),
            mode: event.mode.clone(),
        });
    }

    if let Some(oldest) = &cursor {
        close_left_edge(key, &events, oldest, creation.as_ref(), policy, &mut synthesized)?;
    }

    // The walk produced newest-first; callers get chronological order.
    synthesized.reverse();
    Ok(synthesized)
}

fn sort_rank(event: &EnrollmentEvent) -> u8 {
    match event.kind {
        EventKind::Validated => 1,
        _ => 0,
    }
}

/// A snapshot that disagrees with a real event inside its own dump window
/// raced that event: the dump read the row before the event landed. Shift
/// the validation to one microsecond before the earliest conflicting event
/// so the ordered walk sees the snapshot observing the pre-race world and
/// has nothing to reconcile.
fn resolve_dump_races(key: &EnrollmentKey, events: &mut [EnrollmentEvent]) {
    let mut shifted: Vec<(usize, EventTimestamp)> = Vec::new();
    for (index, event) in events.iter().enumerate() {
        let Some(info) = &event.validation else {
            continue;
        };
        let first_conflict = events
            .iter()
            .filter(|other| {
                let disagrees = match other.kind {
                    EventKind::Deactivated => info.is_active,
                    EventKind::Activated => !info.is_active,
                    _ => false,
                };
                disagrees
                    && other.timestamp.value() >= info.dump_start.value()
                    && other.timestamp.value() <= info.dump_end.value()
            })
            .map(|other| other.timestamp.value())
            .min();
        if let Some(conflict) = first_conflict {
            shifted.push((index, EventTimestamp::from_datetime(conflict).plus_micros(-1)));
        }
    }
    for (index, timestamp) in shifted {
        debug!(
            course_id = %key.course_id,
            user_id = key.user_id,
            from = events[index].timestamp.text(),
            to = timestamp.text(),
            "validation raced an event in its dump window; shifting snapshot time"
        );
        events[index].timestamp = timestamp;
    }
}

/// The walk starts from a `missing` cursor when the caller expected a
/// trailing validation and the newest event is not one. The vanished
/// snapshot row will close the record in the first pair.
fn initial_cursor(events: &[EnrollmentEvent], policy: &AuditPolicy) -> Option<Cursor> {
    let expected = policy.expected_validation?;
    let newest = events.last()?;
    if newest.kind == EventKind::Validated {
        return None;
    }
    Some(Cursor {
        label: StateLabel::Missing,
        time: EventTimestamp::from_datetime(expected),
        mode: None,
    })
}

/// Decide whether the adjacent pair `(event, newer)` implies a dropped
/// event, and synthesize it if so. At most one event per pair.
fn bridge_gap(
    event: &EnrollmentEvent,
    label: StateLabel,
    newer: &Cursor,
    policy: &AuditPolicy,
) -> Option<SyntheticEvent> {
    // A missing snapshot row means the enrollment record is gone; mark the
    // record closed no matter what state the last real event left it in.
    if newer.label == StateLabel::Missing {
        return Some(synthesized(EventKind::Deactivated, event, label, newer, policy));
    }

    let curr_active = label.implies_active();
    let newer_active = newer.label.implies_active();

    // Same-state repeats: a second activation means the deactivation in
    // between was dropped, and vice versa. The endpoints' state is
    // unchanged, so the policy may suppress these.
    let repeat = match (curr_active, newer_active) {
        (true, true) if newer.label == StateLabel::Activate => Some(EventKind::Deactivated),
        (false, false) if newer.label == StateLabel::Deactivate => Some(EventKind::Activated),
        _ => None,
    };
    if let Some(kind) = repeat {
        if !policy.include_nonstate_changes {
            return None;
        }
        return Some(synthesized(kind, event, label, newer, policy));
    }

    // State flips with no bridging real event. A real activation or
    // deactivation on the newer side explains the flip itself; a validation
    // or mode change cannot.
    let flip = match (curr_active, newer_active) {
        (false, true) if newer.label != StateLabel::Activate => Some(EventKind::Activated),
        (true, false) if newer.label == StateLabel::ValidateInactive => {
            Some(EventKind::Deactivated)
        }
        _ => None,
    };
    if let Some(kind) = flip {
        return Some(synthesized(kind, event, label, newer, policy));
    }

    // State-consistent neighbors can still reveal an unrecorded mode
    // change. Activations and mode changes establish their own mode;
    // validations and deactivations merely report one.
    if !matches!(newer.label, StateLabel::Activate | StateLabel::ModeChange) {
        if let (Some(curr_mode), Some(newer_mode)) = (&event.mode, &newer.mode) {
            if curr_mode != newer_mode {
                return Some(SyntheticEvent {
                    timestamp: clamped(event.timestamp.plus_micros(1), policy),
                    kind: EventKind::ModeChanged,
                    mode: Some(newer_mode.clone()),
                    reason: format!(
                        "{label} => {} ({curr_mode}=>{newer_mode})",
                        newer.label
                    ),
                    after: Some(event.timestamp.clone()),
                    before: newer.time.clone(),
                });
            }
        }
    }

    None
}

fn synthesized(
    kind: EventKind,
    event: &EnrollmentEvent,
    label: StateLabel,
    newer: &Cursor,
    policy: &AuditPolicy,
) -> SyntheticEvent {
    SyntheticEvent {
        timestamp: clamped(event.timestamp.plus_micros(1), policy),
        kind,
        mode: event.mode.clone(),
        reason: format!("{label} => {}", newer.label),
        after: Some(event.timestamp.clone()),
        before: newer.time.clone(),
    }
}

/// Close the history's left edge: anything but an activation (or a bare
/// mode change, which anchors nothing) implies the user enrolled before the
/// oldest observed event.
///
/// The synthesized activation lands on the enrollment row's `created`
/// timestamp when any validation supplied one, copied verbatim; otherwise
/// one microsecond before the oldest event, with no `after` bracket. An
/// inactive validation additionally implies the unenrollment that followed.
///
/// Events are pushed newest-first to match the walk's collection order.
fn close_left_edge(
    key: &EnrollmentKey,
    events: &[EnrollmentEvent],
    oldest: &Cursor,
    creation: Option<&EventTimestamp>,
    policy: &AuditPolicy,
    synthesized: &mut Vec<SyntheticEvent>,
) -> Result<(), AuditError> {
    if !policy.generate_before {
        return Ok(());
    }
    let start_of = |anchor: Option<&EventTimestamp>| match anchor {
        Some(created) => (clamped(created.clone(), policy), Some(created.clone())),
        None => (clamped(oldest.time.plus_micros(-1), policy), None),
    };
    let reason = format!("start => {}", oldest.label);

    match oldest.label {
        StateLabel::Activate | StateLabel::ModeChange | StateLabel::Missing => Ok(()),
        StateLabel::Deactivate => {
            let (start, after) = start_of(creation);
            synthesized.push(SyntheticEvent {
                timestamp: start,
                kind: EventKind::Activated,
                mode: oldest.mode.clone(),
                reason,
                after,
                before: oldest.time.clone(),
            });
            Ok(())
        }
        StateLabel::ValidateActive | StateLabel::ValidateInactive => {
            let Some(created) = creation else {
                return Err(AuditError::invariant_violation(
                    key,
                    events,
                    "validation cursor without a creation timestamp",
                ));
            };
            if oldest.label == StateLabel::ValidateInactive && !policy.include_nonstate_changes {
                // The inferred enroll/unenroll round trip leaves state
                // unchanged end to end; suppressed as one unit.
                return Ok(());
            }
            let (start, after) = start_of(Some(created));
            if oldest.label == StateLabel::ValidateInactive {
                synthesized.push(SyntheticEvent {
                    timestamp: start.plus_micros(1),
                    kind: EventKind::Deactivated,
                    mode: oldest.mode.clone(),
                    reason: reason.clone(),
                    after: after.clone(),
                    before: oldest.time.clone(),
                });
            }
            synthesized.push(SyntheticEvent {
                timestamp: start,
                kind: EventKind::Activated,
                mode: oldest.mode.clone(),
                reason,
                after,
                before: oldest.time.clone(),
            });
            Ok(())
        }
    }
}

fn clamped(timestamp: EventTimestamp, policy: &AuditPolicy) -> EventTimestamp {
    match policy.earliest_timestamp {
        Some(floor) if timestamp.value() < floor => EventTimestamp::from_datetime(floor),
        _ => timestamp,
    }
}
