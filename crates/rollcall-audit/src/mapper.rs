use rollcall_types::{
    CourseKey, EnrollmentEvent, EnrollmentKey, EventKind, EventTimestamp, ValidationInfo,
};
use serde_json::Value;

/// Parse one log line into a keyed enrollment event.
///
/// Stateless and deterministic. Anything that is not a well-formed
/// enrollment event yields `None` with no further ceremony: non-JSON lines,
/// unrecognized or absent `event_type`, unparseable `time`, a non-object
/// `event` payload, an invalid `course_id`, or a missing `user_id`.
/// Observability for dropped lines belongs to the surrounding framework.
pub fn parse_line(line: &str) -> Option<(EnrollmentKey, EnrollmentEvent)> {
    let record: Value = serde_json::from_str(line).ok()?;

    let kind = EventKind::from_event_type(record.get("event_type")?.as_str()?)?;
    let timestamp = EventTimestamp::parse(record.get("time")?.as_str()?).ok()?;

    let payload = record.get("event")?.as_object()?;
    let course_id = CourseKey::parse(payload.get("course_id")?.as_str()?).ok()?;
    let user_id = payload.get("user_id")?.as_i64()?;
    let mode = payload
        .get("mode")
        .and_then(Value::as_str)
        .map(str::to_owned);

    let validation = if kind == EventKind::Validated {
        Some(ValidationInfo {
            is_active: payload.get("is_active")?.as_bool()?,
            created: EventTimestamp::parse(payload.get("created")?.as_str()?).ok()?,
            dump_start: EventTimestamp::parse(payload.get("dump_start")?.as_str()?).ok()?,
            dump_end: EventTimestamp::parse(payload.get("dump_end")?.as_str()?).ok()?,
        })
    } else {
        None
    };

    Some((
        EnrollmentKey { course_id, user_id },
        EnrollmentEvent {
            timestamp,
            kind,
            mode,
            validation,
        },
    ))
}
