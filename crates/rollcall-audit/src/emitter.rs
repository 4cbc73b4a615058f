use crate::policy::AuditPolicy;
use crate::reducer::SyntheticEvent;
use rollcall_types::EnrollmentKey;
use serde::Serialize;
use serde_json::json;

/// Null marker for absent fields in the tab-separated shape.
const TSV_NULL: &str = r"\N";

/// The two downstream shapes a synthesized event can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Compact tab-separated tuple for tabular jobs.
    Tuple,
    /// Full JSON clone, shape-compatible with a real logged event.
    EventJson,
}

impl From<&AuditPolicy> for OutputFormat {
    fn from(policy: &AuditPolicy) -> Self {
        if policy.event_output {
            Self::EventJson
        } else {
            Self::Tuple
        }
    }
}

/// One synthesized event flattened for tabular output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconciliationRecord {
    pub course_id: String,
    pub user_id: i64,
    pub timestamp: String,
    pub event_type: String,
    pub mode: Option<String>,
    pub reason: String,
    pub after_time: Option<String>,
    pub before_time: String,
}

impl ReconciliationRecord {
    pub fn tsv_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.course_id,
            self.user_id,
            self.timestamp,
            self.event_type,
            self.mode.as_deref().unwrap_or(TSV_NULL),
            self.reason,
            self.after_time.as_deref().unwrap_or(TSV_NULL),
            self.before_time,
        )
    }
}

/// The `synthesized` sub-object carried by the JSON clone, recording how
/// the event was inferred.
#[derive(Debug, Serialize)]
struct SynthesizedInfo<'a> {
    reason: &'a str,
    after_time: Option<&'a str>,
    before_time: &'a str,
}

/// Render synthesized events in the requested shape, each paired with the
/// `YYYY-MM-DD` partition its timestamp falls on.
pub fn emit(
    key: &EnrollmentKey,
    synthesized: &[SyntheticEvent],
    format: OutputFormat,
) -> Vec<(String, String)> {
    synthesized
        .iter()
        .map(|synth| {
            let line = match format {
                OutputFormat::Tuple => record_for(key, synth).tsv_line(),
                OutputFormat::EventJson => event_json(key, synth),
            };
            (date_partition(synth), line)
        })
        .collect()
}

/// Partition key shared by both output shapes.
pub fn date_partition(synth: &SyntheticEvent) -> String {
    synth.timestamp.date_stamp()
}

pub fn record_for(key: &EnrollmentKey, synth: &SyntheticEvent) -> ReconciliationRecord {
    ReconciliationRecord {
        course_id: key.course_id.as_str().to_owned(),
        user_id: key.user_id,
        timestamp: synth.timestamp.text().to_owned(),
        event_type: synth.kind.event_type().to_owned(),
        mode: synth.mode.clone(),
        reason: synth.reason.clone(),
        after_time: synth.after.as_ref().map(|t| t.text().to_owned()),
        before_time: synth.before.text().to_owned(),
    }
}

/// Build the full event clone. The envelope is reconstructed from the key
/// (the reducer's inputs do not retain raw lines), matching the shape the
/// snapshot synthesizer uses for real validation events.
fn event_json(key: &EnrollmentKey, synth: &SyntheticEvent) -> String {
    let info = SynthesizedInfo {
        reason: &synth.reason,
        after_time: synth.after.as_ref().map(|t| t.text()),
        before_time: synth.before.text(),
    };
    json!({
        "event_type": synth.kind.event_type(),
        "time": synth.timestamp.text(),
        "event_source": "server",
        "username": "",
        "host": "",
        "context": {
            "course_id": key.course_id.as_str(),
            "org_id": key.course_id.org(),
            "user_id": key.user_id,
        },
        "event": {
            "course_id": key.course_id.as_str(),
            "user_id": key.user_id,
            "mode": synth.mode,
        },
        "synthesized": info,
    })
    .to_string()
}
