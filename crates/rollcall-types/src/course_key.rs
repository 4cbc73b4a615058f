use crate::error::DomainError;
use std::fmt;

const OPAQUE_PREFIX: &str = "course-v1:";

/// A validated course identifier.
///
/// Two grammars are accepted: the legacy slash form `org/course/run` and the
/// opaque form `course-v1:org+course+run`. Both require exactly three
/// non-empty segments drawn from `[A-Za-z0-9_.~-]`. Anything else is
/// rejected, which is how malformed log lines get filtered before they reach
/// the reconciler.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CourseKey(String);

impl CourseKey {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let segments: Vec<&str> = match raw.strip_prefix(OPAQUE_PREFIX) {
            Some(rest) => rest.split('+').collect(),
            None => raw.split('/').collect(),
        };
        let well_formed = segments.len() == 3
            && segments
                .iter()
                .all(|segment| !segment.is_empty() && segment.chars().all(is_key_char));
        if !well_formed {
            return Err(DomainError::InvalidCourseKey {
                raw: raw.to_owned(),
            });
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The organization segment, used for emitted event envelopes.
    pub fn org(&self) -> &str {
        match self.0.strip_prefix(OPAQUE_PREFIX) {
            Some(rest) => rest.split('+').next().unwrap_or(""),
            None => self.0.split('/').next().unwrap_or(""),
        }
    }
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '~')
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
