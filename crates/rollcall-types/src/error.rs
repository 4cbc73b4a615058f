use thiserror;

#[derive(Clone, Debug, thiserror::Error)]
pub enum DomainError {
    #[error("invalid course key: {raw:?}")]
    InvalidCourseKey { raw: String },
    #[error("invalid event timestamp: {raw:?}")]
    InvalidTimestamp { raw: String },
}
