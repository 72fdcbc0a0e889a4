use thiserror::Error;

/// Configuration errors reported at init time.
///
/// A check that fails validation is surfaced to the operator and never
/// scheduled to run.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The raw definition document could not be decoded.
    #[error("check {id} ({check_type}): malformed definition: {source}")]
    Malformed {
        id: String,
        check_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// A required field was absent or empty. Validation stops at the first
    /// missing field; it does not aggregate.
    #[error("check {id} ({check_type}): missing required field {field}")]
    MissingField {
        id: String,
        check_type: &'static str,
        field: &'static str,
    },
}
