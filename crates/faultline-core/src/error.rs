use thiserror::Error;

/// Fatal failures of a case report run. Any of these aborts the whole batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("webhook request failed: {0}")]
    Transport(String),

    #[error("Cannot parse response from webhook: {0}")]
    UnparsableResponse(String),

    #[error("No valid case data found in webhook response")]
    NoCaseDataFound,

    #[error("no reports could be produced from the webhook response")]
    NoValidReports,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A candidate case object lacking one of its required fields.
///
/// Never fatal: the candidate is dropped and the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("case candidate #{index} is missing `{field}`")]
pub struct MalformedCase {
    pub index: usize,
    pub field: &'static str,
}
