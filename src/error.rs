use thiserror::Error;

/// Errors that can occur while loading or decoding an API description document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read document '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse document JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Failed to parse document YAML: {0}")]
    YamlParseError(#[from] serde_yaml::Error),

    #[error("Invalid API description: missing 'openapi' version marker")]
    MissingVersion,

    #[error("Operation '{method} {path}' is malformed: {message}")]
    MalformedOperation {
        method: String,
        path: String,
        message: String,
    },
}

/// The structural validator found problems that make analysis impossible.
#[derive(Error, Debug, Clone)]
#[error("Document failed validation with {} error(s): {}", errors.len(), errors.join("; "))]
pub struct ValidationFailure {
    pub errors: Vec<String>,
}

/// Errors raised by an `HttpTransport` for a single live call.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid request URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Request to '{url}' failed: {message}")]
    Network { url: String, message: String },

    #[error("Response from '{url}' declared JSON but could not be decoded: {message}")]
    InvalidJson { url: String, message: String },
}

/// Errors in the refinement loop's setup. Individual call failures never surface here.
#[derive(Error, Debug, Clone)]
pub enum RefineError {
    #[error("Iteration cap must be at least 1, got {0}")]
    InvalidIterationCap(usize),

    #[error("Invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },
}

/// Errors that can occur while writing analysis reports.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Could not write report '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Any error produced by the end-to-end pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Refine(#[from] RefineError),

    #[error(transparent)]
    Report(#[from] ReportError),
}
