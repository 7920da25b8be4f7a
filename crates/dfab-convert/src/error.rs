/// Errors raised while turning an original into normalized text.
///
/// Callers that orchestrate storage treat every variant the same way; the
/// variants exist for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// No converter handles this kind of input.
    #[error("unsupported document type {content_type:?} ({filename})")]
    Unsupported {
        content_type: String,
        filename: String,
    },

    /// The input (or the converter's output) is not valid UTF-8.
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(String),

    /// The external converter could not be started.
    #[error("failed to spawn converter {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external converter exited unsuccessfully.
    #[error("converter {program:?} failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        /// Rendered exit status, e.g. `exit status: 2`.
        status: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The converter command line is unusable.
    #[error("invalid converter command: {0}")]
    InvalidCommand(String),

    /// Any other converter-specific failure.
    #[error("conversion failed: {0}")]
    Failed(String),

    /// I/O error while staging input for a converter.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for conversion operations.
pub type ConversionResult<T> = Result<T, ConversionError>;
