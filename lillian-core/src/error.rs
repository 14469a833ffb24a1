use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("line {line}: {message} at `{remainder}`")]
    LexError {
        line: usize,
        message: String,
        remainder: String,
    },
    #[error("ran out of tokens while parsing")]
    OutOfTokens,
    #[error("line {line}: {message}")]
    ParseError { line: usize, message: String },
    #[error("{0}")]
    EvaluationError(String),
    #[error("checkpoint was reverted or released before use")]
    StaleCheckpoint,
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Name of the error variant, as shown by the CLI (`Error: <kind>`).
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::LexError { .. } => "LexError",
            CoreError::OutOfTokens => "OutOfTokensError",
            CoreError::ParseError { .. } => "ParseError",
            CoreError::EvaluationError(_) => "EvaluationError",
            CoreError::StaleCheckpoint => "StaleCheckpoint",
            CoreError::Io(_) => "IoError",
        }
    }

    pub(crate) fn eval(message: impl Into<String>) -> Self {
        CoreError::EvaluationError(message.into())
    }
}
