//! Error taxonomy for the workbench: plain enums with a hand-written
//! `Display` and a blanket `Error` impl, no `thiserror`.

use std::fmt;

#[derive(Debug, Clone)]
pub enum WorkbenchError {
    /// User input failed validation (empty query, query over the length cap).
    Validation(String),
    /// A tool call failed after retries were exhausted.
    ToolFailure { tool: String, message: String },
    /// A node or the whole session exceeded its deadline.
    Timeout { step: String, elapsed_ms: i64 },
    /// The response synthesizer could not produce a final answer.
    SynthesisFailure(String),
    /// Reading from or writing to the object/record store failed.
    PersistenceFailure(String),
}

impl fmt::Display for WorkbenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkbenchError::Validation(msg) => write!(f, "validation error: {}", msg),
            WorkbenchError::ToolFailure { tool, message } => {
                write!(f, "tool '{}' failed: {}", tool, message)
            }
            WorkbenchError::Timeout { step, elapsed_ms } => {
                write!(f, "step '{}' timed out after {}ms", step, elapsed_ms)
            }
            WorkbenchError::SynthesisFailure(msg) => write!(f, "synthesis failed: {}", msg),
            WorkbenchError::PersistenceFailure(msg) => write!(f, "persistence failure: {}", msg),
        }
    }
}

impl std::error::Error for WorkbenchError {}

pub type WorkbenchResult<T> = Result<T, WorkbenchError>;

/// Alias for the boxed dynamic error threaded through every async-trait
/// client and tool boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_human_readable() {
        let err = WorkbenchError::ToolFailure {
            tool: "tavily_search".into(),
            message: "connection reset".into(),
        };
        assert_eq!(err.to_string(), "tool 'tavily_search' failed: connection reset");
    }

    #[test]
    fn validation_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(WorkbenchError::Validation("empty query".into()));
        assert!(err.to_string().contains("empty query"));
    }
}
