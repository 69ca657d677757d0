//! Error types shared by the analysis and report paths.
//!
//! Generation itself is total; these only cover the seams where a real
//! backend or the filesystem can fail.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why an analysis run ended without a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The backend did not answer within the configured timeout.
    #[error("analysis timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
    /// Transport or inference failure.
    #[error("analysis backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    /// The output surface could not be opened or written.
    #[error("report target {} is unavailable: {source}", .target.display())]
    SinkUnavailable {
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        assert_eq!(
            AnalysisError::TimedOut(Duration::from_millis(1500)).to_string(),
            "analysis timed out after 1500ms"
        );
        let e = ExportError::SinkUnavailable {
            target: PathBuf::from("/nope"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(e.to_string(), "report target /nope is unavailable: denied");
    }
}
