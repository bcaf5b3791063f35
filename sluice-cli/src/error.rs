//! CLI-specific error types and exit code mapping

use sluice_core::error::SluiceError;
use sluice_pipeline::EventPipelineError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A condition document could not be built into a tree.
    #[error("condition error: {0}")]
    Condition(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// An event line could not be parsed.
    #[error("invalid event at line {line}: {reason}")]
    InvalidEvent { line: u64, reason: String },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from sluice-core.
    #[error("{0}")]
    Core(#[from] SluiceError),

    /// Pipeline load or run failure.
    #[error("pipeline error: {0}")]
    Pipeline(String),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Success                                  |
    /// | 1    | General / command error                  |
    /// | 2    | Configuration or condition document error|
    /// | 3    | Invalid event input                      |
    /// | 10   | IO error                                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Condition(_) => 2,
            Self::InvalidEvent { .. } => 3,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) | Self::Pipeline(_) => 1,
        }
    }
}

impl From<EventPipelineError> for CliError {
    fn from(e: EventPipelineError) -> Self {
        Self::Pipeline(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2, "config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_condition_error() {
        let err = CliError::Condition("unknown op 'xor'".to_owned());
        assert_eq!(
            err.exit_code(),
            2,
            "condition error should return exit code 2"
        );
    }

    #[test]
    fn test_exit_code_invalid_event() {
        let err = CliError::InvalidEvent {
            line: 3,
            reason: "expected value".to_owned(),
        };
        assert_eq!(err.exit_code(), 3, "invalid event should return exit code 3");
    }

    #[test]
    fn test_exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10, "io error should return exit code 10");
    }

    #[test]
    fn test_exit_code_command_error() {
        let err = CliError::Command("condition trees differ".to_owned());
        assert_eq!(err.exit_code(), 1, "command error should return exit code 1");
    }

    #[test]
    fn test_exit_code_pipeline_error() {
        let err = CliError::Pipeline("channel closed".to_owned());
        assert_eq!(err.exit_code(), 1, "pipeline error should return exit code 1");
    }

    #[test]
    fn test_error_display_invalid_event() {
        let err = CliError::InvalidEvent {
            line: 7,
            reason: "EOF while parsing".to_owned(),
        };
        assert_eq!(err.to_string(), "invalid event at line 7: EOF while parsing");
    }

    #[test]
    fn test_error_display_condition() {
        let err = CliError::Condition("missing values".to_owned());
        let display_str = err.to_string();
        assert!(display_str.contains("condition error"));
        assert!(display_str.contains("missing values"));
    }

    #[test]
    fn test_from_pipeline_error() {
        let err: CliError = EventPipelineError::PipelineLoad {
            path: "p.yaml".to_owned(),
            reason: "YAML parse error".to_owned(),
        }
        .into();
        match err {
            CliError::Pipeline(msg) => assert!(msg.contains("p.yaml")),
            _ => panic!("expected Pipeline error variant"),
        }
    }

    #[test]
    fn test_from_core_error() {
        use sluice_core::error::ConfigError;
        let core_err = SluiceError::Config(ConfigError::FileNotFound {
            path: "sluice.toml".to_owned(),
        });
        let cli_err: CliError = core_err.into();
        assert!(matches!(cli_err, CliError::Core(_)));
        assert_eq!(cli_err.exit_code(), 1);
    }
}
