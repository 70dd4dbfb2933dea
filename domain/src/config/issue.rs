//! Configuration issues found while validating settings.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// `[generation] provider` names no known text generator.
    UnknownProvider,
    /// A keyword normalization constant is zero or negative.
    NonPositiveNormalization,
    /// A completion timeout longer than the agent timeout, or an agent
    /// timeout longer than the outer deadline.
    InvertedTimeouts,
    /// `default_pipeline` names no registered pipeline.
    UnknownPipeline,
    /// `[agents.<tag>]` names no built-in domain.
    UnknownDomainTag,
    /// A pipeline step names a stage with no built-in processor.
    UnknownStage,
    /// A score or threshold outside `[0, 1]`.
    OutOfRange,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_severity() {
        let err = ConfigIssue::error(ConfigIssueCode::UnknownProvider, "bad provider");
        assert!(err.is_error());
        assert_eq!(err.to_string(), "error: bad provider");

        let warn = ConfigIssue::warning(ConfigIssueCode::UnknownDomainTag, "unused section");
        assert!(!warn.is_error());
        assert_eq!(warn.to_string(), "warning: unused section");
    }
}
