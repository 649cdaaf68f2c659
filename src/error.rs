//! Centralized error types for slo-builder using thiserror.
//!
//! Every error is fatal: the compiler is deterministic, so nothing is
//! retried and no partial rule file is ever written.

use thiserror::Error;

/// Errors raised while reading and parsing SLO definition documents.
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("failed to read definitions file {path}: {message}")]
    Read { path: String, message: String },
    #[error("invalid definitions document: {0}")]
    Syntax(String),
    #[error("definition #{index}: unsupported template type: {template}")]
    UnknownTemplate { template: String, index: usize },
    #[error("definition #{index} ({template}): {message}")]
    Deserialization {
        template: String,
        index: usize,
        message: String,
    },
    #[error("invalid SLO '{name}': {message}")]
    Invalid { name: String, message: String },
}

/// Errors related to expression template rendering.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("failed to render '{source_text}': {message}")]
    Render { source_text: String, message: String },
    #[error("window '{window}' listed more than once")]
    DuplicateWindow { window: String },
}

/// Errors related to assembling and rendering the rule group.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("SLO '{0}' registered more than once")]
    DuplicateSlo(String),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("failed to serialize rule groups: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_error_read_display() {
        let err = DefinitionError::Read {
            path: "slos.yaml".to_string(),
            message: "No such file or directory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to read definitions file slos.yaml: No such file or directory"
        );
    }

    #[test]
    fn definition_error_unknown_template_display() {
        let err = DefinitionError::UnknownTemplate {
            template: "AvailabilitySLO".to_string(),
            index: 2,
        };
        assert_eq!(
            err.to_string(),
            "definition #2: unsupported template type: AvailabilitySLO"
        );
    }

    #[test]
    fn definition_error_deserialization_display() {
        let err = DefinitionError::Deserialization {
            template: "ErrorRateSLO".to_string(),
            index: 0,
            message: "missing field `total`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "definition #0 (ErrorRateSLO): missing field `total`"
        );
    }

    #[test]
    fn definition_error_invalid_display() {
        let err = DefinitionError::Invalid {
            name: "api".to_string(),
            message: "budget must be in [0, 1)".to_string(),
        };
        assert_eq!(err.to_string(), "invalid SLO 'api': budget must be in [0, 1)");
    }

    #[test]
    fn template_error_display() {
        let err = TemplateError::DuplicateWindow {
            window: "5m".to_string(),
        };
        assert_eq!(err.to_string(), "window '5m' listed more than once");
    }

    #[test]
    fn pipeline_error_display() {
        let err = PipelineError::DuplicateSlo("api".to_string());
        assert_eq!(err.to_string(), "SLO 'api' registered more than once");

        let err = PipelineError::Template(TemplateError::DuplicateWindow {
            window: "1h".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "template error: window '1h' listed more than once"
        );

        let err = PipelineError::Serialization("bad".to_string());
        assert_eq!(err.to_string(), "failed to serialize rule groups: bad");
    }
}
