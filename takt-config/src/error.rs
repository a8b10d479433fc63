//! Error types for configuration loading and validation

use std::fmt::Write;
use std::path::PathBuf;

use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Unified configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// A value is outside the range the bus, timers or simulator accept.
    #[error("Invalid configuration:\n{}", format_validation_errors(.0))]
    Validation(#[source] ValidationErrors),

    /// Figment could not merge or extract the layered sources.
    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] figment::Error),

    /// The effective configuration could not be rendered as YAML.
    #[error("Configuration rendering error: {0}")]
    Rendering(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One line per failed field, addressed by its dotted path
/// (`core.event_bus.max_servers`).
fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut output = String::new();
    collect_validation_errors(&mut output, "", errors);
    output
}

fn collect_validation_errors(output: &mut String, prefix: &str, errors: &ValidationErrors) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Struct(nested) => collect_validation_errors(output, &path, nested),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_errors(output, &format!("{path}[{index}]"), nested);
                }
            }
            ValidationErrorsKind::Field(failures) => {
                let _ = writeln!(output, "Field '{}':", path);
                for error in failures {
                    let message = match &error.message {
                        Some(msg) => msg.to_string(),
                        None => error.code.to_string(),
                    };
                    let _ = writeln!(output, "  - {}", message);
                }
            }
        }
    }
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}
