//! SLO definition parsing.
//!
//! Definition files are the format users hand to `slo-builder build`:
//!
//! ```yaml
//! definitions:
//!   - template: BatchProcessingSLO
//!     definition:
//!       name: MarkPaymentsAsPaidMeetsDeadline
//!       budget: 0.1
//!       deadline: 2h
//!       volume: ...
//!       throughput: ...
//! ```
//!
//! Each entry's `template` is resolved through the [`TemplateRegistry`] and
//! its `definition` deserialized into a fresh instance of that kind. Parsing
//! is fail-fast: the first bad entry aborts the whole document.

use crate::error::DefinitionError;
use crate::registry::TemplateRegistry;
use crate::template::Slo;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct DefinitionsDocument {
    #[serde(default)]
    definitions: Vec<DefinitionEnvelope>,
}

#[derive(Debug, Deserialize)]
struct DefinitionEnvelope {
    template: String,
    definition: serde_yaml::Value,
}

/// Parse a definitions document into SLO instances.
///
/// # Errors
/// - [`DefinitionError::Syntax`] if the document is not a definitions list.
/// - [`DefinitionError::UnknownTemplate`] if an entry names an unregistered template.
/// - [`DefinitionError::Deserialization`] if a definition does not match its template's fields.
/// - [`DefinitionError::Invalid`] if a definition fails template validation.
pub fn parse_definitions(
    document: &str,
    registry: &TemplateRegistry,
) -> Result<Vec<Box<dyn Slo>>, DefinitionError> {
    let document: DefinitionsDocument =
        serde_yaml::from_str(document).map_err(|e| DefinitionError::Syntax(e.to_string()))?;

    let mut slos = Vec::with_capacity(document.definitions.len());
    for (index, envelope) in document.definitions.into_iter().enumerate() {
        let entry = registry.lookup(&envelope.template).ok_or_else(|| {
            DefinitionError::UnknownTemplate {
                template: envelope.template.clone(),
                index,
            }
        })?;

        let slo = entry.instantiate(envelope.definition).map_err(|e| {
            DefinitionError::Deserialization {
                template: envelope.template.clone(),
                index,
                message: e.to_string(),
            }
        })?;

        slo.validate().map_err(|message| DefinitionError::Invalid {
            name: slo.name().to_string(),
            message,
        })?;

        tracing::debug!(
            template = %envelope.template,
            name = %slo.name(),
            "Parsed SLO definition"
        );
        slos.push(slo);
    }

    Ok(slos)
}

/// Read and parse every definitions file, in order.
///
/// # Errors
/// Returns [`DefinitionError::Read`] if a file cannot be read, or the first
/// [`parse_definitions`] error, logged with the file it came from.
pub fn load_definitions<P: AsRef<Path>>(
    paths: &[P],
    registry: &TemplateRegistry,
) -> Result<Vec<Box<dyn Slo>>, DefinitionError> {
    let mut slos = Vec::new();
    for path in paths {
        let path = path.as_ref();
        tracing::info!(file = %path.display(), "Parsing definitions");

        let content = std::fs::read_to_string(path).map_err(|e| DefinitionError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let parsed = parse_definitions(&content, registry).inspect_err(|e| {
            tracing::error!(file = %path.display(), error = %e, "Failed to parse definitions");
        })?;
        tracing::info!(file = %path.display(), slos = parsed.len(), "Parsed definitions");
        slos.extend(parsed);
    }
    Ok(slos)
}
