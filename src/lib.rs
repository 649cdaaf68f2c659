//! slo-builder - Build Prometheus SLO rule groups from declarative SLO templates.

pub mod cli;
pub mod definitions;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod rule;
pub mod template;
pub mod window;

// Re-export commonly used types
pub use cli::LogFormat;
pub use definitions::{load_definitions, parse_definitions};
pub use error::{DefinitionError, PipelineError, TemplateError};
pub use pipeline::{DEFAULT_GROUP_NAME, Pipeline, alert_rules};
pub use registry::{TemplateEntry, TemplateRegistry};
pub use rule::{Labels, Rule, RuleGroup, RuleGroups};
pub use template::{
    BaseSlo, BatchProcessingSlo, ErrorRateSlo, LatencySlo, RequestClass, Slo, Template,
};
pub use window::{ALERT_WINDOWS, expand_over_windows};
