//! Template registry.
//!
//! Maps a template's declared name to a factory that deserializes a fresh
//! instance of that kind, and collects every kind's translation rules in
//! registration order. Definition files resolve `template:` through it.
//!
//! The process-wide registry is populated by an explicit [`initialize`] at
//! startup and is read-only afterwards. Tests build their own with
//! [`TemplateRegistry::with_default_templates`] to stay isolated.

use crate::error::TemplateError;
use crate::rule::Rule;
use crate::template::{BatchProcessingSlo, ErrorRateSlo, LatencySlo, Slo, Template};
use std::sync::OnceLock;

/// Deserializes a definition body into a fresh SLO of one kind.
pub type SloFactory = fn(serde_yaml::Value) -> Result<Box<dyn Slo>, serde_yaml::Error>;

/// A registered template kind.
#[derive(Debug, Clone)]
pub struct TemplateEntry {
    name: &'static str,
    factory: SloFactory,
    translation_rules: Vec<Rule>,
}

impl TemplateEntry {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Deserialize `definition` into a new instance of this kind.
    pub fn instantiate(&self, definition: serde_yaml::Value) -> Result<Box<dyn Slo>, serde_yaml::Error> {
        (self.factory)(definition)
    }

    pub fn translation_rules(&self) -> &[Rule] {
        &self.translation_rules
    }
}

fn instantiate<T: Template>(definition: serde_yaml::Value) -> Result<Box<dyn Slo>, serde_yaml::Error> {
    let slo: T = serde_yaml::from_value(definition)?;
    Ok(Box::new(slo))
}

/// Registry of template kinds, kept in registration order.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    entries: Vec<TemplateEntry>,
}

impl TemplateRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry holding every template kind this crate ships.
    ///
    /// # Errors
    /// Returns a [`TemplateError`] if a kind's translation rules fail to render.
    pub fn with_default_templates() -> Result<Self, TemplateError> {
        let mut registry = Self::new();
        registry.register::<BatchProcessingSlo>()?;
        registry.register::<ErrorRateSlo>()?;
        registry.register::<LatencySlo>()?;
        Ok(registry)
    }

    /// Register template kind `T` under its declared name.
    ///
    /// Registering a name twice replaces the earlier entry in place, keeping
    /// its position in the translation rule order.
    pub fn register<T: Template>(&mut self) -> Result<(), TemplateError> {
        let entry = TemplateEntry {
            name: T::NAME,
            factory: instantiate::<T>,
            translation_rules: T::translation_rules()?,
        };

        match self.entries.iter_mut().find(|e| e.name == T::NAME) {
            Some(existing) => {
                tracing::warn!(template = T::NAME, "Template registered twice, replacing");
                *existing = entry;
            }
            None => {
                tracing::debug!(
                    template = T::NAME,
                    translation_rules = entry.translation_rules.len(),
                    "Registered template"
                );
                self.entries.push(entry);
            }
        }
        Ok(())
    }

    /// Get a template kind by name.
    pub fn lookup(&self, name: &str) -> Option<&TemplateEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// All registered template names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names
    }

    /// Translation rules of every registered kind, in registration order.
    pub fn translation_rules(&self) -> impl Iterator<Item = &Rule> {
        self.entries.iter().flat_map(|e| e.translation_rules.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

static REGISTRY: OnceLock<TemplateRegistry> = OnceLock::new();

/// Populate the process-wide registry. Call once at startup.
///
/// Later calls return the already initialized registry.
///
/// # Errors
/// Returns a [`TemplateError`] if a built-in template fails to register.
pub fn initialize() -> Result<&'static TemplateRegistry, TemplateError> {
    if let Some(registry) = REGISTRY.get() {
        return Ok(registry);
    }
    let registry = TemplateRegistry::with_default_templates()?;
    Ok(REGISTRY.get_or_init(|| registry))
}

/// The process-wide registry, if [`initialize`] has run.
pub fn global() -> Option<&'static TemplateRegistry> {
    REGISTRY.get()
}
