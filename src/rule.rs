//! Prometheus rule model.
//!
//! Mirrors the subset of the Prometheus `rulefmt` schema this tool emits:
//! a document of named rule groups, each an ordered list of recording and
//! alerting rules. Labels are kept in a `BTreeMap` so the rendered YAML is
//! byte-identical across runs.

use crate::error::PipelineError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Ordered label set attached to a rule.
pub type Labels = BTreeMap<String, String>;

/// A single Prometheus rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rule {
    /// Precomputed time series.
    Recording {
        record: String,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        labels: Labels,
        expr: String,
    },
    /// Condition that fires once it held for `for`.
    Alerting {
        alert: String,
        #[serde(rename = "for", with = "humantime_serde")]
        for_duration: Duration,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        labels: Labels,
        expr: String,
    },
}

impl Rule {
    /// Create a recording rule.
    pub fn recording(record: impl Into<String>, labels: Labels, expr: impl Into<String>) -> Self {
        Rule::Recording {
            record: record.into(),
            labels,
            expr: expr.into(),
        }
    }

    /// Create an alerting rule.
    pub fn alerting(
        alert: impl Into<String>,
        for_duration: Duration,
        labels: Labels,
        expr: impl Into<String>,
    ) -> Self {
        Rule::Alerting {
            alert: alert.into(),
            for_duration,
            labels,
            expr: expr.into(),
        }
    }

    /// Record or alert name.
    pub fn name(&self) -> &str {
        match self {
            Rule::Recording { record, .. } => record,
            Rule::Alerting { alert, .. } => alert,
        }
    }

    pub fn labels(&self) -> &Labels {
        match self {
            Rule::Recording { labels, .. } | Rule::Alerting { labels, .. } => labels,
        }
    }

    pub fn expr(&self) -> &str {
        match self {
            Rule::Recording { expr, .. } | Rule::Alerting { expr, .. } => expr,
        }
    }
}

/// Named, ordered collection of rules evaluated together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleGroup {
    pub name: String,
    pub rules: Vec<Rule>,
}

/// Top-level rule file document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleGroups {
    pub groups: Vec<RuleGroup>,
}

impl RuleGroups {
    /// Render the document in the Prometheus rule file format.
    ///
    /// # Errors
    /// Returns [`PipelineError::Serialization`] if the document cannot be rendered.
    pub fn to_yaml(&self) -> Result<String, PipelineError> {
        serde_yaml::to_string(self).map_err(|e| PipelineError::Serialization(e.to_string()))
    }
}

/// Build a label set from `(key, value)` pairs.
pub fn labels<K, V, I>(pairs: I) -> Labels
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
