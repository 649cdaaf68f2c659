//! SLO templates.
//!
//! Once the key SLIs of a service are known, it still takes a fair amount of
//! SLO theory and PromQL to turn them into burn-rate alerts. Each template
//! here captures one category of system and expands a handful of user
//! parameters into recording rules that all terminate in the generic
//! `job:slo_error:ratio<window>` and `job:slo_error_budget:ratio` series.
//! The [`crate::pipeline`] alert rules are written purely against those two.
//!
//! A template has two halves:
//!
//! - per-instance rules, produced by [`Slo::rules`] for every definition;
//! - translation rules, produced once per kind by
//!   [`Template::translation_rules`], mapping the kind's intermediate series
//!   into `job:slo_error:ratio<window>`.

mod batch;
mod error_rate;
mod latency;

pub use batch::BatchProcessingSlo;
pub use error_rate::ErrorRateSlo;
pub use latency::{LatencySlo, RequestClass};

use crate::error::TemplateError;
use crate::rule::{Labels, Rule, labels};
use crate::window::{validate_expression, validate_required};
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

/// Record name of the SLO definition marker.
pub const SLO_DEFINITION: &str = "job:slo_definition:none";
/// Record name of the per-SLO error budget.
pub const SLO_ERROR_BUDGET: &str = "job:slo_error_budget:ratio";
/// Record name of the user labels info series.
pub const SLO_LABELS_INFO: &str = "job:slo_labels_info:none";

/// A configured SLO instance.
pub trait Slo: std::fmt::Debug {
    /// Globally unique name of the SLO.
    fn name(&self) -> &str;

    /// Name of the template kind that produced this SLO.
    fn template(&self) -> &'static str;

    /// Recording rules implementing this SLO definition.
    ///
    /// Always starts with the three rules of [`BaseSlo::rules`].
    fn rules(&self) -> Result<Vec<Rule>, TemplateError>;

    /// Check parameters that deserialization alone cannot enforce.
    fn validate(&self) -> Result<(), String>;
}

/// A template kind that can be registered and resolved by name.
pub trait Template: Slo + DeserializeOwned + 'static {
    /// Name used in definition files (`template: <NAME>`).
    const NAME: &'static str;

    /// Rules translating this kind's intermediate series into
    /// `job:slo_error:ratio<window>`.
    fn translation_rules() -> Result<Vec<Rule>, TemplateError>;
}

static LABEL_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("valid regex"));

/// Fields shared by every template.
///
/// From these the base produces three rules:
///
/// - `job:slo_definition:none{name, budget, template, params...}` records the
///   parameters an SLO was built from, so changes to dependent rules can be
///   traced back over time;
/// - `job:slo_error_budget:ratio{name}` is the right-hand side of every
///   burn-rate comparison;
/// - `job:slo_labels_info:none{name, labels...}` exposes user labels without
///   attaching them to every other series.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BaseSlo {
    pub name: String,
    pub budget: f64,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub annotations: Labels,
}

impl BaseSlo {
    pub fn new(name: impl Into<String>, budget: f64) -> Self {
        Self {
            name: name.into(),
            budget,
            labels: Labels::new(),
            annotations: Labels::new(),
        }
    }

    /// The three universal rules, with `params` recorded on the definition marker.
    pub fn rules(&self, template: &str, params: Labels) -> Vec<Rule> {
        let mut definition = self.annotations.clone();
        definition.extend(params);
        definition.insert("template".to_string(), template.to_string());
        definition.insert("budget".to_string(), self.budget_expr());
        definition.insert("name".to_string(), self.name.clone());

        vec![
            Rule::recording(SLO_DEFINITION, definition, "1"),
            Rule::recording(SLO_ERROR_BUDGET, self.join_labels(Labels::new()), self.budget_expr()),
            Rule::recording(SLO_LABELS_INFO, self.join_labels(self.labels.clone()), "1"),
        ]
    }

    /// `{name}` merged over `additional`.
    pub fn join_labels(&self, additional: Labels) -> Labels {
        let mut joined = additional;
        joined.insert("name".to_string(), self.name.clone());
        joined
    }

    fn budget_expr(&self) -> String {
        format!("{}", self.budget)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if !self.budget.is_finite() || !(0.0..1.0).contains(&self.budget) {
            return Err(format!("budget must be in [0, 1), got {}", self.budget));
        }
        for (kind, map) in [("label", &self.labels), ("annotation", &self.annotations)] {
            if let Some(key) = map.keys().find(|k| !LABEL_NAME_REGEX.is_match(k)) {
                return Err(format!("invalid {} name '{}'", kind, key));
            }
        }
        Ok(())
    }
}

/// Validate a user expression field against the placeholders it may use
/// and the ones it must use.
pub(crate) fn validate_field(
    field: &str,
    expr: &str,
    allowed: &[&str],
    required: &[&str],
) -> Result<(), String> {
    if expr.trim().is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    validate_expression(expr, allowed)
        .and_then(|()| validate_required(expr, required))
        .map_err(|e| format!("{}: {}", field, e))
}

/// Params recorded on the definition marker.
pub(crate) fn params<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Labels {
    labels(pairs.into_iter().map(|(k, v)| (k, v.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseSlo {
        let mut base = BaseSlo::new("api-availability", 0.01);
        base.labels = labels([("team", "payments")]);
        base.annotations = labels([("runbook", "https://runbooks/api")]);
        base
    }

    #[test]
    fn base_rules_are_the_three_universal_rules() {
        let rules = base().rules("ErrorRateSLO", Labels::new());
        let names: Vec<_> = rules.iter().map(Rule::name).collect();
        assert_eq!(names, vec![SLO_DEFINITION, SLO_ERROR_BUDGET, SLO_LABELS_INFO]);
        assert!(rules.iter().all(|r| r.labels()["name"] == "api-availability"));
    }

    #[test]
    fn definition_marker_records_parameters_and_annotations() {
        let rules = base().rules("ErrorRateSLO", params([("errors", " sum(x) ")]));
        let definition = rules[0].labels();
        assert_eq!(rules[0].expr(), "1");
        assert_eq!(definition["budget"], "0.01");
        assert_eq!(definition["template"], "ErrorRateSLO");
        assert_eq!(definition["errors"], "sum(x)");
        assert_eq!(definition["runbook"], "https://runbooks/api");
        assert!(!definition.contains_key("team"));
    }

    #[test]
    fn error_budget_rule_only_carries_name() {
        let rules = base().rules("ErrorRateSLO", Labels::new());
        assert_eq!(rules[1].expr(), "0.01");
        assert_eq!(rules[1].labels(), &labels([("name", "api-availability")]));
    }

    #[test]
    fn labels_info_carries_user_labels() {
        let rules = base().rules("ErrorRateSLO", Labels::new());
        assert_eq!(
            rules[2].labels(),
            &labels([("name", "api-availability"), ("team", "payments")])
        );
    }

    #[test]
    fn name_cannot_be_overridden_by_labels() {
        let mut slo = base();
        slo.labels.insert("name".to_string(), "other".to_string());
        let rules = slo.rules("ErrorRateSLO", params([("name", "other")]));
        assert!(rules.iter().all(|r| r.labels()["name"] == "api-availability"));
    }

    #[test]
    fn validate_accepts_valid_base() {
        assert!(base().validate().is_ok());
        assert!(BaseSlo::new("zero", 0.0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_budget() {
        assert!(BaseSlo::new("x", 1.0).validate().is_err());
        assert!(BaseSlo::new("x", -0.1).validate().is_err());
        assert!(BaseSlo::new("x", f64::NAN).validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_name() {
        let err = BaseSlo::new("  ", 0.1).validate().unwrap_err();
        assert!(err.contains("name"));
    }

    #[test]
    fn validate_rejects_invalid_label_name() {
        let mut slo = base();
        slo.labels.insert("bad-key".to_string(), "v".to_string());
        let err = slo.validate().unwrap_err();
        assert_eq!(err, "invalid label name 'bad-key'");
    }

    #[test]
    fn validate_field_reports_field() {
        let err =
            validate_field("total", "rate(x[{{ wndow }}])", &["window"], &["window"]).unwrap_err();
        assert!(err.starts_with("total: "), "{}", err);

        let err = validate_field("errors", "  ", &["window"], &["window"]).unwrap_err();
        assert_eq!(err, "errors must not be empty");
    }

    #[test]
    fn validate_field_requires_placeholders() {
        assert!(validate_field("total", "rate(x[{{ window }}])", &["window"], &["window"]).is_ok());

        let err = validate_field("total", "rate(x[5m])", &["window"], &["window"]).unwrap_err();
        assert_eq!(err, "total: missing required placeholder(s): '{{ window }}'");
    }
}
