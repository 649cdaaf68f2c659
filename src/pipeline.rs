//! Rule group assembly.
//!
//! A [`Pipeline`] collects the per-instance rules of every registered SLO and
//! builds one rule group ordered as:
//!
//! 1. per-instance rules, in registration order;
//! 2. every registered template's translation rules;
//! 3. the generic multi-window burn-rate alerts.
//!
//! Every template terminates in `job:slo_error:ratio<window>` and
//! `job:slo_error_budget:ratio`, so the alerts in step 3 apply to all SLOs
//! alike, joined on `name`.

use crate::error::PipelineError;
use crate::registry::TemplateRegistry;
use crate::rule::{Rule, RuleGroup, RuleGroups, labels};
use crate::template::Slo;
use std::collections::HashSet;
use std::time::Duration;

/// Default rule group name.
pub const DEFAULT_GROUP_NAME: &str = "slo-builder";

/// Builds the rule group powering a set of SLOs.
///
/// Consumed by [`Pipeline::build`]; create a new pipeline per build.
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    rules: Vec<Rule>,
    registered: HashSet<String>,
}

impl Pipeline {
    /// Create a pipeline producing a rule group called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            registered: HashSet::new(),
        }
    }

    /// Append the rules of `slo`.
    ///
    /// # Errors
    /// Returns [`PipelineError::DuplicateSlo`] if an SLO of the same name was
    /// already registered (alerts join on `name`), or
    /// [`PipelineError::Template`] if its rules fail to render. The pipeline
    /// is left unchanged on error.
    pub fn register(&mut self, slo: &dyn Slo) -> Result<(), PipelineError> {
        if self.registered.contains(slo.name()) {
            return Err(PipelineError::DuplicateSlo(slo.name().to_string()));
        }

        let rules = slo.rules()?;
        tracing::info!(
            template = slo.template(),
            name = %slo.name(),
            rules = rules.len(),
            "Registered SLO"
        );

        self.registered.insert(slo.name().to_string());
        self.rules.extend(rules);
        Ok(())
    }

    /// Register each SLO in order, stopping at the first failure.
    pub fn register_all<S: AsRef<dyn Slo>>(&mut self, slos: &[S]) -> Result<(), PipelineError> {
        slos.iter().try_for_each(|slo| self.register(slo.as_ref()))
    }

    /// Number of SLOs registered so far.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Assemble the rule group.
    ///
    /// Translation rules of every kind in `registry` are emitted whether or
    /// not a registered SLO uses them.
    pub fn build(self, registry: &TemplateRegistry) -> RuleGroups {
        let mut rules = self.rules;
        rules.extend(registry.translation_rules().cloned());
        rules.extend(alert_rules());

        tracing::debug!(group = %self.name, rules = rules.len(), "Built rule group");

        RuleGroups {
            groups: vec![RuleGroup {
                name: self.name,
                rules,
            }],
        }
    }
}

/// Burn rate multiplier paired with a long and a short window.
struct BurnWindow {
    factor: &'static str,
    long: &'static str,
    short: &'static str,
}

/// Both windows must exceed `factor` times the SLO's budget.
fn burn_condition(burn: &BurnWindow) -> String {
    format!(
        "(\n  job:slo_error:ratio{long} > on(name) group_left() ({factor} * job:slo_error_budget:ratio)\nand\n  job:slo_error:ratio{short} > on(name) group_left() ({factor} * job:slo_error_budget:ratio)\n)",
        long = burn.long,
        short = burn.short,
        factor = burn.factor,
    )
}

fn burn_alert(name: &str, for_duration: Duration, burns: [BurnWindow; 2]) -> Rule {
    Rule::alerting(
        name,
        for_duration,
        labels([("severity", "ticket")]),
        format!("{}\nor\n{}\n", burn_condition(&burns[0]), burn_condition(&burns[1])),
    )
}

/// Generic multi-window error budget burn alerts.
///
/// Pairing a long and a short window keeps single-window blips quiet while
/// still catching both fast and slow budget burns.
pub fn alert_rules() -> Vec<Rule> {
    vec![
        burn_alert(
            "SLOErrorBudgetFastBurn",
            Duration::from_secs(60),
            [
                BurnWindow {
                    factor: "14.4",
                    long: "1h",
                    short: "5m",
                },
                BurnWindow {
                    factor: "6.0",
                    long: "6h",
                    short: "30m",
                },
            ],
        ),
        burn_alert(
            "SLOErrorBudgetSlowBurn",
            Duration::from_secs(3600),
            [
                BurnWindow {
                    factor: "3.0",
                    long: "1d",
                    short: "2h",
                },
                BurnWindow {
                    factor: "1.0",
                    long: "3d",
                    short: "6h",
                },
            ],
        ),
    ]
}
