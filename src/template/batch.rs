//! Batch processing SLO template.

use super::{BaseSlo, Slo, Template, params, validate_field};
use crate::error::TemplateError;
use crate::rule::{Labels, Rule};
use crate::window::{ALERT_WINDOWS, expand_over_windows};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

const BATCH_VOLUME: &str = "job:slo_batch_volume:max";
const BATCH_THROUGHPUT_TARGET: &str = "job:slo_batch_throughput_target:max";
const BATCH_THROUGHPUT: &str = "job:slo_batch_throughput:interval";
const BATCH_ERROR: &str = "job:slo_batch_error:interval";

/// SLO for a large batch process the business needs finished within a deadline.
///
/// The user supplies a throughput measure that is only present while the job
/// runs, plus an estimate of the maximum volume a single run processes. The
/// deadline turns that volume into a target throughput, and compliance is
/// measured as the share of target throughput the job failed to reach.
///
/// A reasonable volume estimate is a historic maximum with a growth factor,
/// e.g. 1.5x the largest run of the last 60 days.
///
/// Consequences worth knowing:
///
/// - error budget burns in proportion to unmet target throughput;
/// - budget burns even for runs that process less than the maximum volume;
/// - throughput above target counts as zero error, never negative, so bursty
///   runs cannot bank budget.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchProcessingSlo {
    #[serde(flatten)]
    pub base: BaseSlo,
    /// Time after the batch starts by which it must finish.
    #[serde(with = "humantime_serde")]
    pub deadline: Duration,
    /// Expected maximum volume processed by a single run.
    pub volume: String,
    /// Measure of batch throughput.
    pub throughput: String,
}

static SIMPLE_OPERAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_:.]+$").expect("valid regex"));

impl BatchProcessingSlo {
    /// Throughput needed to clear `volume` within the deadline.
    fn throughput_target_expr(&self) -> String {
        let volume = self.volume.trim();
        let operand = if SIMPLE_OPERAND.is_match(volume) {
            volume.to_string()
        } else {
            format!("({})", volume)
        };
        format!("{} / {}", operand, self.deadline.as_secs())
    }
}

impl Slo for BatchProcessingSlo {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn template(&self) -> &'static str {
        Self::NAME
    }

    fn rules(&self) -> Result<Vec<Rule>, TemplateError> {
        let deadline = humantime::format_duration(self.deadline).to_string();
        let mut rules = self.base.rules(
            Self::NAME,
            params([
                ("deadline", deadline.as_str()),
                ("volume", self.volume.as_str()),
                ("throughput", self.throughput.as_str()),
            ]),
        );

        rules.push(Rule::recording(
            BATCH_VOLUME,
            self.base.join_labels(Labels::new()),
            self.volume.trim(),
        ));
        rules.push(Rule::recording(
            BATCH_THROUGHPUT_TARGET,
            self.base.join_labels(Labels::new()),
            self.throughput_target_expr(),
        ));
        rules.push(Rule::recording(
            BATCH_THROUGHPUT,
            self.base.join_labels(Labels::new()),
            self.throughput.trim(),
        ));

        Ok(rules)
    }

    fn validate(&self) -> Result<(), String> {
        self.base.validate()?;
        if self.deadline.as_secs() == 0 {
            return Err("deadline must be at least 1s".to_string());
        }
        validate_field("volume", &self.volume, &[], &[])?;
        validate_field("throughput", &self.throughput, &[], &[])
    }
}

impl Template for BatchProcessingSlo {
    const NAME: &'static str = "BatchProcessingSLO";

    fn translation_rules() -> Result<Vec<Rule>, TemplateError> {
        // Synthetic error score: the share of target throughput not achieved.
        let mut rules = vec![Rule::recording(
            BATCH_ERROR,
            Labels::new(),
            format!(
                "1.0 - clamp_max({} / {}, 1.0)",
                BATCH_THROUGHPUT, BATCH_THROUGHPUT_TARGET
            ),
        )];

        rules.extend(expand_over_windows(
            ALERT_WINDOWS,
            &Rule::recording(
                "job:slo_error:ratio{{ window }}",
                Labels::new(),
                format!("avg_over_time({}[{{{{ window }}}}])", BATCH_ERROR),
            ),
        )?);

        Ok(rules)
    }
}
