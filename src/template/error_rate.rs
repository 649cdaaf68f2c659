//! Error rate SLO template.

use super::{BaseSlo, Slo, Template, params, validate_field};
use crate::error::TemplateError;
use crate::rule::{Labels, Rule};
use crate::window::{ALERT_WINDOWS, WINDOW_PLACEHOLDER, expand_over_windows};
use serde::Deserialize;

/// SLO over the ratio of failed requests to total requests.
///
/// `errors` and `total` are rate expressions parameterised by
/// `{{ window }}`, recorded once per alert window.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorRateSlo {
    #[serde(flatten)]
    pub base: BaseSlo,
    pub errors: String,
    pub total: String,
}

impl Slo for ErrorRateSlo {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn template(&self) -> &'static str {
        Self::NAME
    }

    fn rules(&self) -> Result<Vec<Rule>, TemplateError> {
        let mut rules = self.base.rules(
            Self::NAME,
            params([("errors", self.errors.as_str()), ("total", self.total.as_str())]),
        );

        rules.extend(expand_over_windows(
            ALERT_WINDOWS,
            &Rule::recording(
                "job:slo_error_rate_errors:rate{{ window }}",
                self.base.join_labels(Labels::new()),
                self.errors.trim(),
            ),
        )?);
        rules.extend(expand_over_windows(
            ALERT_WINDOWS,
            &Rule::recording(
                "job:slo_error_rate_total:rate{{ window }}",
                self.base.join_labels(Labels::new()),
                self.total.trim(),
            ),
        )?);

        Ok(rules)
    }

    fn validate(&self) -> Result<(), String> {
        self.base.validate()?;
        let window = &[WINDOW_PLACEHOLDER];
        validate_field("errors", &self.errors, window, window)?;
        validate_field("total", &self.total, window, window)
    }
}

impl Template for ErrorRateSlo {
    const NAME: &'static str = "ErrorRateSLO";

    fn translation_rules() -> Result<Vec<Rule>, TemplateError> {
        // A missing errors series (as opposed to a zero one) would otherwise
        // drop the ratio entirely, so fall back to zero shaped like total.
        expand_over_windows(
            ALERT_WINDOWS,
            &Rule::recording(
                "job:slo_error:ratio{{ window }}",
                Labels::new(),
                "((job:slo_error_rate_errors:rate{{ window }}) or (0 * job:slo_error_rate_total:rate{{ window }})) / job:slo_error_rate_total:rate{{ window }}",
            ),
        )
    }
}
