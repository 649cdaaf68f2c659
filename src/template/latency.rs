//! Latency SLO template.

use super::{BaseSlo, Slo, Template, params, validate_field};
use crate::error::TemplateError;
use crate::rule::{Labels, Rule};
use crate::window::{
    ALERT_WINDOWS, WINDOW_PLACEHOLDER, expand_over_windows, expand_over_windows_with,
};
use serde::Deserialize;
use std::fmt;

/// Placeholder for the histogram bucket boundary in `observation`.
pub const BUCKET_PLACEHOLDER: &str = "le";

/// Symbolic latency target, mapped to a histogram bucket boundary.
///
/// The observation metric is expected to be a histogram with buckets
/// 0.1, 0.25, 0.5, 1, 2.5, 5 and 10 seconds, shared across routes so that
/// every class applies to a similar number of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RequestClass {
    #[serde(rename = "fast++")]
    FastestPlus,
    #[serde(rename = "fast+")]
    FastPlus,
    #[serde(rename = "fast")]
    Fast,
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "slow")]
    Slow,
    #[serde(rename = "slow+")]
    SlowPlus,
    #[serde(rename = "slow++")]
    SlowestPlus,
}

impl RequestClass {
    /// Histogram `le` boundary, in seconds.
    pub fn bucket(self) -> &'static str {
        match self {
            RequestClass::FastestPlus => "0.1",
            RequestClass::FastPlus => "0.25",
            RequestClass::Fast => "0.5",
            RequestClass::Ok => "1",
            RequestClass::Slow => "2.5",
            RequestClass::SlowPlus => "5",
            RequestClass::SlowestPlus => "10",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestClass::FastestPlus => "fast++",
            RequestClass::FastPlus => "fast+",
            RequestClass::Fast => "fast",
            RequestClass::Ok => "ok",
            RequestClass::Slow => "slow",
            RequestClass::SlowPlus => "slow+",
            RequestClass::SlowestPlus => "slow++",
        }
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SLO of the form "99% of requests complete under 1s".
///
/// `total` is a rate of all requests and `observation` the rate of the
/// histogram bucket for the class boundary (`{{ le }}`); both are
/// parameterised by `{{ window }}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LatencySlo {
    #[serde(flatten)]
    pub base: BaseSlo,
    #[serde(alias = "requestClass")]
    pub request_class: RequestClass,
    pub total: String,
    pub observation: String,
}

impl Slo for LatencySlo {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn template(&self) -> &'static str {
        Self::NAME
    }

    fn rules(&self) -> Result<Vec<Rule>, TemplateError> {
        let mut rules = self.base.rules(
            Self::NAME,
            params([
                ("request_class", self.request_class.as_str()),
                ("total", self.total.as_str()),
                ("observation", self.observation.as_str()),
            ]),
        );

        let series_labels = self.base.join_labels(Labels::from([(
            "request_class".to_string(),
            self.request_class.to_string(),
        )]));

        rules.extend(expand_over_windows(
            ALERT_WINDOWS,
            &Rule::recording(
                "job:slo_latency_total:rate{{ window }}",
                series_labels.clone(),
                self.total.trim(),
            ),
        )?);
        rules.extend(expand_over_windows_with(
            ALERT_WINDOWS,
            &Rule::recording(
                "job:slo_latency_observation:rate{{ window }}",
                series_labels,
                self.observation.trim(),
            ),
            &[(BUCKET_PLACEHOLDER, self.request_class.bucket())],
        )?);

        Ok(rules)
    }

    fn validate(&self) -> Result<(), String> {
        self.base.validate()?;
        let window = &[WINDOW_PLACEHOLDER];
        validate_field("total", &self.total, window, window)?;
        // Without `le` the request class would not reach the expression.
        let observation = &[WINDOW_PLACEHOLDER, BUCKET_PLACEHOLDER];
        validate_field("observation", &self.observation, observation, observation)
    }
}

impl Template for LatencySlo {
    const NAME: &'static str = "LatencySLO";

    fn translation_rules() -> Result<Vec<Rule>, TemplateError> {
        // Requests slower than the boundary, as a share of all requests.
        expand_over_windows(
            ALERT_WINDOWS,
            &Rule::recording(
                "job:slo_error:ratio{{ window }}",
                Labels::new(),
                "(job:slo_latency_total:rate{{ window }} - job:slo_latency_observation:rate{{ window }}) / job:slo_latency_total:rate{{ window }}",
            ),
        )
    }
}
