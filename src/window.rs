//! Alert window expansion.
//!
//! Rule names and expressions carry minijinja placeholders (`{{ window }}`,
//! and `{{ le }}` for latency buckets). Expansion renders one concrete rule
//! per window, preserving window order so generated files diff cleanly.

use crate::error::TemplateError;
use crate::rule::Rule;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Common interval windows every SLO precomputes `job:slo_error:ratio<window>` for.
pub const ALERT_WINDOWS: &[&str] = &["1m", "5m", "30m", "1h", "2h", "6h", "1d", "3d", "7d", "28d"];

/// Placeholder for the alert window.
pub const WINDOW_PLACEHOLDER: &str = "window";

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    // Unknown placeholders must fail instead of rendering as empty strings.
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env
}

/// Render a single expression template with the given context.
///
/// # Errors
/// Returns [`TemplateError::Render`] if the source is malformed or references
/// a placeholder missing from `context`.
pub fn render_expression<S: Serialize>(source: &str, context: S) -> Result<String, TemplateError> {
    environment()
        .render_str(source, context)
        .map_err(|e| TemplateError::Render {
            source_text: source.to_string(),
            message: e.to_string(),
        })
}

/// Check that `source` parses and only references placeholders in `allowed`.
///
/// Used at definition parse time so rule generation never meets a broken
/// expression later on.
pub fn validate_expression(source: &str, allowed: &[&str]) -> Result<(), String> {
    let env = environment();
    let template = env.template_from_str(source).map_err(|e| e.to_string())?;

    let mut unknown: Vec<String> = template
        .undeclared_variables(false)
        .into_iter()
        .filter(|name| !allowed.contains(&name.as_str()))
        .collect();
    unknown.sort();

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "unknown placeholder(s): {}",
            unknown
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }
}

/// Check that `source` references every placeholder in `required`.
///
/// A per-window expression without `{{ window }}` would render the same
/// expression for every window.
pub fn validate_required(source: &str, required: &[&str]) -> Result<(), String> {
    let env = environment();
    let template = env.template_from_str(source).map_err(|e| e.to_string())?;
    let declared = template.undeclared_variables(false);

    let missing: Vec<String> = required
        .iter()
        .filter(|name| !declared.contains(**name))
        .map(|name| format!("'{{{{ {} }}}}'", name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("missing required placeholder(s): {}", missing.join(", ")))
    }
}

/// Expand `rule` into one rule per window.
///
/// The window is rendered into both the rule name and its expression;
/// labels are copied unchanged, so callers merge instance labels first.
///
/// # Errors
/// Returns [`TemplateError::DuplicateWindow`] if a window repeats, or
/// [`TemplateError::Render`] if a placeholder cannot be rendered.
pub fn expand_over_windows(windows: &[&str], rule: &Rule) -> Result<Vec<Rule>, TemplateError> {
    expand_over_windows_with(windows, rule, &[])
}

/// Like [`expand_over_windows`], with extra placeholders available to the
/// rule (e.g. `le` for latency buckets). `window` always wins over `extra`.
pub fn expand_over_windows_with(
    windows: &[&str],
    rule: &Rule,
    extra: &[(&str, &str)],
) -> Result<Vec<Rule>, TemplateError> {
    let mut seen = HashSet::with_capacity(windows.len());
    let mut rules = Vec::with_capacity(windows.len());

    for window in windows {
        if !seen.insert(*window) {
            return Err(TemplateError::DuplicateWindow {
                window: window.to_string(),
            });
        }

        let mut ctx: BTreeMap<&str, &str> = extra.iter().copied().collect();
        ctx.insert(WINDOW_PLACEHOLDER, *window);

        let expanded = match rule {
            Rule::Recording { record, labels, expr } => Rule::Recording {
                record: render_expression(record, &ctx)?,
                labels: labels.clone(),
                expr: render_expression(expr, &ctx)?,
            },
            Rule::Alerting {
                alert,
                for_duration,
                labels,
                expr,
            } => Rule::Alerting {
                alert: render_expression(alert, &ctx)?,
                for_duration: *for_duration,
                labels: labels.clone(),
                expr: render_expression(expr, &ctx)?,
            },
        };
        rules.push(expanded);
    }

    tracing::trace!(
        rule = %rule.name(),
        windows = windows.len(),
        "Expanded rule over windows"
    );

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Labels, labels};

    #[test]
    fn expands_two_windows_in_order() {
        let rule = Rule::recording(
            "job:slo_error:ratio{{ window }}",
            labels([("name", "api")]),
            "avg_over_time(job:slo_batch_error:interval[{{ window }}])",
        );

        let rules = expand_over_windows(&["1m", "5m"], &rule).unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name(), "job:slo_error:ratio1m");
        assert_eq!(rules[0].expr(), "avg_over_time(job:slo_batch_error:interval[1m])");
        assert_eq!(rules[1].name(), "job:slo_error:ratio5m");
        assert_eq!(rules[1].expr(), "avg_over_time(job:slo_batch_error:interval[5m])");
        assert_eq!(rules[0].labels(), rule.labels());
        assert_eq!(rules[1].labels(), rule.labels());
    }

    #[test]
    fn expression_without_placeholder_is_copied() {
        let rule = Rule::recording("job:x:rate{{ window }}", Labels::new(), "sum(rate(x[5m]))");
        let rules = expand_over_windows(&["1h", "6h"], &rule).unwrap();
        assert!(rules.iter().all(|r| r.expr() == "sum(rate(x[5m]))"));
    }

    #[test]
    fn promql_label_matchers_pass_through() {
        let rule = Rule::recording(
            "r{{ window }}",
            Labels::new(),
            r#"sum(rate(http_requests_total{code=~"5.."}[{{ window }}]))"#,
        );
        let rules = expand_over_windows(&["30m"], &rule).unwrap();
        assert_eq!(
            rules[0].expr(),
            r#"sum(rate(http_requests_total{code=~"5.."}[30m]))"#
        );
    }

    #[test]
    fn duplicate_window_is_rejected() {
        let rule = Rule::recording("r{{ window }}", Labels::new(), "1");
        let err = expand_over_windows(&["1m", "1m"], &rule).unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateWindow { window } if window == "1m"));
    }

    #[test]
    fn unknown_placeholder_fails_to_render() {
        let rule = Rule::recording("r", Labels::new(), "{{ nope }}");
        let err = expand_over_windows(&["1m"], &rule).unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }));
    }

    #[test]
    fn empty_window_list_yields_no_rules() {
        let rule = Rule::recording("r{{ window }}", Labels::new(), "1");
        assert!(expand_over_windows(&[], &rule).unwrap().is_empty());
    }

    #[test]
    fn extra_placeholders_are_rendered_alongside_window() {
        let rule = Rule::recording(
            "r{{ window }}",
            Labels::new(),
            r#"rate(x_bucket{le="{{ le }}"}[{{ window }}])"#,
        );
        let rules =
            expand_over_windows_with(&["1d"], &rule, &[("le", "2.5")]).unwrap();
        assert_eq!(rules[0].expr(), r#"rate(x_bucket{le="2.5"}[1d])"#);
    }

    #[test]
    fn alerting_rules_keep_for_duration() {
        let rule = Rule::alerting(
            "Burn{{ window }}",
            std::time::Duration::from_secs(60),
            Labels::new(),
            "job:slo_error:ratio{{ window }} > 0",
        );
        let rules = expand_over_windows(&["1h"], &rule).unwrap();
        assert_eq!(
            rules[0],
            Rule::alerting(
                "Burn1h",
                std::time::Duration::from_secs(60),
                Labels::new(),
                "job:slo_error:ratio1h > 0"
            )
        );
    }

    #[test]
    fn alert_windows_are_unique() {
        let unique: HashSet<_> = ALERT_WINDOWS.iter().collect();
        assert_eq!(unique.len(), ALERT_WINDOWS.len());
    }

    #[test]
    fn validate_expression_accepts_allowed_placeholders() {
        assert!(validate_expression("rate(x[{{ window }}])", &["window"]).is_ok());
        assert!(validate_expression("sum(x)", &[]).is_ok());
    }

    #[test]
    fn validate_expression_rejects_unknown_placeholder() {
        let err = validate_expression("rate(x[{{ windw }}])", &["window"]).unwrap_err();
        assert!(err.contains("'windw'"), "{}", err);
    }

    #[test]
    fn validate_expression_rejects_malformed_template() {
        assert!(validate_expression("rate(x[{{ window ])", &["window"]).is_err());
    }

    #[test]
    fn validate_required_accepts_present_placeholders() {
        let source = r#"rate(x_bucket{le="{{ le }}"}[{{ window }}])"#;
        assert!(validate_required(source, &["window", "le"]).is_ok());
        assert!(validate_required("sum(x)", &[]).is_ok());
    }

    #[test]
    fn validate_required_rejects_missing_placeholder() {
        let err = validate_required("sum(rate(x[5m]))", &["window"]).unwrap_err();
        assert_eq!(err, "missing required placeholder(s): '{{ window }}'");

        let err = validate_required("sum(rate(x[%s]))", &["window"]).unwrap_err();
        assert!(err.contains("window"), "{}", err);
    }
}
