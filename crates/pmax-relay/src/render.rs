//! Plain-text report bodies for the notification channel.

use pmax_core::BudgetAction;
use pmax_engine::{
    Alert, GapAnalysis, ReplacementStatus, ReviewOutput, VerificationReport, VerificationStatus,
};

fn money(value: rust_decimal::Decimal) -> String {
    format!("${}", value.round_dp(2))
}

/// Weekly review report: season header, asset counts, flags, budgets, alerts.
#[must_use]
pub fn render_review(output: &ReviewOutput) -> String {
    let s = &output.summary;
    let mut lines = vec![
        format!("*Weekly PMax Review: {}*", s.label),
        format!(
            "Window {} to {} ({} days)",
            output.window.start(),
            output.window.end,
            output.window.days
        ),
        format!(
            "Assets: {} reviewed, {} keep, {} flagged text, {} flagged image, {} monitored",
            s.records, s.kept, s.flagged_text, s.flagged_image, s.monitored
        ),
    ];

    if s.preview {
        lines.push("PREVIEW: nothing was written, generated, or queued.".to_string());
    }

    if !output.flagged.is_empty() {
        lines.push(String::new());
        lines.push("*Flagged*".to_string());
        for flag in &output.flagged {
            let label = flag
                .record
                .asset_text
                .as_deref()
                .unwrap_or(flag.record.identity.as_str());
            let mut line = format!(
                "- [{}] {} \"{}\": {} ({})",
                flag.record.campaign_name, flag.record.asset_type, label, flag.reason, flag.diagnosis
            );
            if let Some(copy) = &flag.replacement {
                line.push_str(&format!(" -> \"{}\"", copy.text));
            } else if flag.replacement_unavailable {
                line.push_str(" -> replacement unavailable");
            }
            lines.push(line);
            if let Some(note) = flag.manual_note() {
                lines.push(format!("  {note}"));
            }
        }
    }

    if !output.budgets.is_empty() {
        lines.push(String::new());
        lines.push("*Budget*".to_string());
        for b in &output.budgets {
            let roas = b
                .roas
                .map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}x"));
            let change = if b.action == BudgetAction::Hold {
                money(b.current_daily_budget)
            } else {
                format!(
                    "{} -> {}",
                    money(b.current_daily_budget),
                    money(b.recommended_daily_budget)
                )
            };
            lines.push(format!(
                "- {}: {} (ROAS {} vs target {:.2}x, daily {}). {}",
                b.campaign_name, b.action, roas, b.target_roas, change, b.reason
            ));
        }
    }

    if !output.alerts.is_empty() {
        lines.push(String::new());
        lines.push(format!("*Alerts ({})*", output.alerts.len()));
        for alert in &output.alerts {
            lines.push(format!("- [{}] {}", alert.severity, alert.title));
        }
    }

    if !s.validation_issues.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "{} input row(s) skipped by validation.",
            s.validation_issues.len()
        ));
    }

    if s.generation_degraded {
        let detail = s
            .generation_error
            .as_deref()
            .unwrap_or("partial response");
        lines.push(format!(
            "Replacement copy degraded: {} asset(s) without copy ({detail}).",
            s.replacements_unavailable
        ));
    }

    lines.join("\n")
}

/// One alert as a standalone message.
#[must_use]
pub fn render_alert(alert: &Alert) -> String {
    let mut lines = vec![
        format!("[{}] {}", alert.severity, alert.title),
        alert.message.clone(),
    ];
    if !alert.actions.is_empty() {
        lines.push("Actions:".to_string());
        lines.extend(alert.actions.iter().map(|a| format!("- {a}")));
    }
    lines.join("\n")
}

/// Image mix report for one campaign.
#[must_use]
pub fn render_gaps(analysis: &GapAnalysis) -> String {
    let mut lines = vec![format!(
        "*Image mix: {}* ({} profile, {} live images)",
        analysis.campaign_name, analysis.profile, analysis.total_images
    )];
    for gap in &analysis.composition {
        lines.push(format!(
            "- {}: {} ({:.1}% vs {:.1}% target, {:?})",
            gap.category.label(),
            gap.count,
            gap.actual_pct,
            gap.target_pct,
            gap.status
        ));
    }

    let mut any = false;
    for gap in analysis.recommendations() {
        if !any {
            lines.push(String::new());
            lines.push("*Upload suggestions*".to_string());
            any = true;
        }
        lines.push(format!(
            "- {}: add {} image(s), {:.1} pp under target",
            gap.category.label(),
            gap.suggested_uploads,
            gap.deficit
        ));
        for candidate in analysis.candidates.get(&gap.category).into_iter().flatten() {
            let description = candidate.description.as_deref().unwrap_or("no description");
            lines.push(format!("  - {} ({description})", candidate.image_id));
        }
    }
    if !any {
        lines.push("Image mix is within tolerance.".to_string());
    }
    lines.join("\n")
}

/// Upload verification summary.
#[must_use]
pub fn render_verification(report: &VerificationReport) -> String {
    let mut lines = vec![
        "*Upload verification*".to_string(),
        format!(
            "{} verified, {} not uploaded; replacements: {} added, {} edited, {} missing",
            report.count(VerificationStatus::Verified),
            report.count(VerificationStatus::NotUploaded),
            report.replacement_count(ReplacementStatus::Added),
            report.replacement_count(ReplacementStatus::Edited),
            report.replacement_count(ReplacementStatus::Missing),
        ),
    ];
    for outcome in report.outcomes.iter().filter(|o| {
        o.status == VerificationStatus::NotUploaded
            || o.replacement == Some(ReplacementStatus::Missing)
    }) {
        let replacement = match outcome.replacement {
            Some(ReplacementStatus::Missing) => ", replacement not live",
            _ => "",
        };
        lines.push(format!(
            "- [{}] {} flagged {}: {}{replacement}",
            outcome.campaign_name, outcome.identity, outcome.window_end, outcome.status
        ));
    }
    if report.all_applied() {
        lines.push("All recommendations applied.".to_string());
    }
    lines.join("\n")
}
