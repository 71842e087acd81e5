use specguard_contracts::{ContractDiff, ContractStatus};
use specguard_graph::{
    percent, ClassificationReport, ClassificationVerdict, PruneSummary, Reason,
};
use specguard_guard::{CheckStatus, GuardReport, HealStatus};
use specguard_spec::ParsedUnit;

const TOP_N: usize = 10;

pub fn render_classification_md(report: &ClassificationReport) -> String {
    let s = &report.stats;
    let mut md = String::new();
    md.push_str("# Classification report\n\n");
    md.push_str(&format!(
        "- Generated: `{}` (unix ms)\n\n",
        report.generated_at_unix_ms
    ));

    md.push_str("## Summary\n\n");
    md.push_str("| category | count | share |\n");
    md.push_str("|---|---:|---:|\n");
    for (label, count, total) in [
        ("Total APIs", s.total_apis, s.total_apis),
        ("Required APIs", s.required_apis, s.total_apis),
        ("Candidate APIs", s.candidate_apis, s.total_apis),
        ("Total UI files", s.total_ui, s.total_ui),
        ("Required UI", s.required_ui, s.total_ui),
        ("Candidate UI", s.candidate_ui, s.total_ui),
    ] {
        md.push_str(&format!(
            "| {label} | `{count}` | `{}%` |\n",
            percent(count, total)
        ));
    }
    md.push('\n');

    md.push_str(&format!("## Required APIs ({})\n\n", s.required_apis));
    push_verdicts(&mut md, &report.required_apis, |v| {
        let kinds: Vec<&str> = v.reasons.iter().map(Reason::kind).collect();
        format!("Reasons: {}", kinds.join(", "))
    });

    md.push_str(&format!("## Candidate APIs for removal ({})\n\n", s.candidate_apis));
    push_verdicts(&mut md, &report.candidate_apis, candidate_detail);

    md.push_str(&format!("## Candidate UI for removal ({})\n\n", s.candidate_ui));
    push_verdicts(&mut md, &report.candidate_ui, candidate_detail);
    md
}

fn candidate_detail(verdict: &ClassificationVerdict) -> String {
    let detail = verdict.reasons.iter().find_map(|r| match r {
        Reason::NoReferences { detail } => Some(detail.as_str()),
        _ => None,
    });
    format!("Reason: {}", detail.unwrap_or("No references found"))
}

fn push_verdicts(
    md: &mut String,
    verdicts: &[ClassificationVerdict],
    detail: impl Fn(&ClassificationVerdict) -> String,
) {
    if verdicts.is_empty() {
        md.push_str("_none_\n\n");
        return;
    }
    if verdicts.len() > TOP_N {
        md.push_str(&format!("Top {TOP_N} of {}:\n\n", verdicts.len()));
    }
    for (i, verdict) in verdicts.iter().take(TOP_N).enumerate() {
        let title = verdict.route.as_deref().unwrap_or(&verdict.file);
        md.push_str(&format!("{}. **{}**\n", i + 1, title));
        md.push_str(&format!("   - File: `{}`\n", verdict.file));
        md.push_str(&format!("   - {}\n", detail(verdict)));
    }
    md.push('\n');
}

/// Plain-text stdout summary of a classification run.
pub fn render_classification_summary(report: &ClassificationReport) -> String {
    let s = &report.stats;
    [
        format!(
            "Required APIs: {} ({}%)",
            s.required_apis,
            percent(s.required_apis, s.total_apis)
        ),
        format!(
            "Candidate APIs: {} ({}%)",
            s.candidate_apis,
            percent(s.candidate_apis, s.total_apis)
        ),
        format!(
            "Required UI: {} ({}%)",
            s.required_ui,
            percent(s.required_ui, s.total_ui)
        ),
        format!(
            "Candidate UI: {} ({}%)",
            s.candidate_ui,
            percent(s.candidate_ui, s.total_ui)
        ),
    ]
    .join("\n")
}

pub fn render_final_summary(report: &GuardReport) -> String {
    let m = &report.metrics;
    let t = &report.thresholds;
    let mut md = String::new();
    md.push_str("# Guard summary\n\n");
    md.push_str(&format!(
        "- Decision: **{}**\n",
        if report.decision.passed { "PASS" } else { "FAIL" }
    ));
    md.push_str(&format!(
        "- Self-heal: `{}`\n\n",
        if report.heal_triggered { "triggered" } else { "not needed" }
    ));

    md.push_str("## Metrics\n\n");
    md.push_str("| metric | value | threshold |\n");
    md.push_str("|---|---:|---:|\n");
    md.push_str(&format!(
        "| success rate | `{}%` ({}/{}) | `{}%` |\n",
        m.success_rate, m.handled_units, m.total_units, t.success_rate
    ));
    md.push_str(&format!(
        "| mapping score | `{}%` ({}/{}) | `{}%` |\n\n",
        m.mapping_score, m.total_handled, m.total_detected, t.mapping_score
    ));

    if !m.per_unit_mapping.is_empty() {
        md.push_str("## Units\n\n");
        md.push_str("| unit | detected | handled | score |\n");
        md.push_str("|---|---:|---:|---:|\n");
        for (name, unit) in &m.per_unit_mapping {
            md.push_str(&format!(
                "| `{}` | `{}` | `{}` | `{}%` |\n",
                escape_cell(name),
                unit.detected,
                unit.handled,
                unit.score
            ));
        }
        md.push('\n');
    }

    md.push_str("## Phases\n\n");
    for record in &report.phases {
        md.push_str(&format!(
            "- `{}`: {} ({})\n",
            record.phase,
            record.status,
            truncate_one_line(&record.detail, 160)
        ));
    }
    md.push('\n');

    if let Some(heal) = &report.self_heal {
        md.push_str("## Self-heal\n\n");
        md.push_str(&format!(
            "- Failing: `{}`, retried: `{}`, healed: `{}`\n",
            heal.failed_count, heal.retried_count, heal.success_count
        ));
        for unit in &heal.units {
            let status = match unit.status {
                HealStatus::Healed => "healed",
                HealStatus::Failed => "failed",
                HealStatus::FileNotFound => "file not found",
            };
            md.push_str(&format!("- `{}`: {status} ({})\n", unit.name, unit.reason));
        }
        md.push('\n');
    }

    if let Some(verify) = &report.verify {
        md.push_str("## Verification\n\n");
        md.push_str(&format!(
            "- API files: `{}` (min {})\n- UI files: `{}` (min {})\n\n",
            verify.summary.api_files,
            verify.summary.min_api,
            verify.summary.ui_files,
            verify.summary.min_ui
        ));
    }

    if !report.checks.is_empty() {
        md.push_str("## Checks\n\n");
        md.push_str("| check | status |\n");
        md.push_str("|---|---|\n");
        for check in &report.checks {
            let status = match check.status {
                CheckStatus::Pass => check.status.to_string(),
                _ => format!("**{}**", check.status),
            };
            md.push_str(&format!("| {} | {status} |\n", escape_cell(&check.name)));
        }
        md.push('\n');
    }

    md.push_str("## Artifacts\n\n");
    for (path, present) in &report.artifacts {
        let mark = if *present { "present" } else { "MISSING" };
        md.push_str(&format!("- `{path}`: {mark}\n"));
    }
    for path in &report.regenerated_artifacts {
        md.push_str(&format!("- `{path}`: regenerated\n"));
    }
    md.push('\n');

    if !report.decision.reasons.is_empty() {
        md.push_str("## Blocking reasons\n\n");
        for reason in &report.decision.reasons {
            md.push_str(&format!("- {reason}\n"));
        }
        md.push('\n');
    }
    md
}

pub fn render_diff(diff: &ContractDiff) -> String {
    let mut out = format!(
        "Comparing contracts: unit {} -> unit {}\n",
        diff.old_version, diff.new_version
    );
    for (label, dim) in diff.dimensions() {
        out.push_str(&format!("\n## {label}\n"));
        if !dim.breaking.is_empty() {
            out.push_str("\nBREAKING CHANGES:\n");
            for change in &dim.breaking {
                out.push_str(&format!("  - {}\n", change.0));
            }
        }
        if !dim.additive.is_empty() {
            out.push_str("\nADDITIVE CHANGES:\n");
            for change in &dim.additive {
                out.push_str(&format!("  - {change}\n"));
            }
        }
        if !dim.removed.is_empty() {
            out.push_str("\nREMOVED:\n");
            for change in &dim.removed {
                out.push_str(&format!("  - {change}\n"));
            }
        }
        if !dim.unchanged.is_empty() {
            out.push_str(&format!("\nUNCHANGED: {} items\n", dim.unchanged.len()));
        }
    }

    if !diff.reconciliation_tasks.is_empty() {
        out.push_str("\n## RECONCILIATION TASKS\n");
        for (i, task) in diff.reconciliation_tasks.iter().enumerate() {
            out.push_str(&format!("{}. {task}\n", i + 1));
        }
    }

    out.push_str("\n## OVERALL STATUS\n");
    out.push_str(match diff.status {
        ContractStatus::Red => "RED: Breaking changes detected - reconciliation required",
        ContractStatus::Yellow => "YELLOW: Additive changes only - review recommended",
        ContractStatus::Green => "GREEN: No changes - proceed",
    });
    out
}

pub fn render_parsed_unit(unit: &ParsedUnit) -> String {
    let mut out = format!(
        "Pattern: {} ({} entries)\n",
        unit.pattern,
        unit.entries.len()
    );
    for entry in &unit.entries {
        let number = entry
            .number
            .as_deref()
            .map(|n| format!("[{n}] "))
            .unwrap_or_default();
        out.push_str(&format!(
            "  {number}{} {} -> {}\n",
            entry.method, entry.route, entry.path
        ));
    }
    for warning in &unit.warnings {
        out.push_str(&format!("Warning: {warning}\n"));
    }
    out.trim_end().to_string()
}

pub fn render_prune_summary(summary: &PruneSummary) -> String {
    let mut out = if summary.dry_run {
        format!(
            "Prune (dry run): {} candidates, {} on disk, {} already gone\n",
            summary.candidates,
            summary.existing.len(),
            summary.missing.len()
        )
    } else {
        format!(
            "Prune: removed {} of {} files, {} empty directories\n",
            summary.removed.len(),
            summary.existing.len(),
            summary.removed_dirs.len()
        )
    };
    if summary.dry_run {
        for file in &summary.existing {
            out.push_str(&format!("  would remove {file}\n"));
        }
        if !summary.existing.is_empty() {
            out.push_str("Re-run with --execute to delete them.\n");
        }
    }
    for file in &summary.rejected {
        out.push_str(&format!("Skipped: {file}\n"));
    }
    for failure in &summary.failed {
        out.push_str(&format!("Failed: {} ({})\n", failure.file, failure.error));
    }
    out.trim_end().to_string()
}

fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let s = text
        .replace(['\n', '\r', '\t'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if s.chars().count() <= max_chars {
        return s;
    }
    let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
