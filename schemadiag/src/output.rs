//! Plain-text rendering of scan reports and registry listings.

use schemadiag_core::{
    CheckRegistry, CheckStatus,
    report::{ReportEntry, ScanReport},
};
use std::fmt::Write;

/// Status badge shown in front of each entry.
fn badge(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "[PASS]",
        CheckStatus::Warning => "[WARN]",
        CheckStatus::Fail => "[FAIL]",
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Renders a categorized report: header, summary line, then one block per
/// category with status, message and explanation of every entry.
pub fn render_report(report: &ScanReport) -> String {
    let mut out = String::new();

    let target = match &report.database.server {
        Some(server) => format!("{} on {}", report.database.name, server),
        None => report.database.name.clone(),
    };
    let _ = writeln!(out, "Schema diagnostics for {target}");
    let _ = writeln!(
        out,
        "Scan {} at {}",
        report.scan_id,
        report.database.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let summary = &report.summary;
    let _ = writeln!(
        out,
        "Summary: {} passed, {}, {} failed ({} total, {} ms)",
        summary.pass,
        plural(summary.warn, "warning", "warnings"),
        summary.fail,
        summary.total(),
        summary.duration_ms
    );

    if report.categories.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "No checks were run.");
        return out;
    }

    for category in &report.categories {
        let _ = writeln!(out);
        if category.display_name == category.name {
            let _ = writeln!(out, "== {} ==", category.name);
        } else {
            let _ = writeln!(out, "== {} ({}) ==", category.name, category.display_name);
        }
        for entry in &category.checks {
            render_entry(&mut out, entry);
        }
    }

    out
}

fn render_entry(out: &mut String, entry: &ReportEntry) {
    let _ = writeln!(
        out,
        "{} #{} {} ({})",
        badge(entry.status),
        entry.id,
        entry.title,
        entry.code
    );
    let _ = writeln!(out, "    {}", entry.message);

    if let Some(explanation) = &entry.explanation {
        let _ = writeln!(out, "    What's wrong:    {}", explanation.whats_wrong);
        let _ = writeln!(out, "    Why it matters:  {}", explanation.why_it_matters);
        let _ = writeln!(out, "    What to do next: {}", explanation.what_to_do_next);
    }
}

/// One line per check: id, code, category and name.
pub fn render_checks(registry: &CheckRegistry) -> String {
    let mut out = String::new();
    for check in registry.all() {
        let info = check.info();
        let _ = writeln!(
            out,
            "{:>3}  {:<28} {:<24} {}",
            info.id, info.code, info.category, info.name
        );
    }
    out
}

/// One line per distinct category.
pub fn render_categories(registry: &CheckRegistry) -> String {
    let mut out = String::new();
    for category in registry.categories() {
        let _ = writeln!(out, "{category}");
    }
    out
}
