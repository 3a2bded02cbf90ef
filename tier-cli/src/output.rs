//! Output Formatting
//!
//! JSON for scripts, aligned text tables for people.

use serde::Serialize;

use tier_core::{HibernationResult, RestoreTierInfo, Suggestion};
use tier_storage::{BulkReport, UploadRepairReport};

use crate::commands::OutputFormat;
use crate::handler::CostReport;

/// Print as JSON
fn print_json<T: Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error formatting JSON: {}", e),
    }
}

/// Print heuristic results
pub fn print_suggestions(suggestions: &[Suggestion], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&suggestions),
        OutputFormat::Table => {
            println!("{:<32} {:>6} {:>9}  Message", "File", "Idle", "Hibernate");
            println!("{}", "-".repeat(80));
            for s in suggestions {
                println!(
                    "{:<32} {:>5}d {:>9}  {}",
                    s.file_id,
                    s.message.days_since_access,
                    if s.suggested { "yes" } else { "no" },
                    s.message.text
                );
            }
            let count = suggestions.iter().filter(|s| s.suggested).count();
            println!();
            println!("{} of {} files suggested", count, suggestions.len());
        }
    }
}

/// Print a cost breakdown
pub fn print_costs(report: &CostReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let b = &report.breakdown;
            let code = b.currency.code();
            println!("Monthly Storage Cost ({})", code);
            println!("=========================");
            println!(
                "{:<14} {:>7} {:>12} {:>10} {:>12}",
                "Tier", "Files", "GiB", "Rate", "Cost"
            );
            for t in &b.tiers {
                println!(
                    "{:<14} {:>7} {:>12} {:>10} {:>12}",
                    t.tier.to_string(),
                    t.files,
                    t.size_gb,
                    t.rate_per_gb,
                    t.monthly_cost
                );
            }
            println!();
            println!("Subtotal:        {} {}", b.subtotal, code);
            println!("Tax ({}%):       {} {}", b.tax_rate, b.tax_amount, code);
            println!("Total:           {} {}", b.total, code);

            let s = &report.potential_savings;
            if s.eligible_files > 0 {
                println!();
                println!(
                    "Hibernating {} standard files ({} GiB) would save {} {} per month",
                    s.eligible_files, s.size_gb, s.monthly_savings, code
                );
            }
        }
    }
}

/// Print a restore tier
pub fn print_restore_tier(info: &RestoreTierInfo, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(info),
        OutputFormat::Table => {
            println!("Restore Tier: {}", info.tier);
            println!("Window:       {}", info.window_label());
            println!("Multiplier:   {}x", info.cost_multiplier);
            println!("              {}", info.description);
        }
    }
}

/// Print a batch hibernation result
pub fn print_hibernation(result: &HibernationResult, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(result),
        OutputFormat::Table => {
            let title = if result.dry_run {
                "Hibernation Plan (dry run)"
            } else {
                "Hibernation Result"
            };
            println!("{}", title);
            println!("{}", "=".repeat(title.len()));
            println!("Candidates:     {}", result.candidates_found);
            println!("Transitioned:   {}", result.files_transitioned);
            println!("Monthly saving: {}", result.total_monthly_savings);

            if !result.transitioned_files.is_empty() {
                println!();
                for f in &result.transitioned_files {
                    println!("  {:<32} {:>10} {:>12}", f.id, f.status.to_string(), f.savings);
                }
            }
            if result.has_failures() {
                println!();
                println!("Failures:");
                for f in &result.failures {
                    println!("  {}: {}", f.id, f.reason);
                }
            }
        }
    }
}

/// Print an upload repair report
pub fn print_upload_repair(report: &UploadRepairReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            println!("Stuck uploads: {}", report.found);
            if report.dry_run {
                println!("Dry run, nothing repaired");
                return;
            }
            println!("Repaired:      {}", report.repaired.len());
            for (id, reason) in &report.failures {
                println!("  {}: {}", id, reason);
            }
        }
    }
}

/// Print a bulk archive or restore report
pub fn print_bulk(report: &BulkReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            if let Some(tier) = report.restore_tier {
                println!("Restore tier: {}", tier);
            }
            println!("Requested:    {}", report.total_requested);
            println!("Started:      {}", report.started.len());
            for id in &report.started {
                println!("  {}", id);
            }
            if report.has_failures() {
                println!();
                println!("Failures:");
                for f in &report.failures {
                    println!("  {}: {}", f.id, f.reason);
                }
            }
        }
    }
}
