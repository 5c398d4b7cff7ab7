//! Report Module
//!
//! End-of-run summary for batch operations.

use crate::batch::BatchResult;
use console::style;
use std::time::Duration;

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

/// Percentage saved; negative when the output grew.
pub fn size_reduction(input_bytes: u64, output_bytes: u64) -> f64 {
    if input_bytes == 0 {
        0.0
    } else {
        (1.0 - output_bytes as f64 / input_bytes as f64) * 100.0
    }
}

pub fn print_summary_report(result: &BatchResult, duration: Duration, operation_name: &str) {
    let finished = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

    println!();
    println!("{}", style("━".repeat(60)).dim());
    println!(
        "📊 {} {}",
        style(format!("{} Summary", operation_name)).bold(),
        style(format!("({})", finished)).dim()
    );
    println!("{}", style("━".repeat(60)).dim());
    println!("  📁 Files:          {:>10}", result.total);
    println!("  ✅ Written:        {:>10}", style(result.succeeded).green());
    if result.planned > 0 {
        println!("  📝 Planned:        {:>10}", style(result.planned).cyan());
    }
    println!("  ⏭️  Skipped:        {:>10}", result.skipped);
    println!("  ❌ Failed:         {:>10}", style(result.failed).red());
    if result.planned == 0 {
        println!("  📈 Success Rate:   {:>9.1}%", result.success_rate());
    }
    if result.succeeded > 0 {
        println!("  💾 Input Size:     {:>10}", format_bytes(result.input_bytes));
        println!("  💾 Output Size:    {:>10}", format_bytes(result.output_bytes));
        println!(
            "  📉 Size Reduction: {:>9.1}%",
            size_reduction(result.input_bytes, result.output_bytes)
        );
    }
    println!("  ⏱️  Total Time:     {:>10}", format_duration(duration));
    println!("{}", style("━".repeat(60)).dim());

    if !result.errors.is_empty() {
        println!();
        println!("{}", style("❌ Errors encountered:").red().bold());
        for (path, error) in &result.errors {
            println!("   {} → {}", path.display(), error);
        }
    }
}
