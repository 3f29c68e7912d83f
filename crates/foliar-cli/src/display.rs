//! Human-readable card output for diagnosis reports.

use foliar_core::DiagnosisReport;

const RULE: &str = "────────────────────────────────────────";

/// Render a report as a card on stdout.
pub fn print_report(report: &DiagnosisReport) {
    println!("{RULE}");
    match report.status.as_str() {
        "success" => {
            println!("Diagnosis: {}", report.predicted_label);
            println!("Confidence: {:.2}%", report.confidence * 100.0);
            println!("{RULE}");
            field("Cause", &report.cause);
            field("Treatment", &report.treatment);
            field("Prevention", &report.prevention);
        }
        "rejected" => {
            println!("Not diagnosed: {}", report.predicted_label);
            println!("Confidence: {:.2}%", report.confidence * 100.0);
            println!("{RULE}");
            field("Reason", &report.cause);
            field("Try", &report.treatment);
            field("Tip", &report.prevention);
        }
        _ => {
            println!("Diagnosis failed");
            println!("{RULE}");
            field("Error", &report.cause);
            field("Try", &report.treatment);
        }
    }
    println!("{RULE}");
}

fn field(name: &str, value: &str) {
    println!("{name:>10}: {value}");
}
