//! CLI output: plain-text summaries and error mapping.

use crate::publish::BatchReport;
use crate::record::AssetRecord;
use crate::verify::VerificationReport;
use std::fmt::Write;

/// Map errors to a string for CLI output, including the cause chain.
pub fn map_error(e: &anyhow::Error) -> String {
    format!("{:#}", e)
}

/// One line per item, then a totals line.
pub fn format_batch_report(report: &BatchReport) -> String {
    let mut out = String::new();
    for result in &report.results {
        match &result.outcome {
            Ok(published) => {
                let _ = writeln!(
                    out,
                    "[{}] {:<7} {} {} {}",
                    result.index,
                    published.action,
                    published.kind,
                    published.identity,
                    published.record_location.as_deref().unwrap_or("-"),
                );
            }
            Err(e) => {
                let _ = writeln!(out, "[{}] FAILED  {}", result.index, e);
            }
        }
    }
    let failed = report.failure_count();
    let _ = write!(
        out,
        "{} item(s): {} ok, {} failed",
        report.results.len(),
        report.results.len() - failed,
        failed
    );
    if report.aborted {
        out.push_str(" (aborted)");
    }
    out
}

pub fn format_verification(record: &AssetRecord, report: &VerificationReport) -> String {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    let mut out = String::new();
    let _ = writeln!(out, "Asset:             {}", record.content_binding.hash);
    let _ = writeln!(out, "Title:             {}", record.manifest.title);
    let _ = writeln!(out, "Published:         {}", record.manifest.published);
    let _ = writeln!(out, "History:           {} prior record(s)", record.manifest.history.len());
    let _ = writeln!(out, "Signature valid:   {}", yes_no(report.signature_verified));
    let _ = writeln!(out, "Content binding:   {}", yes_no(report.content_binding_verified));
    let _ = writeln!(out, "Signer:            {}", report.signer.as_deref().unwrap_or("-"));
    let _ = write!(out, "Root identity:     {}", report.root_identity.as_deref().unwrap_or("-"));
    out
}
