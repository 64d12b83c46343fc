//! Tabular export of the payout report.

use credline_core::PayoutReport;

/// Quote a CSV field when it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render the payout report as CSV: one row per creator, a trailing
/// grand-total row.
pub fn payout_csv(report: &PayoutReport) -> String {
    let mut csv = String::from(
        "creator_name,creator_email,submission_count,creation_credit_total,report_credit_total,total_credit\n",
    );

    for item in &report.items {
        csv.push_str(&format!(
            "{},{},{},{:.2},{:.2},{:.2}\n",
            csv_field(&item.creator_name),
            csv_field(&item.creator_email),
            item.submission_count,
            item.creation_credit_total,
            item.report_credit_total,
            item.total_credit,
        ));
    }

    csv.push_str(&format!("TOTAL,,,,,{:.2}\n", report.grand_total));
    csv
}
