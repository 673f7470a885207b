use crate::errors::CoreError;
use crate::models::report::PerformanceReport;

/// Serialize a report as CSV: one `date` column followed by every absolute
/// and then every relative series, one row per grid day.
///
/// Column names have spaces replaced by underscores; values are rounded to
/// two decimals.
pub fn report_to_csv(report: &PerformanceReport) -> Result<String, CoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let series: Vec<_> = report.absolutes.iter().chain(report.relatives.iter()).collect();
    let mut header = vec!["date".to_string()];
    header.extend(
        report
            .absolutes
            .names()
            .into_iter()
            .chain(report.relatives.names())
            .map(|name| name.replace(' ', "_")),
    );
    writer.write_record(&header).map_err(csv_error)?;

    for (index, date) in report.grid.dates().iter().enumerate() {
        let mut row = vec![date.to_string()];
        row.extend(series.iter().map(|s| {
            s.values
                .get(index)
                .map(|v| format!("{v:.2}"))
                .unwrap_or_default()
        }));
        writer.write_record(&row).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Serialization(format!("Failed to flush CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Write the CSV export to a file (native only, not WASM).
#[cfg(not(target_arch = "wasm32"))]
pub fn write_report_csv(
    report: &PerformanceReport,
    path: impl AsRef<std::path::Path>,
) -> Result<(), CoreError> {
    let csv = report_to_csv(report)?;
    std::fs::write(path, csv)?;
    Ok(())
}

/// Serialize a report (grid, series and diagnostics) as pretty JSON.
pub fn report_to_json(report: &PerformanceReport) -> Result<String, CoreError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize report: {e}")))
}

fn csv_error(e: csv::Error) -> CoreError {
    CoreError::Serialization(format!("Failed to write CSV: {e}"))
}
