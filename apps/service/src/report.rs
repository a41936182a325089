use std::fmt::Write as _;

use clap::ValueEnum;
use probe_engine::ProbeResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

pub fn render(results: &[ProbeResult], format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(render_text(results)),
        ReportFormat::Json => serde_json::to_string_pretty(results),
    }
}

fn render_text(results: &[ProbeResult]) -> String {
    let mut out = String::new();

    for result in results {
        // writing into a String cannot fail
        let _ = writeln!(out, "{result}");

        if let Some(request) = result.request() {
            let _ = writeln!(out, "  {} {}", request.method, request.url);
        }
        if let Some(response) = result.response() {
            let _ = writeln!(out, "  status {} in {} ms", response.status, response.elapsed.as_millis());
        }
        if let Some(message) = result.message() {
            let _ = writeln!(out, "  aborted: {message}");
        }

        for check in result.checks() {
            let mark = if check.success() { "ok" } else { "FAIL" };
            let _ = writeln!(out, "  [{mark:>4}] {}: {}", check.checker(), check.message());
        }
    }

    let failed = results.iter().filter(|result| !result.success()).count();
    let _ = writeln!(out, "{} probe(s), {} failed", results.len(), failed);
    out
}
