use crate::allocation::PlanReport;
use crate::recommendation::Recommendation;
use hybrid_domain::repositories::artifacts::ArtifactWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info_span;

/// JSON body shared by `plan.json` and stdout.
pub fn plan_json(report: &PlanReport) -> serde_json::Value {
    let plan = &report.plan;
    serde_json::json!({
        "budget": plan.budget,
        "unit_size": plan.unit_size,
        "window": report.window,
        "return_rows": report.return_rows,
        "status": plan.status,
        "entries": plan.entries.iter().map(|e| serde_json::json!({
            "symbol": e.symbol,
            "price": e.price,
            "weight_pct": e.weight * 100.0,
            "allocated_amount": e.allocated_amount,
            "lots": e.lots,
            "executed_value": e.executed_value,
        })).collect::<Vec<_>>(),
        "total_executed": plan.total_executed,
        "residual": plan.residual,
        "screening": report.screening,
    })
}

pub fn write_plan_artifacts(
    report: &PlanReport,
    out_dir: &Path,
    writer: &dyn ArtifactWriter,
) -> Result<Vec<PathBuf>, String> {
    let _span = info_span!("app.write_plan", out_dir = %out_dir.display()).entered();
    let start = Instant::now();

    writer.ensure_dir(out_dir)?;
    let csv_path = out_dir.join("plan.csv");
    let json_path = out_dir.join("plan.json");
    writer.write_plan_csv(&csv_path, &report.plan)?;
    writer.write_json(&json_path, &plan_json(report))?;

    metrics::histogram!("hybrid.app.artifacts.write_ms", "artifact" => "plan")
        .record(start.elapsed().as_millis() as f64);
    Ok(vec![csv_path, json_path])
}

pub fn write_signal_artifact(
    recommendation: &Recommendation,
    out_dir: &Path,
    writer: &dyn ArtifactWriter,
) -> Result<PathBuf, String> {
    writer.ensure_dir(out_dir)?;
    let path = out_dir.join("signal.json");
    writer.write_json(&path, &recommendation.summary_json())?;
    Ok(path)
}
