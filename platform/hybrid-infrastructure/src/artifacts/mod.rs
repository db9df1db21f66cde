use hybrid_domain::entities::allocation::AllocationPlan;
use hybrid_domain::repositories::artifacts::ArtifactWriter;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactWriter;

impl FilesystemArtifactWriter {
    pub fn new() -> Self {
        Self
    }
}

pub fn write_plan_csv(path: &Path, plan: &AllocationPlan) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create plan csv {}: {}", path.display(), err))?;
    wtr.write_record([
        "symbol",
        "price",
        "weight_pct",
        "allocated_amount",
        "lots",
        "executed_value",
    ])
    .map_err(|err| format!("failed to write plan csv header: {}", err))?;

    for entry in &plan.entries {
        wtr.write_record([
            entry.symbol.clone(),
            entry.price.to_string(),
            format!("{:.2}", entry.weight * 100.0),
            format!("{:.2}", entry.allocated_amount),
            entry.lots.to_string(),
            format!("{:.2}", entry.executed_value),
        ])
        .map_err(|err| format!("failed to write plan row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush plan csv: {}", err))
}

impl ArtifactWriter for FilesystemArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String> {
        fs::create_dir_all(path)
            .map_err(|err| format!("failed to create dir {}: {}", path.display(), err))
    }

    fn write_plan_csv(&self, path: &Path, plan: &AllocationPlan) -> Result<(), String> {
        write_plan_csv(path, plan)?;
        metrics::counter!("hybrid.infra.artifacts.written_total", "kind" => "csv").increment(1);
        Ok(())
    }

    fn write_json(&self, path: &Path, value: &serde_json::Value) -> Result<(), String> {
        let body = serde_json::to_string_pretty(value)
            .map_err(|err| format!("failed to encode {}: {}", path.display(), err))?;
        fs::write(path, body)
            .map_err(|err| format!("failed to write {}: {}", path.display(), err))?;
        metrics::counter!("hybrid.infra.artifacts.written_total", "kind" => "json").increment(1);
        Ok(())
    }
}
