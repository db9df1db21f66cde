use crate::entities::allocation::AllocationPlan;
use std::path::Path;

pub trait ArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String>;
    fn write_plan_csv(&self, path: &Path, plan: &AllocationPlan) -> Result<(), String>;
    fn write_json(&self, path: &Path, value: &serde_json::Value) -> Result<(), String>;
}
