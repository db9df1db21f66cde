use hybrid_domain::entities::allocation::AllocationPlan;
use hybrid_domain::entities::screening::Screening;
use hybrid_domain::errors::CoreError;
use hybrid_domain::repositories::prices::PriceTableRepository;
use hybrid_domain::services::lot_sizer::{self, LotPolicy};
use hybrid_domain::services::optimizer::{optimize, OptimizerPolicy};
use hybrid_domain::services::screener::{screen, ScreenPolicy};
use hybrid_domain::value_objects::period::Period;
use serde::Serialize;
use std::time::Instant;
use tracing::info_span;

#[derive(Debug, Clone, Default)]
pub struct PlanPolicies {
    pub screen: ScreenPolicy,
    pub optimizer: OptimizerPolicy,
    pub lots: LotPolicy,
}

/// Plan plus the screening that fed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    pub plan: AllocationPlan,
    pub screening: Screening,
    pub window: String,
    pub return_rows: usize,
}

pub fn build_plan(
    amount: f64,
    prices: &dyn PriceTableRepository,
    universe: &[String],
    window: &Period,
    policies: &PlanPolicies,
) -> Result<AllocationPlan, CoreError> {
    build_plan_detailed(amount, prices, universe, window, policies).map(|report| report.plan)
}

pub fn build_plan_detailed(
    amount: f64,
    prices: &dyn PriceTableRepository,
    universe: &[String],
    window: &Period,
    policies: &PlanPolicies,
) -> Result<PlanReport, CoreError> {
    let _span = info_span!(
        "app.build_plan",
        amount = amount,
        universe = universe.len(),
        window = %window
    )
    .entered();
    metrics::counter!("hybrid.app.allocation.calls_total").increment(1);

    if !amount.is_finite() || amount <= 0.0 {
        return Err(CoreError::invalid(format!(
            "investment amount must be finite and > 0, got {amount}"
        )));
    }

    let stage_start = Instant::now();
    let table = prices.price_table(universe, window).map_err(|err| {
        tracing::warn!(error = %err, "price table unavailable");
        CoreError::insufficient(format!("price data unavailable: {err}"), universe.len(), 0)
    })?;
    metrics::histogram!("hybrid.app.allocation.load_prices_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    if table.is_empty() {
        return Err(CoreError::insufficient(
            "universe price table is empty",
            policies.screen.select,
            0,
        ));
    }

    let returns = table.daily_returns();
    let screening = screen(&returns, &policies.screen)?;
    if !screening.dropped.is_empty() {
        tracing::info!(
            dropped = ?screening.dropped,
            "instruments without a computable risk-adjusted score"
        );
    }
    let selected = screening.symbols();

    let stage_start = Instant::now();
    let allocation = optimize(&returns.select(&selected)?, &policies.optimizer)?;
    metrics::histogram!("hybrid.app.allocation.optimize_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    if !allocation.status.is_optimized() {
        metrics::counter!("hybrid.app.allocation.fallback_total").increment(1);
        tracing::warn!(status = ?allocation.status, "optimizer fell back to equal weights");
    }

    let latest = table.latest_prices(&selected).ok_or_else(|| {
        CoreError::insufficient("a date on which every selected instrument traded", 1, 0)
    })?;
    let plan = lot_sizer::build_plan(amount, &allocation, &latest, &policies.lots)?;
    metrics::gauge!("hybrid.app.allocation.residual").set(plan.residual);
    tracing::info!(
        selected = ?selected,
        total_executed = plan.total_executed,
        residual = plan.residual,
        optimized = plan.is_optimized(),
        "allocation plan ready"
    );

    Ok(PlanReport {
        plan,
        screening,
        window: window.to_string(),
        return_rows: returns.rows(),
    })
}
