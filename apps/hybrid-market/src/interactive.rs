use crate::headless::{
    build_forecast_repo, build_headline_repo, build_price_store, plan_policies,
    recommend_policies, resolve_target, SignalTarget,
};
use crate::CommandError;
use chrono::Utc;
use hybrid_application::cache::{CachedPlanner, CachedRecommender};
use hybrid_application::config::Config;
use hybrid_application::reporting::plan_json;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Signal {
        ticker: String,
        keyword: Option<String>,
    },
    Asset(String),
    Plan(f64),
    Refresh,
    Help,
    Quit,
}

pub const HELP: &str = "commands: signal <TICKER> [keyword..] | asset <NAME> | plan <AMOUNT> | refresh | help | quit";

pub fn parse_line(line: &str) -> Result<Option<SessionCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let command = match head.to_lowercase().as_str() {
        "signal" => {
            let (ticker, keyword) = rest
                .split_first()
                .ok_or_else(|| "usage: signal <TICKER> [keyword..]".to_string())?;
            SessionCommand::Signal {
                ticker: ticker.to_string(),
                keyword: (!keyword.is_empty()).then(|| keyword.join(" ")),
            }
        }
        "asset" => {
            let name = rest
                .first()
                .ok_or_else(|| "usage: asset <NAME>".to_string())?;
            SessionCommand::Asset(name.to_string())
        }
        "plan" => {
            let raw = rest
                .first()
                .ok_or_else(|| "usage: plan <AMOUNT>".to_string())?;
            let amount = parse_amount(raw)?;
            SessionCommand::Plan(amount)
        }
        "refresh" => SessionCommand::Refresh,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        other => return Err(format!("unknown command {other}; {HELP}")),
    };
    Ok(Some(command))
}

/// Accepts `10000000`, `10_000_000` and `10,000,000`.
fn parse_amount(raw: &str) -> Result<f64, String> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '_' | ',')).collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| format!("invalid amount: {raw}"))
}

/// Line-oriented session over cached use cases. Every reply is one JSON line.
pub fn run_session<R: BufRead, W: Write>(
    config: &Config,
    input: R,
    mut output: W,
) -> Result<(), CommandError> {
    let forecasts = build_forecast_repo(config)?;
    let headlines = build_headline_repo(config);
    let prices = build_price_store(config);
    let mut recommender = CachedRecommender::new(
        &forecasts,
        headlines.as_ref(),
        recommend_policies(config),
        config.cache_ttl(),
    );
    let mut planner = CachedPlanner::new(
        &prices,
        config.universe_symbols(),
        config.universe.window.clone(),
        plan_policies(config),
        config.cache_ttl(),
    );
    tracing::info!(ttl_secs = config.cache.ttl_secs, "interactive session started");

    for line in input.lines() {
        let line = line.map_err(|err| format!("failed to read input: {err}"))?;
        let reply = match parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(SessionCommand::Quit)) => break,
            Ok(Some(SessionCommand::Help)) => serde_json::json!({"status": "ok", "help": HELP}),
            Ok(Some(SessionCommand::Refresh)) => {
                recommender.clear();
                planner.clear();
                serde_json::json!({"status": "ok", "mode": "refresh"})
            }
            Ok(Some(SessionCommand::Plan(amount))) => match planner.plan(amount) {
                Ok(report) => serde_json::json!({
                    "status": "ok",
                    "mode": "plan",
                    "plan": plan_json(&report),
                }),
                Err(err) => error_reply(&err.to_string()),
            },
            Ok(Some(SessionCommand::Signal { ticker, keyword })) => {
                signal_reply(config, &mut recommender, SignalTarget::Ticker { ticker, keyword })
            }
            Ok(Some(SessionCommand::Asset(name))) => {
                signal_reply(config, &mut recommender, SignalTarget::Asset(name))
            }
            Err(err) => error_reply(&err),
        };
        writeln!(output, "{reply}").map_err(|err| format!("failed to write reply: {err}"))?;
        output
            .flush()
            .map_err(|err| format!("failed to flush reply: {err}"))?;
    }
    Ok(())
}

fn signal_reply(
    config: &Config,
    recommender: &mut CachedRecommender<'_>,
    target: SignalTarget,
) -> serde_json::Value {
    let (ticker, keyword) = match resolve_target(config, &target) {
        Ok(resolved) => resolved,
        Err(err) => return error_reply(&err),
    };
    match recommender.recommend(&ticker, &keyword, Utc::now()) {
        Ok(rec) => serde_json::json!({
            "status": "ok",
            "mode": "signal",
            "recommendation": rec.summary_json(),
        }),
        Err(err) => error_reply(&err.to_string()),
    }
}

fn error_reply(message: &str) -> serde_json::Value {
    serde_json::json!({"status": "error", "error": message})
}
