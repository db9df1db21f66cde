use hybrid_application::config::LogFormat;
use std::net::SocketAddr;

pub fn init_tracing(log_level: &str, log_format: LogFormat) -> Result<(), String> {
    let filter = std::env::var("HYBRID_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    // stdout carries JSON results; logs go to stderr.
    match log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
    Ok(())
}

#[cfg(feature = "prometheus")]
pub fn init_metrics() -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = std::env::var("HYBRID_METRICS_ADDR").ok() else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let addr: SocketAddr = raw
        .parse()
        .map_err(|err| format!("invalid HYBRID_METRICS_ADDR (expected host:port): {err}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to install prometheus exporter: {err}"))?;

    tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
pub fn init_metrics() -> Result<Option<SocketAddr>, String> {
    if std::env::var("HYBRID_METRICS_ADDR").is_ok_and(|v| !v.trim().is_empty()) {
        return Err("metrics exporter requires hybrid-market feature `prometheus`".to_string());
    }
    Ok(None)
}
