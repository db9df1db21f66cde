use hybrid_domain::services::fusion::FusionPolicy;
use hybrid_domain::services::lot_sizer::LotPolicy;
use hybrid_domain::services::optimizer::{FallbackPolicy, OptimizerPolicy};
use hybrid_domain::services::screener::ScreenPolicy;
use hybrid_domain::services::sentiment::SentimentPolicy;
use hybrid_domain::value_objects::period::Period;
use hybrid_domain::value_objects::ticker::Ticker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMode {
    #[default]
    Drift,
    Remote,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Stock,
    Forex,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub lots: LotsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default = "default_assets")]
    pub assets: Vec<AssetConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            signal: SignalConfig::default(),
            sentiment: SentimentConfig::default(),
            forecast: ForecastConfig::default(),
            universe: UniverseConfig::default(),
            optimizer: OptimizerConfig::default(),
            lots: LotsConfig::default(),
            cache: CacheConfig::default(),
            data: DataConfig::default(),
            assets: default_assets(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct RunConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    pub out_dir: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            out_dir: "out".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct SignalConfig {
    pub technical_threshold: f64,
    pub sentiment_deadband: f64,
    pub watchlist_threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        let policy = FusionPolicy::default();
        Self {
            technical_threshold: policy.technical_threshold,
            sentiment_deadband: policy.sentiment_deadband,
            watchlist_threshold: policy.watchlist_threshold,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct SentimentConfig {
    pub window: Period,
    pub max_headlines: usize,
    pub label_threshold: f64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        let policy = SentimentPolicy::default();
        Self {
            window: policy.window,
            max_headlines: policy.max_headlines,
            label_threshold: policy.label_threshold,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ForecastConfig {
    pub mode: ForecastMode,
    pub history_window: Period,
    pub drift_lookback: usize,
    pub url: Option<String>,
    pub timeout_ms: u64,
    pub retries: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            mode: ForecastMode::Drift,
            history_window: Period {
                label: "1y".to_string(),
                days: 365,
            },
            drift_lookback: 20,
            url: None,
            timeout_ms: 5_000,
            retries: 2,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct UniverseConfig {
    pub symbols: Vec<Ticker>,
    pub window: Period,
    pub select: usize,
}

pub const DEFAULT_UNIVERSE: [&str; 12] = [
    "BBCA.JK", "BBRI.JK", "BMRI.JK", "BBNI.JK", "TLKM.JK", "ASII.JK", "UNVR.JK", "ICBP.JK",
    "INDF.JK", "KLBF.JK", "ADRO.JK", "PGAS.JK",
];

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_UNIVERSE
                .iter()
                .filter_map(|s| Ticker::parse(s).ok())
                .collect(),
            window: Period {
                label: "6mo".to_string(),
                days: 180,
            },
            select: ScreenPolicy::default().select,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct OptimizerConfig {
    pub min_weight: f64,
    pub max_weight: f64,
    pub trading_days: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub on_failure: FallbackPolicy,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let policy = OptimizerPolicy::default();
        Self {
            min_weight: policy.min_weight,
            max_weight: policy.max_weight,
            trading_days: policy.trading_days,
            max_iterations: policy.max_iterations,
            tolerance: policy.tolerance,
            on_failure: policy.on_failure,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct LotsConfig {
    pub unit_size: u64,
}

impl Default for LotsConfig {
    fn default() -> Self {
        Self {
            unit_size: LotPolicy::default().unit_size,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 3_600 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct DataConfig {
    pub prices_dir: String,
    /// Scored headline file (`.csv` or `.json`). Without one every lookup
    /// reports no news.
    pub headlines_path: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            prices_dir: "data/prices".to_string(),
            headlines_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AssetConfig {
    pub name: String,
    pub ticker: Ticker,
    pub keyword: String,
    pub kind: AssetKind,
}

fn asset(name: &str, ticker: &str, keyword: &str, kind: AssetKind) -> Option<AssetConfig> {
    Some(AssetConfig {
        name: name.to_string(),
        ticker: Ticker::parse(ticker).ok()?,
        keyword: keyword.to_string(),
        kind,
    })
}

pub fn default_assets() -> Vec<AssetConfig> {
    [
        asset("USD", "USDIDR=X", "USD IDR currency", AssetKind::Forex),
        asset("JPY", "JPYIDR=X", "JPY IDR currency", AssetKind::Forex),
        asset("BBRI", "BBRI.JK", "Bank BRI Indonesia stock", AssetKind::Stock),
        asset("TLKM", "TLKM.JK", "Telkom Indonesia stock", AssetKind::Stock),
    ]
    .into_iter()
    .flatten()
    .collect()
}

impl Config {
    /// Range checks that serde cannot express. Run once at load time.
    pub fn validate(&self) -> Result<(), String> {
        let signal = &self.signal;
        for (name, value) in [
            ("signal.technical_threshold", signal.technical_threshold),
            ("signal.sentiment_deadband", signal.sentiment_deadband),
            ("signal.watchlist_threshold", signal.watchlist_threshold),
            ("sentiment.label_threshold", self.sentiment.label_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be finite and >= 0, got {value}"));
            }
        }
        if self.sentiment.label_threshold > 1.0 {
            return Err("sentiment.label_threshold must be <= 1".to_string());
        }
        if self.sentiment.max_headlines == 0 {
            return Err("sentiment.max_headlines must be >= 1".to_string());
        }

        let universe = &self.universe;
        if universe.symbols.is_empty() {
            return Err("universe.symbols must not be empty".to_string());
        }
        let mut seen = BTreeSet::new();
        for symbol in &universe.symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(format!("universe.symbols contains {symbol} twice"));
            }
        }
        if universe.select == 0 {
            return Err("universe.select must be >= 1".to_string());
        }
        if universe.select > universe.symbols.len() {
            return Err(format!(
                "universe.select ({}) exceeds universe size ({})",
                universe.select,
                universe.symbols.len()
            ));
        }

        let opt = &self.optimizer;
        let equal = 1.0 / universe.select as f64;
        if !(opt.min_weight.is_finite() && opt.max_weight.is_finite())
            || opt.min_weight <= 0.0
            || opt.min_weight > equal
            || opt.max_weight < equal
            || opt.max_weight > 1.0
        {
            return Err(format!(
                "optimizer weights must satisfy 0 < min_weight ({}) <= 1/select ({equal:.4}) <= max_weight ({}) <= 1",
                opt.min_weight, opt.max_weight
            ));
        }
        if !opt.trading_days.is_finite() || opt.trading_days <= 0.0 {
            return Err("optimizer.trading_days must be > 0".to_string());
        }
        if !opt.tolerance.is_finite() || opt.tolerance <= 0.0 {
            return Err("optimizer.tolerance must be > 0".to_string());
        }

        if self.lots.unit_size == 0 {
            return Err("lots.unit_size must be >= 1".to_string());
        }
        if self.cache.ttl_secs == 0 {
            return Err("cache.ttl_secs must be > 0".to_string());
        }
        if self.forecast.drift_lookback == 0 {
            return Err("forecast.drift_lookback must be >= 1".to_string());
        }
        if self.forecast.mode == ForecastMode::Remote {
            match self.forecast.url.as_deref() {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
                Some(url) => return Err(format!("forecast.url must be http(s): {url}")),
                None => return Err("forecast.url is required when mode = \"remote\"".to_string()),
            }
            if self.forecast.timeout_ms == 0 {
                return Err("forecast.timeout_ms must be > 0".to_string());
            }
        }

        let mut names = BTreeSet::new();
        for asset in &self.assets {
            if asset.name.trim().is_empty() {
                return Err("assets entries need a non-empty name".to_string());
            }
            if !names.insert(asset.name.to_uppercase()) {
                return Err(format!("asset {} is listed twice", asset.name));
            }
        }
        Ok(())
    }

    pub fn fusion_policy(&self) -> FusionPolicy {
        FusionPolicy {
            technical_threshold: self.signal.technical_threshold,
            sentiment_deadband: self.signal.sentiment_deadband,
            watchlist_threshold: self.signal.watchlist_threshold,
        }
    }

    pub fn sentiment_policy(&self) -> SentimentPolicy {
        SentimentPolicy {
            window: self.sentiment.window.clone(),
            max_headlines: self.sentiment.max_headlines,
            label_threshold: self.sentiment.label_threshold,
        }
    }

    pub fn screen_policy(&self) -> ScreenPolicy {
        ScreenPolicy {
            select: self.universe.select,
        }
    }

    pub fn optimizer_policy(&self) -> OptimizerPolicy {
        let opt = &self.optimizer;
        OptimizerPolicy {
            min_weight: opt.min_weight,
            max_weight: opt.max_weight,
            trading_days: opt.trading_days,
            max_iterations: opt.max_iterations,
            tolerance: opt.tolerance,
            on_failure: opt.on_failure,
        }
    }

    pub fn lot_policy(&self) -> LotPolicy {
        LotPolicy {
            unit_size: self.lots.unit_size,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn universe_symbols(&self) -> Vec<String> {
        self.universe
            .symbols
            .iter()
            .map(|t| t.as_str().to_string())
            .collect()
    }

    /// Catalog lookup by name, case-insensitive.
    pub fn find_asset(&self, name: &str) -> Option<&AssetConfig> {
        let wanted = name.trim();
        self.assets
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(wanted))
    }
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let (config, _source) = load_config_with_source(path)?;
    Ok(config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config = parse_config(&contents)
        .map_err(|err| format!("invalid config {}: {}", path.display(), err))?;
    Ok((config, contents))
}

pub fn parse_config(contents: &str) -> Result<Config, String> {
    let config: Config =
        toml::from_str(contents).map_err(|err| format!("failed to parse TOML: {err}"))?;
    config.validate()?;
    Ok(config)
}
