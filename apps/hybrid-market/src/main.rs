use clap::{Parser, Subcommand};
use hybrid_application::config::{self, Config};
use hybrid_market::headless::{self, SignalTarget};
use hybrid_market::{interactive, obs, record_command, CommandError};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "hybrid-market")]
#[command(about = "Hybrid forecast + news signals and lot-sized allocation plans.", version)]
struct Cli {
    /// Config file path (TOML). If omitted, uses env HYBRID_CONFIG, then built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fuse forecast and news sentiment into a signal for one instrument.
    Signal {
        /// Exchange ticker, e.g. BBRI.JK or USDIDR=X.
        #[arg(required_unless_present = "asset", conflicts_with = "asset")]
        ticker: Option<String>,
        /// News search phrase (defaults to "<SYMBOL> stock").
        #[arg(long)]
        keyword: Option<String>,
        /// Catalog asset name instead of a ticker (USD, JPY, BBRI, TLKM, ...).
        #[arg(long)]
        asset: Option<String>,
        /// Output directory (defaults to [run] out_dir).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Screen the universe, optimise weights and size lots for a budget.
    Plan {
        /// Investment amount in account currency.
        amount: f64,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Evaluate every catalog asset and write daily.json.
    Daily {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check configuration ranges and price-file coverage.
    Validate {
        /// Treat missing or short price history as a failure (exit code 2).
        #[arg(long)]
        strict: bool,
    },
    /// Read commands from stdin, answering with one JSON line each.
    Interactive,
}

impl Command {
    fn label(&self) -> &'static str {
        match self {
            Command::Signal { .. } => "signal",
            Command::Plan { .. } => "plan",
            Command::Daily { .. } => "daily",
            Command::Validate { .. } => "validate",
            Command::Interactive => "interactive",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = obs::init_tracing(&config.run.log_level, config.run.log_format) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    let started = Instant::now();
    let command = cli.command.label();
    let result = match cli.command {
        Command::Signal {
            ticker,
            keyword,
            asset,
            out,
        } => {
            let target = match (asset, ticker) {
                (Some(name), _) => SignalTarget::Asset(name),
                (None, Some(ticker)) => SignalTarget::Ticker { ticker, keyword },
                (None, None) => {
                    eprintln!("error: a ticker or --asset is required");
                    std::process::exit(1);
                }
            };
            headless::run_signal(&config, &target, out.as_deref()).map(Some)
        }
        Command::Plan { amount, out } => {
            headless::run_plan(&config, amount, out.as_deref()).map(Some)
        }
        Command::Daily { out } => headless::run_daily(&config, out.as_deref()).map(Some),
        Command::Validate { strict } => headless::run_validate(&config, strict).map(Some),
        Command::Interactive => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            interactive::run_session(&config, stdin.lock(), stdout.lock()).map(|()| None)
        }
    };
    record_command(command, started, &result);

    match result {
        Ok(None) => {}
        Ok(Some(json)) => {
            println!(
                "{}",
                serde_json::to_string(&json)
                    .unwrap_or_else(|_| "{\"status\":\"error\",\"error\":\"json\"}".to_string())
            );
        }
        Err(CommandError { message, exit_code }) => {
            eprintln!("error: {message}");
            std::process::exit(exit_code);
        }
    }
}

fn load_config(cli_path: Option<PathBuf>) -> Result<Config, String> {
    let path = cli_path.or_else(|| {
        std::env::var("HYBRID_CONFIG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    });
    match path {
        Some(path) => config::load_config(&path),
        None => Ok(Config::default()),
    }
}
