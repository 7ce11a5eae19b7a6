//! 🎰 Dozen Engine - line-driven session runner
//!
//! Reads one spin (0-36) or command per line from stdin and writes one JSON
//! object per line to stdout. Diagnostics go to stderr through the logger.
//!
//! Commands: `reset`, `state`, `stats`, `quit`

use anyhow::{Context, Result};
use log::{info, warn};
use std::io::{self, BufRead, Write};

use dozen_engine::config::Config;
use dozen_engine::decision_engine::SpinLogger;
use dozen_engine::Session;

fn main() -> Result<()> {
    // Load configuration (and .env) before the logger so LOG_LEVEL can seed the filter
    let config = Config::from_env().context("Failed to load configuration")?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.log_level.as_str()),
    )
    .init();

    config.validate().context("Invalid configuration")?;
    info!("✅ Configuration: Loaded");

    print_banner(&config);

    let mut spin_logger = match &config.logging.spin_log_path {
        Some(path) => Some(SpinLogger::new(path).context("Failed to open spin log")?),
        None => None,
    };

    let mut session = Session::new(config).context("Failed to start session")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let output = match input.to_ascii_lowercase().as_str() {
            "quit" | "exit" => break,
            "reset" => {
                session.reset();
                serde_json::to_string(&session.state())?
            }
            "state" => serde_json::to_string(&session.state())?,
            "stats" => serde_json::to_string(&session.stats())?,
            _ => match session.process_input(input) {
                Ok(snapshot) => {
                    if let Some(logger) = spin_logger.as_mut() {
                        if let Err(e) = logger.log_spin(&snapshot) {
                            warn!("⚠️  Spin log write failed: {:#}", e);
                        }
                    }
                    serde_json::to_string(&snapshot)?
                }
                Err(e) => {
                    warn!("⚠️  Rejected input {:?}: {}", input, e);
                    serde_json::json!({ "error": e.to_string() }).to_string()
                }
            },
        };

        writeln!(out, "{}", output).context("Failed to write stdout")?;
        out.flush()?;
    }

    let state = session.state();
    info!("🏁 Session finished: {} spins, phase {}, balance {:.0}",
          state.history_count, state.phase.as_str(), state.bankroll.balance);
    if let Some(logger) = &spin_logger {
        info!("📝 {} spins logged", logger.entries_logged());
    }

    Ok(())
}

fn print_banner(config: &Config) {
    eprintln!("\n======================================================================");
    eprintln!("🎰 DOZEN ENGINE - PREDICTION & BANKROLL SESSION");
    eprintln!("======================================================================");
    eprintln!("⏰ {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    eprintln!("💰 Starting balance: {:.0}", config.bankroll.starting_balance);
    eprintln!("📊 Strategy: {}", config.prediction.strategy.as_str());
    eprintln!("🛡️  Stop-loss: {:.0} | Profit target: {:.0}",
              config.risk.stop_loss, config.risk.profit_target);
    eprintln!("🔍 Status: READING SPINS FROM STDIN...");
    eprintln!("======================================================================\n");
}
