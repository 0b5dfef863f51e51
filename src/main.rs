//! OKX Gateway - Command Line Entry Point
//!
//! Runs a single gateway operation against OKX and prints the result as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use okx_gateway::{load_config, Direction, Trader};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show account balance
    Balance,
    /// List open positions
    Positions,
    /// Show the last traded price
    Price { symbol: String },
    /// Show instrument metadata
    Instrument { symbol: String },
    /// Open a position at market
    Open {
        symbol: String,
        #[arg(value_parser = parse_direction)]
        direction: Direction,
        quantity: Decimal,
        #[arg(short, long, default_value_t = 1)]
        leverage: u32,
    },
    /// Close a position; omit the quantity to close all of it
    Close {
        symbol: String,
        #[arg(value_parser = parse_direction)]
        direction: Direction,
        #[arg(default_value_t = Decimal::ZERO)]
        quantity: Decimal,
    },
    /// Attach a stop-loss
    StopLoss {
        symbol: String,
        #[arg(value_parser = parse_direction)]
        direction: Direction,
        quantity: Decimal,
        price: Decimal,
    },
    /// Attach a take-profit
    TakeProfit {
        symbol: String,
        #[arg(value_parser = parse_direction)]
        direction: Direction,
        quantity: Decimal,
        price: Decimal,
    },
    /// Cancel every pending conditional order for a symbol
    CancelAll { symbol: String },
}

fn parse_direction(value: &str) -> std::result::Result<Direction, String> {
    value.parse()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = load_config(Some(&args.config)).context("loading configuration")?;

    // Initialize logging
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(config.settings.log_level.as_str());
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!(
        config_file = %args.config,
        rest_url = %config.okx.rest_url,
        simulated = config.okx.simulated,
        instrument_type = %config.okx.instrument_type,
        "configuration loaded"
    );

    let trader = Trader::from_config(&config)?;

    match args.command {
        Command::Balance => print_json(&trader.get_balance().await?)?,
        Command::Positions => print_json(&trader.get_positions().await?)?,
        Command::Price { symbol } => print_json(&trader.get_market_price(&symbol).await?)?,
        Command::Instrument { symbol } => print_json(&trader.get_instrument(&symbol).await?)?,
        Command::Open {
            symbol,
            direction,
            quantity,
            leverage,
        } => print_json(
            &trader
                .open_position(&symbol, quantity, leverage, direction)
                .await?,
        )?,
        Command::Close {
            symbol,
            direction,
            quantity,
        } => print_json(&trader.close_position(&symbol, quantity, direction).await?)?,
        Command::StopLoss {
            symbol,
            direction,
            quantity,
            price,
        } => print_json(
            &trader
                .set_stop_loss(&symbol, direction, quantity, price)
                .await?,
        )?,
        Command::TakeProfit {
            symbol,
            direction,
            quantity,
            price,
        } => print_json(
            &trader
                .set_take_profit(&symbol, direction, quantity, price)
                .await?,
        )?,
        Command::CancelAll { symbol } => {
            let cancelled = trader.cancel_all_orders(&symbol).await?;
            print_json(&serde_json::json!({ "symbol": symbol, "cancelled": cancelled }))?
        }
    }

    Ok(())
}
