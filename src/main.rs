use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fundlab::advisor::{
    generate_strategy_code, request_market_advice, AdvisorBackend, GeminiClient, OfflineAdvisor,
};
use fundlab::backtest::SimulationRunner;
use fundlab::monitor::MonitorSession;
use fundlab::settings::Settings;
use fundlab::telemetry;
use fundlab::{FundAnalysis, FundQuote, MarketInput, StrategyType};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "fundlab")]
#[command(about = "Fund strategy simulator, AI market advisor and live fund monitor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML configuration file (default: ./fundlab.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use the local rule-based advisor instead of the AI service
    #[arg(long, global = true)]
    offline: bool,

    /// Print results as JSON instead of a report
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a simulated backtest for a strategy preset
    Simulate(SimulateArgs),
    /// Get a BUY/SELL/HOLD call for described market conditions
    Advise(AdviseArgs),
    /// Generate strategy and data-fetch source code
    Codegen(CodegenArgs),
    /// Watch the fund list tick and collect AI signals
    Monitor(MonitorArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum StrategyArg {
    MaCrossover,
    Rsi,
    Momentum,
    Grid,
}

impl From<StrategyArg> for StrategyType {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::MaCrossover => StrategyType::MaCrossover,
            StrategyArg::Rsi => StrategyType::RsiMeanReversion,
            StrategyArg::Momentum => StrategyType::Momentum,
            StrategyArg::Grid => StrategyType::GridTrading,
        }
    }
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Strategy preset
    #[arg(value_enum, default_value = "ma-crossover")]
    strategy: StrategyArg,

    /// Horizon in days (default from settings)
    #[arg(long, value_parser = clap::value_parser!(u32).range(30..=730))]
    days: Option<u32>,

    /// Initial capital (default from settings)
    #[arg(long)]
    capital: Option<f64>,

    /// Seed for a reproducible curve
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct AdviseArgs {
    /// Index level or trend, e.g. "3050, consolidating"
    #[arg(long, default_value = "")]
    index: String,

    /// Market sentiment, e.g. "fearful"
    #[arg(long, default_value = "")]
    sentiment: String,

    /// Trading volume trend, e.g. "shrinking"
    #[arg(long, default_value = "")]
    volume: String,

    /// Sector focus, e.g. "semiconductors leading"
    #[arg(long, default_value = "")]
    sector: String,
}

#[derive(Args, Debug)]
struct CodegenArgs {
    /// Plain-language strategy description
    description: String,

    /// Indicator to use (repeatable)
    #[arg(long = "indicator")]
    indicators: Vec<String>,
}

#[derive(Args, Debug)]
struct MonitorArgs {
    /// How long to watch before stopping
    #[arg(long, default_value = "10")]
    seconds: u64,

    /// Request an AI signal for every fund before stopping
    #[arg(long)]
    analyze: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MonitorReport {
    ticks: u64,
    funds: Vec<FundQuote>,
    analyses: Vec<FundAnalysis>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_logging(telemetry::DEFAULT_FILTER)?;

    let settings = Settings::load_from(cli.config.as_deref()).context("Failed to load settings")?;
    let backend = build_backend(&settings, cli.offline)?;

    match cli.command {
        Commands::Simulate(args) => simulate(&settings, backend, args, cli.json).await,
        Commands::Advise(args) => advise(backend.as_ref(), args, cli.json).await,
        Commands::Codegen(args) => codegen(backend.as_ref(), args, cli.json).await,
        Commands::Monitor(args) => monitor(&settings, backend, args, cli.json).await,
    }
}

fn build_backend(settings: &Settings, offline: bool) -> anyhow::Result<Arc<dyn AdvisorBackend>> {
    if offline {
        tracing::info!("Using offline advisor");
        return Ok(Arc::new(OfflineAdvisor::new()));
    }

    if settings.gemini.api_key.is_none() {
        tracing::warn!("No Gemini API key configured, falling back to offline advisor");
        return Ok(Arc::new(OfflineAdvisor::new()));
    }

    let client = GeminiClient::new(&settings.gemini)?;
    tracing::info!(model = %settings.gemini.default_model, "Using Gemini advisor");
    Ok(Arc::new(client))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn simulate(
    settings: &Settings,
    backend: Arc<dyn AdvisorBackend>,
    args: SimulateArgs,
    json: bool,
) -> anyhow::Result<()> {
    let strategy = StrategyType::from(args.strategy);
    let days = args.days.unwrap_or(settings.simulation.default_horizon_days);
    let capital = args.capital.unwrap_or(settings.simulation.initial_capital);
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    tracing::info!(strategy = %strategy, days, capital, "Starting simulation");

    let runner = SimulationRunner::new(backend, settings.simulation.volatility);
    let result = runner.run(strategy, days, capital, &mut rng).await?;

    if json {
        print_json(&result)
    } else {
        result.print_report();
        Ok(())
    }
}

async fn advise(backend: &dyn AdvisorBackend, args: AdviseArgs, json: bool) -> anyhow::Result<()> {
    let input = MarketInput {
        index_level: args.index,
        sentiment: args.sentiment,
        volume_trend: args.volume,
        sector_focus: args.sector,
    };

    let advice = request_market_advice(backend, &input).await?;

    if json {
        return print_json(&advice);
    }

    println!("\n🧭 {} ({}% confidence)", advice.signal, advice.confidence);
    println!("  {}", advice.title);
    println!("  Risk level: {:?}\n", advice.risk_level);
    for (i, reason) in advice.reasoning.iter().enumerate() {
        println!("  {}. {}", i + 1, reason);
    }
    println!("\n  Plan: {}\n", advice.action_plan);

    Ok(())
}

async fn codegen(backend: &dyn AdvisorBackend, args: CodegenArgs, json: bool) -> anyhow::Result<()> {
    let code = generate_strategy_code(backend, &args.description, &args.indicators).await?;

    if json {
        return print_json(&code);
    }

    println!("// ===== Java strategy model =====\n{}\n", code.strategy_model_source);
    println!("# ===== Python data fetcher =====\n{}\n", code.data_fetch_script_source);
    println!("{}", code.explanation);

    Ok(())
}

async fn monitor(
    settings: &Settings,
    backend: Arc<dyn AdvisorBackend>,
    args: MonitorArgs,
    json: bool,
) -> anyhow::Result<()> {
    let mut session = MonitorSession::new(backend, settings.monitor.tick_interval());
    session.activate();

    tracing::info!(seconds = args.seconds, "Monitoring funds");

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(args.seconds)) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping monitor");
        }
    }

    let analyses = if args.analyze {
        session.analyze_all().await
    } else {
        Vec::new()
    };

    let ticks = session.deactivate().await;
    let report = MonitorReport {
        ticks,
        funds: session.snapshot().await,
        analyses,
    };

    if json {
        return print_json(&report);
    }

    println!("\n📊 FUND MONITOR ({} ticks)\n", report.ticks);
    println!(
        "{:<30} {:>8} {:>10} {:>8}  {}",
        "Fund", "Code", "Price", "Change", "Signal"
    );
    println!("{}", "─".repeat(80));

    for fund in &report.funds {
        let signal = report
            .analyses
            .iter()
            .find(|a| a.fund_id == fund.id)
            .map(|a| format!("{} {} ({})", a.signal, a.suggestion, a.key_reason))
            .unwrap_or_default();

        println!(
            "{:<30} {:>8} {:>10.3} {:>+7.2}%  {}",
            fund.name, fund.code, fund.price, fund.change_percent, signal
        );
    }
    println!();

    Ok(())
}
