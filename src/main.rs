//! Paper trading bot for Polymarket cricket markets

use clap::{Parser, Subcommand};
use paper_bot::{
    bot::{BotConfig, BotLoop},
    client::{ClobClient, GammaClient, MarketDataProvider},
    config::Config,
    domains::cricket::{CricketMarkets, CricketPromptBuilder},
    model::LlmModel,
    storage::{Database, NullRecorder},
    strategy::LlmStrategy,
    types::to_percent,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "paper-bot")]
#[command(about = "LLM-driven paper trading on Polymarket cricket markets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the paper trading loop
    Run {
        /// Session length in hours (overrides config)
        #[arg(long)]
        duration: Option<f64>,
        /// Minutes between cycles (overrides config)
        #[arg(long)]
        interval: Option<f64>,
    },
    /// List tradeable markets with their prices
    Markets,
    /// Ask the strategy about one market without trading
    Analyze {
        /// Event slug
        slug: String,
    },
    /// Drop and recreate the database schema
    ResetDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run { duration, interval } => {
            if let Some(hours) = duration {
                config.run.duration_hours = hours;
            }
            if let Some(minutes) = interval {
                config.run.interval_minutes = minutes;
            }
            config.validate()?;
            run_bot(config).await
        }
        Commands::Markets => show_markets(config).await,
        Commands::Analyze { slug } => analyze_market(config, &slug).await,
        Commands::ResetDb => reset_db(config).await,
    }
}

fn build_provider(config: &Config) -> anyhow::Result<CricketMarkets> {
    let gamma = GammaClient::new(&config.markets.gamma_url)?;
    let clob = ClobClient::new(&config.markets.clob_url)?;
    Ok(CricketMarkets::new(gamma, clob))
}

fn build_strategy(config: &Config) -> anyhow::Result<LlmStrategy> {
    let model = LlmModel::from_config(&config.llm)?;
    Ok(LlmStrategy::new(
        Box::new(model),
        Box::new(CricketPromptBuilder::new()),
        &config.llm.model,
        config.llm.min_confidence,
    ))
}

async fn build_bot(config: &Config) -> anyhow::Result<BotLoop> {
    let db = Database::connect(&config.database.expanded_path()).await?;
    Ok(BotLoop::new(
        Box::new(build_provider(config)?),
        Box::new(build_strategy(config)?),
        Box::new(db),
        config.trading.starting_capital,
        BotConfig::from_config(config),
    ))
}

async fn run_bot(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting paper trading bot");
    let mut bot = build_bot(&config).await?;

    let report = bot.run().await;
    tracing::info!(
        "Session finished after {} cycles, final value ${:.2}",
        report.cycles,
        report.final_value
    );
    Ok(())
}

async fn show_markets(config: Config) -> anyhow::Result<()> {
    let provider = build_provider(&config)?;
    let slugs = provider.scan(config.markets.min_volume).await?;

    println!("\n📊 {} cricket markets (volume ≥ ${})\n", slugs.len(), config.markets.min_volume);
    for slug in slugs {
        match provider.collect(&slug).await {
            Ok(snapshot) => {
                println!("{}", snapshot.title);
                println!(
                    "   {} | Volume: ${:.0} | Liquidity: ${:.0}",
                    snapshot.slug, snapshot.volume, snapshot.liquidity
                );
                for (name, quote) in &snapshot.outcomes {
                    println!(
                        "   - {}: buy {:.3} / sell {:.3} (spread {})",
                        name, quote.buy_price, quote.sell_price, quote.spread
                    );
                }
                println!();
            }
            Err(e) => tracing::warn!("Failed to collect {}: {}", slug, e),
        }
    }

    Ok(())
}

async fn analyze_market(config: Config, slug: &str) -> anyhow::Result<()> {
    let bot = BotLoop::new(
        Box::new(build_provider(&config)?),
        Box::new(build_strategy(&config)?),
        Box::new(NullRecorder),
        config.trading.starting_capital,
        BotConfig::from_config(&config),
    );

    let (snapshot, decision) = bot.analyze_market(slug).await?;

    println!("\n🔍 {}", snapshot.title);
    for (name, quote) in &snapshot.outcomes {
        println!("   {}: {:.3}", name, quote.buy_price);
    }
    println!("\nAction: {}", decision.action);
    if let Some(outcome) = &decision.outcome {
        println!("Outcome: {} ({})", outcome, decision.side);
    }
    println!("Size: ${:.2}", decision.position_size);
    println!("Confidence: {:.0}%", to_percent(decision.confidence));
    if let Some(edge) = decision.edge {
        println!("Edge: {:.1}%", edge);
    }
    println!("Reasoning: {}", decision.reasoning);

    Ok(())
}

async fn reset_db(config: Config) -> anyhow::Result<()> {
    let path = config.database.expanded_path();
    let db = Database::connect(&path).await?;
    db.reset().await?;
    println!("✅ Database reset: {}", path);
    Ok(())
}
