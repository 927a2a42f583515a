//! NeuroAds — experiment and budget allocation engine for ad campaigns.
//!
//! CLI entry point running the engines against a seeded sandbox world.

mod seed;

use chrono::Utc;
use clap::{Parser, Subcommand};
use neuroads_allocation::BudgetOptimizer;
use neuroads_core::AppConfig;
use neuroads_experiments::ABTestEngine;
use tracing::info;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "neuroads")]
#[command(about = "Experiment and budget allocation engine for ad campaigns")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed the sandbox and run one full experiment + allocation cycle
    Demo,
    /// Run one A/B test analysis cycle in the seeded sandbox
    AnalyzeTest {
        /// Test id; defaults to the seeded running test
        #[arg(long)]
        test_id: Option<Uuid>,
    },
    /// Run one budget optimization cycle in the seeded sandbox
    Optimize {
        /// Campaign id; defaults to the seeded campaign
        #[arg(long)]
        campaign_id: Option<Uuid>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neuroads=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("NeuroAds starting up");

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let now = Utc::now();
    let world = seed::seed(&config, now)?;

    match cli.command {
        Command::Demo => {
            let engine = ABTestEngine::new(config.experiments.clone());
            let experiment = engine.analyze(
                &world.store,
                &world.analytics,
                &world.registry,
                world.test_id,
                now,
            );

            let optimizer = BudgetOptimizer::new(config.allocation.clone());
            let allocation = optimizer.optimize(
                &world.store,
                &world.analytics,
                &world.registry,
                world.campaign_id,
                now,
            )?;

            let report = serde_json::json!({
                "campaign_id": world.campaign_id,
                "test_id": world.test_id,
                "experiment": experiment,
                "allocation": allocation,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::AnalyzeTest { test_id } => {
            let engine = ABTestEngine::new(config.experiments.clone());
            let outcome = engine.analyze(
                &world.store,
                &world.analytics,
                &world.registry,
                test_id.unwrap_or(world.test_id),
                now,
            );
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Optimize { campaign_id } => {
            let optimizer = BudgetOptimizer::new(config.allocation.clone());
            let outcome = optimizer.optimize(
                &world.store,
                &world.analytics,
                &world.registry,
                campaign_id.unwrap_or(world.campaign_id),
                now,
            )?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
