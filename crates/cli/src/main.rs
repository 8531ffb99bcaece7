use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use biztalk_migrator_core::{
    snapshot, MigrationContext, ParserPipeline, PipelineConfig, StageId, TracingLogger,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// BizTalk Migrator - Parse discovered BizTalk applications into a resource graph
#[derive(Parser)]
#[command(name = "migrator")]
#[command(version)] // Auto-pull version from Cargo.toml
#[command(about = "Parse discovered BizTalk artifacts into a linked resource graph", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. "info", "biztalk_migrator_core=debug")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the parser pipeline over a discovered model snapshot
    Parse {
        /// JSON model snapshot produced by discovery
        snapshot: PathBuf,

        /// JSON pipeline configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Where to write the parsed model (defaults to stdout summary only)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the parser stages in run order
    Stages,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .ok();
}

fn run(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Stages => {
            for id in StageId::ALL {
                let requires: Vec<String> = id.requires().iter().map(ToString::to_string).collect();
                if requires.is_empty() {
                    println!("{}", id);
                } else {
                    println!("{} (after {})", id, requires.join(", "));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Parse {
            snapshot: input,
            config,
            output,
        } => {
            let config = match config {
                Some(path) => PipelineConfig::load(&path)?,
                None => PipelineConfig::default(),
            };
            let pipeline = ParserPipeline::from_config(&config, Arc::new(TracingLogger))
                .context("building parser pipeline")?;

            let mut model = snapshot::load(&input)?;
            let mut context = MigrationContext::new();
            let summary = pipeline.run(&mut model, &mut context);

            println!("Stages run: {}", summary.stages_run.len());
            println!("Resources:  {}", model.graph.node_count());
            println!("Warnings:   {}", summary.warnings);
            println!("Errors:     {}", summary.errors);
            for error in &context.errors {
                println!("  {}", error);
            }

            if let Some(path) = output {
                snapshot::save(&model, &path)?;
                println!("Wrote {}", path.display());
            }

            Ok(if context.has_errors() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}
