pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use plangate_agent::demo::demo_registry;
use plangate_agent::AgentRuntime;
use plangate_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "plangate",
    about = "Plangate operator CLI",
    long_about = "Run guardrailed agent requests, validate plan files, and inspect the tool registry and effective configuration.",
    after_help = "Examples:\n  plangate run \"post 'release is out' in #general\" --approve S1\n  plangate validate plan.json\n  plangate tools"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run one request through the full precheck/plan/validate/execute pipeline")]
    Run {
        #[arg(help = "Natural-language request to plan and execute")]
        request: String,
        #[arg(
            long,
            value_delimiter = ',',
            help = "Step ids to pre-approve (comma separated, e.g. S1,S2)"
        )]
        approve: Vec<String>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Validate a plan file against the demo tool registry without executing it")]
    Validate {
        #[arg(help = "Path to a JSON plan file")]
        plan: PathBuf,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List registered tools with schemas and approval requirements")]
    Tools,
    #[command(about = "Inspect effective configuration values with secrets redacted")]
    Config,
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("configuration error: {error}");
            return ExitCode::from(2);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Run { request, approve, json } => {
            let runtime = AgentRuntime::new(config, demo_registry());
            commands::run::run(&runtime, &request, &approve, json).await
        }
        Command::Validate { plan, json } => commands::validate::run(&config, &plan, json),
        Command::Tools => commands::tools::run(),
        Command::Config => commands::config::run(&config),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
