use crate::commands::{
    run_encoding_fit, run_evaluate, run_explain, run_importance, run_reports, EncodingFitArgs,
    EvaluateArgs, ExplainArgs, ImportanceArgs, ReportsArgs,
};
use crate::infra::SourceArgs;
use crate::server;
use clap::{Args, Parser, Subcommand};
use credit_risk::config::AppConfig;
use credit_risk::error::AppError;
use credit_risk::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "Smart Credit Risk Engine",
    about = "Evaluate loan applications with policy rules and a trained model",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the decision dashboard HTTP service (default command)
    Serve(ServeArgs),
    /// Decide every applicant and compare rules and model with actual outcomes
    Evaluate(EvaluateArgs),
    /// Explain the model prediction for a single applicant
    Explain(ExplainArgs),
    /// List global feature importance of the trained model
    Importance(ImportanceArgs),
    /// Write one plain-text decision report per applicant
    Reports(ReportsArgs),
    /// Manage the employment status encoding table
    Encoding {
        #[command(subcommand)]
        command: EncodingCommand,
    },
}

#[derive(Subcommand, Debug)]
enum EncodingCommand {
    /// Fit an encoding table from the categories present in a training CSV
    Fit(EncodingFitArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match command {
        Command::Serve(args) => server::run(args, config).await,
        Command::Evaluate(args) => run_evaluate(args, &config),
        Command::Explain(args) => run_explain(args, &config),
        Command::Importance(args) => run_importance(args, &config),
        Command::Reports(args) => run_reports(args, &config),
        Command::Encoding {
            command: EncodingCommand::Fit(args),
        } => run_encoding_fit(args),
    }
}
