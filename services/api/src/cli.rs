use crate::demo::{
    run_browse, run_demo, run_score, run_stats, BrowseArgs, DemoArgs, ScoreArgs, StatsArgs,
};
use crate::infra::blocking_task_failed;
use crate::server;
use campus_feedback::config::AppConfig;
use campus_feedback::error::AppError;
use campus_feedback::telemetry;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Campus Feedback",
    about = "Serve and explore university service surveys and testimonials from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a set of survey answers for one service unit
    Score(ScoreArgs),
    /// Browse testimonials and their statistics
    Testimonials {
        #[command(subcommand)]
        command: TestimonialCommand,
    },
    /// Run an end-to-end walkthrough from survey to published testimonial
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum TestimonialCommand {
    /// List testimonials page by page with optional filters
    Browse(BrowseArgs),
    /// Show aggregate statistics and rating trends
    Stats(StatsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// CSV export appended to the built-in testimonial dataset
    #[arg(long)]
    pub(crate) seed_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(&command_config()?, args),
        Command::Testimonials {
            command: TestimonialCommand::Browse(args),
        } => {
            let config = command_config()?;
            offload(move || run_browse(&config, args)).await
        }
        Command::Testimonials {
            command: TestimonialCommand::Stats(args),
        } => {
            let config = command_config()?;
            offload(move || run_stats(&config, args)).await
        }
        Command::Demo(args) => {
            let config = command_config()?;
            offload(move || run_demo(&config, args)).await
        }
    }
}

fn command_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

/// Runs store-driven commands off the async runtime; the live client blocks.
async fn offload<F>(task: F) -> Result<(), AppError>
where
    F: FnOnce() -> Result<(), AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(blocking_task_failed)?
}
