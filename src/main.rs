use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use hireform::app::App;
use hireform::config::Config;
use hireform::form::{FormSchema, StepRegistry};
use hireform::headless::{self, Answers};
use hireform::logging;
use hireform::submission::{SubmissionPipeline, SubmissionResult};
use hireform::wizard::WizardController;

#[derive(Parser)]
#[command(name = "hireform")]
#[command(about = "Step-by-step employment application in the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the steps of the configured form
    Steps,

    /// Submit an application without the interactive screen
    Submit {
        /// TOML file mapping field names to answers
        #[arg(short, long)]
        answers: PathBuf,

        /// File to attach (repeatable)
        #[arg(long = "attach")]
        attach: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    // No subcommand = interactive screen, which owns the terminal
    let is_tui_mode = cli.command.is_none();
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    match cli.command {
        Some(Commands::Steps) => cmd_steps(&config)?,
        Some(Commands::Submit { answers, attach }) => {
            cmd_submit(&config, &answers, &attach).await?;
        }
        None => {
            let result = run_tui(config).await;
            logging::report_log_file(logging_handle.log_file_path.as_deref());
            result?;
        }
    }

    Ok(())
}

async fn run_tui(config: Config) -> Result<()> {
    let mut app = App::from_config(config)?;
    app.run().await
}

fn load_form(config: &Config) -> Result<(FormSchema, StepRegistry)> {
    let schema = FormSchema::load_or_embedded(config.form.definition.as_deref())
        .context("Failed to load form definition")?;
    let registry = StepRegistry::from_schema(&schema).context("Invalid form definition")?;
    Ok((schema, registry))
}

fn cmd_steps(config: &Config) -> Result<()> {
    let (schema, registry) = load_form(config)?;

    println!("{} ({} steps)", schema.title, registry.len());
    println!("{}", "─".repeat(60));

    for (index, step) in registry.iter().enumerate() {
        println!(
            "{:>2}. {:<28} {:>2} fields",
            index + 1,
            step.title(),
            step.fields().len()
        );
        let groups = step.required_radio_groups();
        if !groups.is_empty() {
            println!("      required choices: {}", groups.join(", "));
        }
    }

    Ok(())
}

async fn cmd_submit(config: &Config, answers: &Path, attach: &[PathBuf]) -> Result<()> {
    let (schema, registry) = load_form(config)?;
    let mut controller = WizardController::new(registry);

    let answers = Answers::load(answers)?;
    headless::fill(controller.registry_mut(), &answers)?;
    tracing::debug!(answers = answers.len(), "Answers applied");

    if !attach.is_empty() {
        let count = headless::attach(
            controller.registry_mut(),
            &config.uploads.file_field,
            attach,
            &config.uploads.limits(),
        )?;
        println!("Attached {} file(s)", count);
    }

    let pipeline = SubmissionPipeline::from_config(config).context("Failed to set up submission")?;
    let result = headless::submit(&mut controller, &pipeline, |phase| {
        println!("{}", phase.label());
    })
    .await?;

    match result {
        SubmissionResult::Success => {
            println!("{}", schema.completion_message);
            Ok(())
        }
        SubmissionResult::Failure(reason) => {
            eprintln!("Oops! {}", reason);
            std::process::exit(1);
        }
    }
}
