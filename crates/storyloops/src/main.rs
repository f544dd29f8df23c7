mod config;
mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use dialoguer::{Confirm, Input};

use storyloops_core::{PipelineError, PipelineResult, PipelineSettings, RefinementRunner};
use storyloops_gateway::{GatewayError, API_KEY_ENV, MODEL};
use storyloops_logging::{init_tracing, LogFormat, Logger};
use storyloops_teller::StoryRequest;

use crate::config::{resolve_settings, ProjectConfig, SettingsOverrides};

/// Exit code for runs that failed before producing a story
const EXIT_FAILURE: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "storyloops",
    about = "Bedtime story generator with a model judge and refinement loop",
    version,
    author
)]
struct Cli {
    /// Story idea. Runs once and exits; omit for the interactive session
    #[arg(short, long)]
    prompt: Option<String>,

    /// Working directory holding storyloops.toml and .env (default: current directory)
    #[arg(short = 'd', long)]
    working_dir: Option<PathBuf>,

    /// Youngest listener age
    #[arg(long)]
    min_age: Option<u8>,

    /// Oldest listener age
    #[arg(long)]
    max_age: Option<u8>,

    /// Minimum overall score (1-10) that ends refinement
    #[arg(short, long)]
    threshold: Option<u8>,

    /// Refinement rounds allowed after the first draft
    #[arg(short = 'n', long)]
    max_rounds: Option<usize>,

    /// Show pipeline progress events on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Diagnostic log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Append pipeline events as JSON lines to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Output final result as JSON (with --prompt)
    #[arg(long)]
    json_output: bool,

    /// Dry run: show resolved settings without calling the model
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

impl Cli {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            threshold: self.threshold,
            max_rounds: self.max_rounds,
            min_age: self.min_age,
            max_age: self.max_age,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let working_dir = match cli.working_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    load_dotenv(&working_dir)?;

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(&cli.log_level, log_format);

    let file_config = ProjectConfig::load(&working_dir)?;
    let settings = resolve_settings(file_config.as_ref(), cli.overrides())?;

    if cli.dry_run {
        display::print_dry_run(&settings, cli.prompt.as_deref(), MODEL);
        return Ok(());
    }

    let backend = match storyloops_gateway::connect_from_env() {
        Ok(backend) => backend,
        Err(e) => {
            print_credential_help(&e);
            std::process::exit(EXIT_FAILURE);
        }
    };

    let logger = create_logger(&cli, log_format)?;
    let runner = RefinementRunner::new(backend.as_ref(), settings, Arc::new(logger));

    match cli.prompt.as_deref() {
        Some(prompt) => {
            let code = match run_once(&runner, prompt, cli.json_output).await {
                Ok(code) => code,
                Err(e) => {
                    eprintln!();
                    eprintln!("=== FAILED ===");
                    eprintln!("{:#}", e);
                    EXIT_FAILURE
                }
            };
            std::process::exit(code);
        }
        None => run_interactive(&runner).await,
    }
}

/// Load `.env` from the working directory; a missing file is fine
fn load_dotenv(working_dir: &Path) -> Result<()> {
    match dotenvy::from_path(working_dir.join(".env")) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).context("Failed to load .env"),
    }
}

fn create_logger(cli: &Cli, format: LogFormat) -> Result<Logger> {
    let logger = match &cli.log_file {
        Some(path) => Logger::with_file(format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(format),
    };
    Ok(if cli.verbose { logger } else { logger.quiet() })
}

fn print_credential_help(error: &GatewayError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
    eprintln!();
    eprintln!("Please set your OpenAI API key using one of these methods:");
    eprintln!();
    eprintln!("  Method 1 - Create .env file:");
    eprintln!("    echo '{}=your-key-here' > .env", API_KEY_ENV);
    eprintln!();
    eprintln!("  Method 2 - Export in terminal:");
    eprintln!("    export {}='your-key-here'", API_KEY_ENV);
    eprintln!();
}

/// Run one pipeline and report; returns the process exit code
async fn run_once(runner: &RefinementRunner<'_>, prompt: &str, json_output: bool) -> Result<i32> {
    let request = StoryRequest::new(prompt, runner.settings().default_age_range)
        .context("Invalid story request")?;

    let result = runner.run(&request).await?;

    if json_output {
        let json = serde_json::to_string_pretty(&result)?;
        println!("{}", json);
    } else {
        display::print_story(result.story());
        display::print_quality_report(&result);
        if !result.met_threshold() {
            eprintln!(
                "{}",
                format!(
                    "Below threshold ({}/10) after {} refinement round(s).",
                    runner.settings().threshold,
                    result.refinement_rounds()
                )
                .yellow()
            );
        }
    }

    Ok(result.exit_code())
}

async fn run_interactive(runner: &RefinementRunner<'_>) -> Result<()> {
    let settings: &PipelineSettings = runner.settings();
    display::print_header(settings);

    loop {
        let Some(idea) = ask_story_idea() else {
            println!("No story request provided. Goodbye!");
            break;
        };

        match StoryRequest::new(idea, settings.default_age_range) {
            Ok(request) => {
                println!();
                println!("Generating your bedtime story...");
                println!("{}", "(This may take a moment as we ensure quality)".dimmed());

                if let Err(e) = tell_story(runner, &request).await {
                    eprintln!();
                    eprintln!("{} {}", "Error generating story:".red().bold(), e);
                    eprintln!("Please try again with a different request.");
                }
            }
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }

        if !ask_for_another() {
            println!();
            println!("Sweet dreams! Goodbye.");
            break;
        }
        println!();
    }

    Ok(())
}

/// One story plus as many listener-feedback rewrites as requested
async fn tell_story(
    runner: &RefinementRunner<'_>,
    request: &StoryRequest,
) -> Result<(), PipelineError> {
    let mut result = runner.run(request).await?;
    show(&result);

    while let Some(feedback) = ask_for_feedback() {
        println!();
        println!("Refining story based on your feedback...");

        let previous = result.story().to_string();
        result = runner
            .refine_with_feedback(request, Some(&previous), Some(&feedback))
            .await?;
        show(&result);
    }

    Ok(())
}

fn show(result: &PipelineResult) {
    display::print_story(result.story());
    display::print_quality_report(result);
}

/// Read one line; Ctrl+C or EOF count as an empty answer
fn read_line(prompt: &str) -> Option<String> {
    let answer: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .ok()?;
    let answer = answer.trim();
    (!answer.is_empty()).then(|| answer.to_string())
}

fn ask_story_idea() -> Option<String> {
    println!("What kind of bedtime story would you like?");
    println!(
        "{}",
        "(Examples: 'A story about a friendly dragon', 'A tale about a little star\n who wanted to explore', 'An adventure with a brave bunny')"
            .dimmed()
    );
    println!();
    read_line("Your story idea")
}

fn ask_for_feedback() -> Option<String> {
    println!("Would you like to request any changes to the story?");
    println!("{}", "(Press Enter to skip, or type your feedback)".dimmed());
    read_line("Your feedback")
}

fn ask_for_another() -> bool {
    println!();
    Confirm::new()
        .with_prompt("Generate another story?")
        .default(false)
        .interact()
        .unwrap_or(false)
}
