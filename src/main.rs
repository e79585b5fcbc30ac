//! planmark - markdown plan bookkeeping
//!
//! Stamps date fields, detects finished plan tasks and syncs progress into
//! the master todo list.

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use planmark::dates::{self, DateFormat, DateUpdateOutcome};
use planmark::detect::ProgressDetector;
use planmark::sync::{ProgressSync, TodoUpdate};
use planmark::{PlanmarkError, ProjectConfig};

#[derive(Parser)]
#[command(name = "planmark")]
#[command(version)]
#[command(about = "Keep markdown plans, dates and the todo list in step", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true, env = "PLANMARK_PROJECT", default_value = ".")]
    project: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print today's date, or stamp today into a document's date fields
    Date {
        /// Format name (kr, iso, dot, slash, us) or a markdown file to update
        arg: Option<String>,
    },

    /// Detect completed plan tasks from file, test and dev server signals
    Detect {
        /// Check detected tasks off in the plan files
        #[arg(long)]
        auto: bool,

        /// Same as --auto
        #[arg(value_parser = ["auto"], hide = true)]
        mode: Option<String>,
    },

    /// Copy checked plan tasks into the todo file and summarize progress
    Sync,

    /// Show project configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the settings file path
    Path,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "planmark=debug,info"
    } else {
        "planmark=info,warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        let code = e
            .downcast_ref::<PlanmarkError>()
            .map_or(1, PlanmarkError::exit_code);
        std::process::exit(code);
    }
}

/// Resolve the project directory for commands that work on a project.
fn project_dir(project: &Path) -> anyhow::Result<PathBuf> {
    let project_path = project.canonicalize().unwrap_or(project.to_path_buf());

    if !project_path.exists() {
        return Err(PlanmarkError::MissingFile { path: project_path }.into());
    }
    Ok(project_path)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Date { arg } => run_date(arg.as_deref()),

        Commands::Detect { auto, mode } => {
            let project_path = project_dir(&cli.project)?;
            let auto = auto || mode.is_some();
            let config = ProjectConfig::load(&project_path)?;
            let outcome = ProgressDetector::new(&project_path, config).run(auto)?;

            println!("{}", outcome.report);
            if !outcome.updates.is_empty() {
                println!(
                    "{} Checked off {} task(s)",
                    "OK".green().bold(),
                    outcome.updates.len()
                );
            }
            println!("Report saved to {}", outcome.report_path.display());
            Ok(())
        }

        Commands::Sync => {
            let project_path = project_dir(&cli.project)?;
            let config = ProjectConfig::load(&project_path)?;
            let outcome = ProgressSync::new(&project_path, config).run()?;

            match outcome.todo {
                TodoUpdate::Updated(count) => println!(
                    "{} Updated {} line(s) in {}",
                    "OK".green().bold(),
                    count,
                    outcome.todo_path.display()
                ),
                TodoUpdate::Unchanged => println!(
                    "{} {} already up to date",
                    "Info:".blue(),
                    outcome.todo_path.display()
                ),
                TodoUpdate::Missing => println!(
                    "{} Todo file not found: {}",
                    "Warning:".yellow(),
                    outcome.todo_path.display()
                ),
            }
            println!("\n{}", outcome.summary);
            println!("Log saved to {}", outcome.log_path.display());
            Ok(())
        }

        Commands::Config { action } => {
            let project_path = project_dir(&cli.project)?;
            run_config(&project_path, action)
        }
    }
}

fn run_config(project_path: &Path, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show { json } => {
            let config = ProjectConfig::load(project_path)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("\n{} Project Configuration", "Config:".cyan().bold());
                println!("{}", "─".repeat(40));
                println!("   Plan globs: {}", config.plan_globs.join(", "));
                println!("   Todo file: {}", config.todo_file);
                println!("   State file: {}", config.state_file);
                println!("   Scan dirs: {}", config.scan_dirs.join(", "));
                println!("   Feature rules: {}", config.features.len());
                println!("   Watched features: {}", config.watched_files.len());
                println!("   Freshness window: {}h", config.freshness_hours);
                println!(
                    "   Completion threshold: {}/{}",
                    config.scoring.threshold,
                    config.scoring.total_weight()
                );
            }
            Ok(())
        }

        ConfigAction::Path => {
            let settings_path = ProjectConfig::settings_path(project_path);
            println!("{}", settings_path.display());
            if !settings_path.exists() {
                println!(
                    "{} settings.json not found (using defaults)",
                    "Info:".blue()
                );
            }
            Ok(())
        }
    }
}

fn run_date(arg: Option<&str>) -> anyhow::Result<()> {
    let today = Local::now().date_naive();

    let Some(arg) = arg else {
        println!("Today's date in each format:");
        for format in DateFormat::ALL {
            println!("  {:<6} {}", format.name(), format.format(today));
        }
        println!();
        println!("Usage:");
        println!("  planmark date <file>     Update date fields in a markdown file");
        println!("  planmark date <format>   Print today as kr, iso, dot, slash or us");
        return Ok(());
    };

    if let Some(format) = DateFormat::from_name(arg) {
        println!("{}", format.format(today));
        return Ok(());
    }

    let path = Path::new(arg);
    let outcome = dates::update_file(path, today)
        .with_context(|| format!("Failed to update dates in {}", path.display()))?;

    match outcome {
        DateUpdateOutcome::Updated { fields } => println!(
            "{} Updated {} ({})",
            "OK".green().bold(),
            path.display(),
            fields.join(", ")
        ),
        DateUpdateOutcome::Unchanged => {
            println!("{} No date fields to update in {}", "Info:".blue(), path.display());
        }
        DateUpdateOutcome::Missing => {
            println!("{} File not found: {}", "Warning:".yellow(), path.display());
        }
    }
    Ok(())
}
