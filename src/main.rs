mod cli;
mod config;
mod error;
mod github;
mod insight;
mod orchestrator;

use clap::Parser;
use cli::{Cli, Commands, MAX_SELECTED_REPOS};
use config::Config;
use error::{RepoPulseError, Result};
use github::cache::{RepoCache, SledRepoStore};
use github::client::GitHubClient;
use indicatif::{ProgressBar, ProgressStyle};
use insight::store::InsightStore;
use insight::GenerationOutcome;
use orchestrator::Orchestrator;
use std::io::{self, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = cli.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // init runs before config loading; a broken config must not block it
    if let Some(Commands::Init { force }) = cli.command {
        return handle_init(force);
    }

    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load_or_create_default()?
    };

    match cli.command {
        Some(Commands::Init { .. }) => unreachable!("handled above"),
        Some(Commands::Config) => handle_show_config(&config),
        Some(Commands::ClearCache) => handle_clear_cache(&config),
        Some(Commands::Repos { refresh }) => handle_repos(&config, refresh).await,
        Some(Commands::Generate {
            ref repos,
            days,
            ref output,
        }) => {
            let days = days.unwrap_or(config.default_since_days);
            run_generation(&config, repos, days, output.as_deref()).await
        }
        Some(Commands::List { take }) => handle_list(&config, take),
        Some(Commands::Show { ref id }) => handle_show(&config, id),
        Some(Commands::Delete { ref id }) => handle_delete(&config, id),
        None => run_interactive(&config).await,
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("repo_pulse={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Interactive mode: pick repositories and a window, then generate
async fn run_interactive(config: &Config) -> Result<()> {
    println!("repo-pulse v{}", env!("CARGO_PKG_VERSION"));
    println!("AI-powered engineering summaries from recent GitHub activity\n");

    let listing = {
        let github = GitHubClient::new(config.get_github_token()?)?;
        let cache = repo_cache(config)?;
        cache.get(&github, false).await?
    };

    if listing.repos.is_empty() {
        println!("No repositories found for this account.");
        return Ok(());
    }

    println!("Your repositories:");
    for (i, repo) in listing.repos.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, repo);
    }
    println!();

    let selection = prompt_required(&format!(
        "Repositories to summarize (comma-separated numbers, up to {})",
        MAX_SELECTED_REPOS
    ))?;
    let repos = parse_selection(&selection, &listing.repos)?;

    let days_input = prompt_with_default("Days back", &config.default_since_days.to_string())?;
    let days: u32 = days_input
        .parse()
        .unwrap_or(config.default_since_days);

    run_generation(config, &repos, days, None).await
}

/// Run the pipeline and report the outcome
async fn run_generation(
    config: &Config,
    repos: &[String],
    days: u32,
    output: Option<&Path>,
) -> Result<()> {
    let orchestrator = Orchestrator::new(config.clone())?;

    println!("\n{}", "=".repeat(60));
    println!("Repositories: {}", repos.join(", "));
    println!("Window: {} days back", days);
    println!("{}\n", "=".repeat(60));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message("Fetching commits and generating summary...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let outcome = orchestrator.generate(repos, days).await;

    spinner.finish_and_clear();

    match outcome? {
        GenerationOutcome::Empty => {
            println!("No commits to summarize in the selected window.");
        }
        GenerationOutcome::Generated(insight) => {
            let markdown = insight.to_markdown();
            println!("{}", markdown);
            println!("Saved as: {}", insight.id);

            if let Some(path) = output {
                std::fs::write(path, &markdown)?;
                println!("Written to: {}", path.display());
            }
        }
    }

    Ok(())
}

async fn handle_repos(config: &Config, refresh: bool) -> Result<()> {
    let github = GitHubClient::new(config.get_github_token()?)?;
    let cache = repo_cache(config)?;

    let listing = cache.get(&github, refresh).await?;

    if listing.repos.is_empty() {
        println!("No repositories found for this account.");
        return Ok(());
    }

    for repo in &listing.repos {
        println!("{}", repo);
    }
    eprintln!(
        "\n{} repositories (listing age: {}h)",
        listing.repos.len(),
        listing.age().num_hours()
    );

    Ok(())
}

fn handle_list(config: &Config, take: usize) -> Result<()> {
    let store = InsightStore::new(&config.data_dir()?)?;
    let insights = store.list(take.min(100))?;

    if insights.is_empty() {
        println!("No insights stored yet. Run `repo-pulse generate` to create one.");
        return Ok(());
    }

    for insight in insights {
        println!(
            "{}  {}  [{}]  ${:.6}",
            insight.id,
            insight.created_at.format("%Y-%m-%d %H:%M"),
            insight.repos.join(", "),
            insight.cost_usd
        );
    }

    Ok(())
}

fn handle_show(config: &Config, id: &str) -> Result<()> {
    let store = InsightStore::new(&config.data_dir()?)?;

    match store.get(id)? {
        Some(insight) => {
            println!("{}", insight.to_markdown());
            Ok(())
        }
        None => Err(RepoPulseError::InsightNotFound(id.to_string())),
    }
}

fn handle_delete(config: &Config, id: &str) -> Result<()> {
    let store = InsightStore::new(&config.data_dir()?)?;

    if store.delete(id)? {
        println!("Deleted: {}", id);
        Ok(())
    } else {
        Err(RepoPulseError::InsightNotFound(id.to_string()))
    }
}

fn handle_init(force: bool) -> Result<()> {
    let config_path = Config::default_config_path()?;

    if config_path.exists() && !force {
        eprintln!("Config file already exists at: {}", config_path.display());
        eprintln!("Use --force to overwrite");
        std::process::exit(1);
    }

    Config::create_default()?;
    println!("Created config file at: {}", config_path.display());
    println!("\nTo authenticate, either:");
    println!("  1. Set the GITHUB_TOKEN and OPENAI_API_KEY environment variables");
    println!("  2. Add github_token and openai_api_key to the config file");

    Ok(())
}

fn handle_show_config(config: &Config) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("Current configuration:\n");
    println!("{}", toml_str);
    Ok(())
}

fn handle_clear_cache(config: &Config) -> Result<()> {
    let cache_dir = config.cache_dir()?;
    if cache_dir.exists() {
        std::fs::remove_dir_all(&cache_dir)?;
        println!("Cache cleared: {}", cache_dir.display());
    } else {
        println!("Cache directory does not exist");
    }
    Ok(())
}

fn repo_cache(config: &Config) -> Result<RepoCache> {
    let store = SledRepoStore::new(&config.cache_dir()?)?;
    Ok(RepoCache::new(Box::new(store), config.repo_cache_ttl_days))
}

/// Map a "1,3" style selection onto repository names
fn parse_selection(input: &str, repos: &[String]) -> Result<Vec<String>> {
    let mut selected = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let index: usize = part
            .parse()
            .map_err(|_| RepoPulseError::validation(format!("not a number: {}", part)))?;
        if index == 0 || index > repos.len() {
            return Err(RepoPulseError::validation(format!(
                "selection out of range: {}",
                index
            )));
        }

        let name = repos[index - 1].clone();
        if !selected.contains(&name) {
            selected.push(name);
        }
    }

    if selected.is_empty() {
        return Err(RepoPulseError::validation("no repositories selected"));
    }
    if selected.len() > MAX_SELECTED_REPOS {
        return Err(RepoPulseError::validation(format!(
            "at most {} repositories per run",
            MAX_SELECTED_REPOS
        )));
    }

    Ok(selected)
}

/// Prompt user with a default value (press Enter to accept default)
fn prompt_with_default(prompt: &str, default: &str) -> Result<String> {
    print!("{} [{}]: ", prompt, default);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input.to_string())
    }
}

/// Prompt user for required value (cannot be empty)
fn prompt_required(prompt: &str) -> Result<String> {
    loop {
        print!("{}: ", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_string();

        if !input.is_empty() {
            return Ok(input);
        }
        eprintln!("This field is required. Please enter a value.");
    }
}
