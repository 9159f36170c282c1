use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use poke_search::app::{App, SearchOutcome};
use poke_search::cache::Cache;
use poke_search::config::ConfigLoader;
use poke_search::domain::ThemeMode;
use poke_search::error::SearchError;
use poke_search::output::{AlertOutput, JsonOutput, OutputMode};
use poke_search::pokeapi::{CatalogClient, PokeApiHttpClient};
use poke_search::store::EntityStore;
use poke_search::tui::Tui;

#[derive(Parser)]
#[command(name = "poke-search")]
#[command(about = "Search the PokeAPI creature catalog, with a local response cache")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    theme: Option<ThemeMode>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Look up one entity by name, or load the default list when NAME is omitted")]
    Search(SearchArgs),
    #[command(about = "Clear the local response cache")]
    Clear,
}

#[derive(Args)]
struct SearchArgs {
    name: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<SearchError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SearchError) -> u8 {
    match error {
        SearchError::NotFound { .. }
        | SearchError::InvalidInput(_)
        | SearchError::InvalidEntityId(_) => 2,
        SearchError::Http(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }

    let cache = Cache::open(config.cache_dir.clone())?;
    let client = PokeApiHttpClient::new(config.endpoints.clone())?;
    let app = App::new(cache, client, &config);
    let mut store = EntityStore::new();

    match cli.command {
        Some(Commands::Search(args)) => run_search(&app, &mut store, args, output_mode),
        Some(Commands::Clear) => run_clear(&app, &mut store, output_mode),
        None => match output_mode {
            OutputMode::Interactive => {
                let mut tui = Tui::new(config.theme, config.placeholder.clone());
                tui.run(&app, &mut store)
            }
            OutputMode::NonInteractive => Err(miette::Report::msg(
                "command required (try `poke-search search --help`)",
            )),
        },
    }
}

fn run_search<C: CatalogClient>(
    app: &App<C>,
    store: &mut EntityStore,
    args: SearchArgs,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let input = args.name.unwrap_or_default();
    match output_mode {
        OutputMode::NonInteractive => {
            let outcome = app.submit(&input, store, &JsonOutput)?;
            JsonOutput::print_search(&outcome).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let outcome = app.submit(&input, store, &AlertOutput)?;
            print_search_summary(&outcome, store);
        }
    }
    Ok(())
}

fn run_clear<C: CatalogClient>(
    app: &App<C>,
    store: &mut EntityStore,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let result = app.clear_all(store, &JsonOutput)?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_clear(&result).into_diagnostic()?,
        OutputMode::Interactive => println!(
            "Cleared {} cache entries from {}",
            result.removed_entries,
            app.cache().root()
        ),
    }
    Ok(())
}

fn print_search_summary(outcome: &SearchOutcome, store: &EntityStore) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}POKE-SEARCH summary{reset}");
    println!("{green}Found: {}{reset}", store.len());
    println!("{yellow}Errors: {}{reset}", outcome.failures.len());

    for entity in store.entities() {
        println!("{cyan}{} ({}){reset}", entity.name(), entity.id());
        println!("   Forms amount: {}", entity.forms_amount());
        println!("   Forms names: {}", entity.forms_names());
        if let Some(url) = entity.image_url() {
            println!("   Image: {url}");
        }
    }
    for failure in &outcome.failures {
        println!("{yellow}   {}: {}{reset}", failure.target, failure.message);
    }
}
