mod cities;
mod config;
mod error;
mod games;

use clap::{Parser, Subcommand};
use config::Config;
use error::{GameError, Result};
use games::Summary;
use games::corridor::{Level, Speed};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "memory-games", version, about = "Memory mini-games for the terminal")]
struct Cli
{
    /// Config file (defaults to $MEMORY_GAMES_CONFIG or ~/.memory-games/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command
{
    /// List the available games.
    List,
    /// Number sequence recall.
    Sequence,
    /// Audio/visual corridor instruction recall.
    Corridor
    {
        #[arg(long, value_enum)]
        level: Option<Level>,
        #[arg(long, value_enum)]
        speed: Option<Speed>,
    },
}

fn main()
{
    init_logging();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so they never interleave with the game screen on stdout.
/// `RUST_LOG` sets the filter; `MEMORY_GAMES_LOG_FORMAT=json` switches to JSON lines.
fn init_logging()
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if std::env::var("MEMORY_GAMES_LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn run(cli: Cli) -> Result<()>
{
    if let Some(Command::List) = cli.command {
        list_games();
        return Ok(());
    }

    let config = config::load(cli.config.as_deref())?;
    match cli.command {
        None => interactive_menu(&config),
        Some(Command::List) => Ok(()),
        Some(Command::Sequence) => run_game("sequence", &config),
        Some(Command::Corridor { level, speed }) => {
            let config = Config {
                level: level.unwrap_or(config.level),
                speed: speed.unwrap_or(config.speed),
                ..config
            };
            run_game("corridor", &config)
        }
    }
}

fn run_game(name: &str, config: &Config) -> Result<()>
{
    let summary = match name {
        "sequence" => games::sequence::run(config.sequence)?,
        "corridor" => games::corridor::run(
            &config.cities,
            config.level,
            config.speed,
            config.corridor,
        )?,
        _ => return Err(GameError::UnknownGame(name.to_string())),
    };
    print_summary(&summary);
    Ok(())
}

fn interactive_menu(config: &Config) -> Result<()>
{
    let registry = games::registry();
    println!("Memory Max");
    println!();
    println!("Select a game:");
    for (idx, game) in registry.iter().enumerate() {
        println!("  {}. {} - {}", idx + 1, game.name, game.description);
    }
    println!();
    print!("Enter number or name (default 1, q to quit): ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let choice = input.trim();

    if choice.is_empty() {
        return run_game(registry[0].name, config);
    }
    if choice.eq_ignore_ascii_case("q") {
        return Ok(());
    }
    if let Ok(index) = choice.parse::<usize>() {
        if index >= 1 && index <= registry.len() {
            return run_game(registry[index - 1].name, config);
        }
    }

    match games::find(choice) {
        Some(name) => run_game(name, config),
        None => Err(GameError::UnknownGame(choice.to_string())),
    }
}

fn list_games()
{
    println!("Available games:");
    for game in games::registry() {
        println!("  {:<10} - {}", game.name, game.description);
    }
}

fn print_summary(summary: &Summary)
{
    println!("Game over: {}", summary.game);
    println!("  Rounds played: {}", summary.rounds);
    println!("  Score: {}", summary.score);
}
