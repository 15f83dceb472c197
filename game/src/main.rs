use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use learn_ooxx::config::TrainingConfig;
use learn_ooxx::players::Marks;
use learn_ooxx::value_table::{value_table_from_disk_pickle, value_table_to_disk};
use std::fs::File;
use std::path::PathBuf;

/// Self-play TD learning for tic-tac-toe.
#[derive(Parser)]
#[command(name = "ooxx", about = "Train two tabular agents against each other")]
struct Cli {
    /// Log DEBUG to the terminal (per-game outcomes)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a self-play training session
    Train {
        /// JSON training config; defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override number of games
        #[arg(long)]
        games: Option<usize>,
        /// Override both agents' exploration rate
        #[arg(long)]
        epsilon: Option<f64>,
        /// Override both agents' learning rate
        #[arg(long)]
        alpha: Option<f64>,
        /// Override the game index at which exploration stops
        #[arg(long)]
        anneal_at: Option<usize>,
        /// Seed both agents' random sources
        #[arg(long)]
        seed: Option<u64>,
        /// Directory for value tables and rate curves
        #[arg(long, default_value = "value_table_archive")]
        out: PathBuf,
    },
    /// Play against a trained value table
    Play {
        /// Pickled value table written by `train`
        #[arg(long)]
        table: PathBuf,
        /// Which agent the table belongs to; agent a moves first
        #[arg(long, value_enum, default_value_t = Seat::A)]
        computer: Seat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Seat {
    A,
    B,
}

fn log(verbose: bool) -> Result<()> {
    std::fs::create_dir_all("logs").context("creating logs directory")?;
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = Local::now().format("%Y%m%d-%H%M%S");
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        File::create(format!("logs/{}.log", time)).context("creating log file")?,
    );
    let term = simplelog::TermLogger::new(
        if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        },
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).context("initializing logger")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    log(cli.verbose)?;
    match cli.command {
        Command::Train {
            config,
            games,
            epsilon,
            alpha,
            anneal_at,
            seed,
            out,
        } => {
            let mut config = match config {
                Some(path) => TrainingConfig::load(&path)
                    .with_context(|| format!("loading config from {}", path.display()))?,
                None => TrainingConfig::default(),
            };
            if let Some(games) = games {
                config.num_games = games;
            }
            if let Some(epsilon) = epsilon {
                config.epsilon_a = epsilon;
                config.epsilon_b = epsilon;
            }
            if let Some(alpha) = alpha {
                config.alpha_a = alpha;
                config.alpha_b = alpha;
            }
            if anneal_at.is_some() {
                config.anneal_at = anneal_at;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            let run = learn_ooxx::train_td_agents(&config)?;
            log::info!(
                "visited states | A {} | B {}",
                run.agent_a.visited(),
                run.agent_b.visited()
            );
            value_table_to_disk(&out, "agent-a", &run.agent_a)?;
            value_table_to_disk(&out, "agent-b", &run.agent_b)?;
            match run.rates() {
                Ok(curves) => {
                    let path = out.join(format!("rates-{}.json", Local::now().date_naive()));
                    curves.to_disk_json(&path)?;
                }
                Err(err) => log::warn!("skipping rate curves: {}", err),
            }
            Ok(())
        }
        Command::Play { table, computer } => {
            let table = value_table_from_disk_pickle(&table)
                .with_context(|| format!("loading value table from {}", table.display()))?;
            let mark = match computer {
                Seat::A => Marks::CROSS,
                Seat::B => Marks::NOUGHT,
            };
            let stdin = std::io::stdin();
            learn_ooxx::play_game_human_computer_player(
                table,
                mark,
                stdin.lock(),
                std::io::stdout(),
            )?;
            Ok(())
        }
    }
}
