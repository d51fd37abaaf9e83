//! CLI frontend for the Gatekeeper condition toolkit.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gk",
    about = "Gatekeeper: reactive conditions over world-state flags",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log more detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a definition file
    Check {
        /// Definition file (JSON)
        file: PathBuf,
    },

    /// List the flags a definition declares
    Flags {
        /// Definition file (JSON)
        file: PathBuf,
    },

    /// Apply flag writes and events, then report condition results
    Eval {
        /// Definition file (JSON)
        file: PathBuf,

        /// Set a flag before evaluating (key=value)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        sets: Vec<String>,

        /// Raise a named event (name or name=value)
        #[arg(short, long = "raise", value_name = "EVENT[=VALUE]")]
        raises: Vec<String>,

        /// Force a condition towards fulfillment
        #[arg(short, long = "force", value_name = "CONDITION")]
        forces: Vec<String>,

        /// Conditions to watch (default: every root condition)
        #[arg(short, long = "watch", value_name = "CONDITION")]
        watches: Vec<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { file } => commands::check::run(&file),
        Commands::Flags { file } => commands::flags::run(&file),
        Commands::Eval {
            file,
            sets,
            raises,
            forces,
            watches,
            json,
        } => commands::eval::run(
            &file,
            &commands::eval::Actions {
                sets,
                raises,
                forces,
                watches,
            },
            json,
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

/// Warnings are always shown; each `-v` lowers the threshold one level.
fn init_logging(verbose: u8) {
    use log::LevelFilter;
    use std::io::Write;

    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}
