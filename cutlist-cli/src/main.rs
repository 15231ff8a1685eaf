// cutlist-cli/src/main.rs
//
// Entry point for the `cutlist` binary.
//
// Responsibilities include:
// - Parsing user-provided arguments.
// - Setting up console or file logging.
// - Dispatching to the command implementations in `commands`.
// - Printing errors and managing the process exit code.

use clap::Parser;
use cutlist_cli::error::CliResult;
use cutlist_cli::{Cli, Commands, logging, output};
use std::process;

fn run(cli: Cli) -> CliResult<()> {
    let log_file = logging::init_logging(cli.command.name(), cli.verbose, cli.log_dir.as_deref())?;
    if let Some(path) = &log_file {
        output::print_status("Log file", &path.display().to_string(), false);
    }

    match cli.command {
        Commands::Render(args) => {
            let output_path = cutlist_cli::run_render(args)?;
            println!("{}", output_path.display());
        }
        Commands::Silence(args) => println!("{}", cutlist_cli::run_silence(&args)?),
        Commands::Normalize(args) => println!("{}", cutlist_cli::run_normalize(&args)?),
        Commands::Probe(args) => println!("{}", cutlist_cli::run_probe(&args)?),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{e}");
        output::print_error(&e.to_string());
        process::exit(1);
    }
}
