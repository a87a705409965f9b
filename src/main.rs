//! The main entry point for the `keysweep` command-line application.
//!
//! Parses arguments, sets up logging and hands the request to the library.

use keysweep::cli::{self, Args};
use keysweep::errors::Result;
use keysweep::output_formatter::OutputFormat;
use keysweep::pipeline;
use std::env;
use std::io::{self, IsTerminal, Write};
use std::process;
use tracing_subscriber::filter::EnvFilter;

fn main() {
    if env::args().len() == 1 {
        println!("Search a project for a literal keyword, optionally replacing it\n");
        println!("QUICK START EXAMPLES:");
        println!("  keysweep OldName                       # Search the current project");
        println!("  keysweep OldName --replace NewName     # Replace everywhere");
        println!("  keysweep Helper --vendor --storage     # Include vendor and storage");
        println!("  keysweep OldName -d ~/app -f json      # JSON report for another root\n");
        println!("Run 'keysweep --help' for the full option list");
        process::exit(0);
    }

    let args = cli::parse_args();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    let settings = args.load_settings()?;
    let (request, mut options) = args.resolve(settings);
    options.color = options.color && io::stdout().is_terminal();

    let mut out = io::stdout();
    let mut notices: Box<dyn Write> = if options.format == OutputFormat::Text {
        Box::new(io::stdout())
    } else {
        Box::new(io::stderr())
    };

    pipeline::run_search(&request, &options, &mut out, &mut notices)?;
    Ok(())
}
