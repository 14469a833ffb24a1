use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use lillian_core::{CoreError, Interpreter, ParseConfig, render_tokens, tokenize};
use tracing::Level;

/// Run a Lillian script.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Script to run; read from stdin when omitted.
    #[arg(short, long, value_name = "PATH")]
    input: Option<String>,

    #[arg(long, help = "Print the token stream instead of running the script")]
    tokens: bool,

    #[arg(
        long,
        value_name = "N",
        default_value_t = ParseConfig::default().max_depth,
        help = "Maximum expression nesting accepted by the parser"
    )]
    max_depth: usize,

    /// Increase log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<()> {
    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {path}"))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read script from stdin")?;
            buffer
        }
    };

    if cli.tokens {
        let tokens = tokenize(&source)?;
        println!("{}", render_tokens(&tokens));
        return Ok(());
    }

    let config = ParseConfig {
        max_depth: cli.max_depth,
    };
    let value = Interpreter::new().with_config(config).run(&source)?;
    if !value.is_unit() {
        println!("{value}");
    }
    Ok(())
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<CoreError>() {
        Some(core) => eprintln!("Error: {}\n  {core}", core.kind()),
        None => eprintln!("Error: {err:#}"),
    }
}
