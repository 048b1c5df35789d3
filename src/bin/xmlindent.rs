//! Re-indents XML files.
//!
//! Reads each file (or stdin), re-emits it with consistent indentation on
//! stdout, and reports parse errors with their position.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use xmlquill::indent::indent_with;
use xmlquill::parser::ParseOptions;
use xmlquill::sax::{parse_sax, DefaultHandler, LoggingHandler};

/// xmlindent -- re-indent well-formed XML.
#[derive(Parser, Debug)]
#[command(name = "xmlindent", version, about, long_about = None)]
struct Cli {
    /// XML files to process (none or `-` for stdin).
    files: Vec<String>,

    /// Number of spaces per indentation level.
    #[arg(long, value_name = "N", default_value_t = 2, conflicts_with = "tab")]
    indent: usize,

    /// Indent with tabs instead of spaces.
    #[arg(long)]
    tab: bool,

    /// Only check that the input is well-formed; print nothing.
    #[arg(long)]
    check: bool,

    /// Log reader events (repeat for more detail). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn unit(&self) -> String {
        if self.tab {
            "\t".to_string()
        } else {
            " ".repeat(self.indent)
        }
    }
}

const OK: u8 = 0;
const NOT_WELL_FORMED: u8 = 1;
const IO_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let files = if cli.files.is_empty() {
        vec!["-".to_string()]
    } else {
        cli.files.clone()
    };

    let status = files.iter().map(|file| run(&cli, file)).max().unwrap_or(OK);
    ExitCode::from(status)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli, filename: &str) -> u8 {
    let input = match load(filename) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{filename}: cannot read: {e}");
            return IO_FAILURE;
        }
    };
    tracing::debug!(filename, bytes = input.len(), "read input");

    if cli.check {
        let mut handler = LoggingHandler::new(DefaultHandler);
        return match parse_sax(&input, &ParseOptions::default(), &mut handler) {
            Ok(()) => OK,
            Err(e) => {
                eprintln!("{filename}: {e}");
                NOT_WELL_FORMED
            }
        };
    }

    match indent_with(&input, &cli.unit()) {
        Ok(output) => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = stdout.write_all(output.as_bytes()) {
                eprintln!("cannot write output: {e}");
                return IO_FAILURE;
            }
            OK
        }
        Err(e) => {
            eprintln!("{filename}: {e}");
            NOT_WELL_FORMED
        }
    }
}

fn load(filename: &str) -> io::Result<String> {
    if filename != "-" {
        return fs::read_to_string(filename);
    }
    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    Ok(text)
}
