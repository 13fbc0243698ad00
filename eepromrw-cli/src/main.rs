//! eepromrw CLI - write and read EEPROM chips over a serial supervisor.
//!
//! ## Features
//!
//! - Write a binary image file to a chip
//! - Read a chip back into a file
//! - List supported chips and available serial ports
//! - Shell completion generation
//! - Environment variable support

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use console::style;
use env_logger::Env;
use eepromrw::{Chip, Error};
use log::debug;
use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Whether stderr is a terminal (set once at startup).
static STDERR_IS_TTY: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Check if animations should be used (TTY and colors enabled).
fn use_fancy_output() -> bool {
    STDERR_IS_TTY.load(std::sync::atomic::Ordering::Relaxed) && console::colors_enabled_stderr()
}

mod commands;

use commands::{cmd_chips, cmd_ports, cmd_read, cmd_write};

/// eepromrw - A simple EEPROM writing and reading tool.
///
/// Environment variables:
///   EEPROMRW_PORT   - Default serial port
///   EEPROMRW_CHIP   - Default chip name (e.g. 24AA512)
#[derive(Parser)]
#[command(name = "eepromrw")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = "For more information, visit: https://github.com/EnWaffel/eepromrw")]
struct Cli {
    /// Serial port of the controller (e.g. /dev/ttyUSB0, COM3).
    #[arg(short, long, global = true, env = "EEPROMRW_PORT")]
    port: Option<String>,

    /// Target chip, e.g. 24AA512.
    #[arg(short, long, global = true, env = "EEPROMRW_CHIP", value_parser = parse_chip)]
    chip: Option<Chip>,

    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Write a binary image file to an EEPROM chip.
    Write {
        /// Image file to write.
        file: PathBuf,
    },

    /// Read bytes from an EEPROM chip into a file.
    Read {
        /// Output file for the received image.
        file: PathBuf,

        /// Number of bytes to read.
        #[arg(short = 's', long = "size")]
        size: usize,
    },

    /// List supported chips.
    Chips {
        /// Output the chip list as JSON to stdout.
        #[arg(long)]
        json: bool,
    },

    /// List available serial ports.
    Ports {
        /// Output the port list as JSON to stdout.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type for completions.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse a chip name into a supported chip.
fn parse_chip(s: &str) -> Result<Chip, String> {
    s.parse::<Chip>()
        .map_err(|e| format!("{e}; run `eepromrw chips` for the supported set"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // --- NO_COLOR and TTY detection (clig.dev best practice) ---
    let stderr_is_tty = console::Term::stderr().is_term();
    STDERR_IS_TTY.store(stderr_is_tty, std::sync::atomic::Ordering::Relaxed);

    if env::var("NO_COLOR").is_ok() || !stderr_is_tty {
        // Disable all color output
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    // Setup logging based on verbosity
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(None)
        .init();

    debug!(
        "eepromrw v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", style("Error:").red().bold());
            ExitCode::from(exit_code_for(&err))
        },
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Write { file } => cmd_write(cli, file),
        Commands::Read { file, size } => cmd_read(cli, file, *size),
        Commands::Chips { json } => cmd_chips(*json),
        Commands::Ports { json } => cmd_ports(*json),
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            Ok(())
        },
    }
}

/// Generate completions for the given shell on stdout.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// One exit code per fatal transfer failure kind.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>() {
        Some(Error::PortNotFound(_)) => 10,
        Some(Error::Serial(_) | Error::Io(_)) => 11,
        Some(Error::Timeout(_)) => 12,
        Some(Error::HandshakeRejected) => 13,
        Some(Error::ChunkRejected(_)) => 14,
        Some(Error::RetryExhausted { .. }) => 15,
        Some(Error::ShortRead { .. }) => 16,
        _ => 1,
    }
}
