//! dashc command-line tool
//!
//! Packs a Python file or directory into a single `python -c '...'` line,
//! and reads such lines back.

mod commands;
mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use dashc_build::shell::DEFAULT_SHEBANG;
use dashc_build::BuildError;

use crate::output::{resolve_color_choice, StyledOutput};

/// Exit status for build-time failures.
const EXIT_BUILD_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "dashc")]
#[command(about = "Pack Python code into one self-contained python -c invocation", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto", value_parser = ["auto", "always", "never"])]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a one-line invocation for a file or directory
    Build {
        /// Source file or directory
        source: PathBuf,

        /// Entry point: `pkg.module` or `pkg.module:function`
        #[arg(short, long)]
        entrypoint: Option<String>,

        /// Archive compression: stored, deflate, bzip2 or lzma
        #[arg(short, long)]
        compression: Option<String>,

        /// Archive compression level
        #[arg(short, long, allow_negative_numbers = true)]
        level: Option<i64>,

        /// Write an executable script instead of printing the line
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Embed the program as an escaped literal instead of compressed
        #[arg(long)]
        plain: bool,

        /// Print a script with this shebang (default: /usr/bin/env bash)
        #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_SHEBANG)]
        shebang: Option<String>,

        /// Interpreter named in the generated line
        #[arg(long)]
        python: Option<String>,

        /// Skip syntax pre-flight checks
        #[arg(long)]
        no_check: bool,

        /// Configuration file (default: ./dashc.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show what a generated line or script contains
    Inspect {
        /// Generated script or line, `-` for stdin
        file: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let mut out = StyledOutput::new(resolve_color_choice(Some(&cli.color)));

    let result = match cli.command {
        Commands::Build {
            source,
            entrypoint,
            compression,
            level,
            output,
            plain,
            shebang,
            python,
            no_check,
            config,
        } => commands::build::execute(
            commands::build::BuildArgs {
                source,
                entrypoint,
                compression,
                level,
                output,
                plain,
                shebang,
                python,
                no_check,
                config,
            },
            &mut out,
        ),
        Commands::Inspect { file } => commands::inspect::execute(&file, &mut out),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            out.error(&format!("{:#}", err));
            if err.downcast_ref::<BuildError>().is_some() {
                ExitCode::from(EXIT_BUILD_ERROR)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
