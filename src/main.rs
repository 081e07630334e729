#[cfg(not(feature = "cli"))]
compile_error!("The `redoscope` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;

use redoscope::cli;
use redoscope::cli::app::{Cli, ColorMode, Commands};
use redoscope::RedoError;

fn main() {
    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {} // colored auto-detects tty
    }

    let writer_result: Result<Box<dyn Write>, RedoError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| RedoError::Io(format!("Cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };

    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Records {
            file,
            format,
            limit,
            max_records,
            op,
            verbose,
            no_heuristics,
            json,
            csv,
        } => cli::records::execute(
            &cli::records::RecordsOptions {
                file,
                format: cli::log_format(format),
                limit,
                max_records,
                op: cli::op_class(op),
                verbose,
                no_heuristics,
                json,
                csv,
            },
            &mut writer,
        ),

        Commands::Header { file, format, json } => cli::header::execute(
            &cli::header::HeaderOptions {
                file,
                format: cli::log_format(format),
                json,
            },
            &mut writer,
        ),

        Commands::Blocks {
            file,
            blocks,
            no_empty,
            verbose,
            json,
        } => cli::blocks::execute(
            &cli::blocks::BlocksOptions {
                file,
                blocks,
                no_empty,
                verbose,
                json,
            },
            &mut writer,
        ),

        Commands::Search { file, text, format } => cli::search::execute(
            &cli::search::SearchOptions {
                file,
                text,
                format: cli::log_format(format),
            },
            &mut writer,
        ),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "redoscope", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
