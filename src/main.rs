use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser as ClapParser;

use rlox::lox::Lox;

/// Tree-walking Lox interpreter.  With a script path, runs the file and
/// exits; without one, starts a REPL.
#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Lox source file to run
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,

        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(());
        }

        Err(_) => {
            println!("Usage: jlox [script]");
            process::exit(64);
        }
    };

    let mut lox = Lox::new();

    match args.script {
        Some(path) => {
            lox.run_file(&path)?;

            if lox.had_error() {
                process::exit(65);
            }

            if lox.had_runtime_error() {
                process::exit(70);
            }
        }

        None => lox.run_prompt(),
    }

    Ok(())
}
