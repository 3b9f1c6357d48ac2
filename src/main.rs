use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

mod compiler;
mod emitter;
mod error;
mod labels;
mod lexer;
mod parser;
mod symbols;

use crate::error::CompileResult;

/// Compiler for the imp teaching language, targeting a textual stack VM.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Source file to compile
    input: PathBuf,

    /// Output file; `-` writes to stdout. Defaults to the input path with
    /// a `.vm` extension.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> CompileResult<()> {
    let source = fs::read_to_string(&args.input)?;
    let module = args
        .input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "input file needs a UTF-8 name"))?;

    log::debug!("compiling {} as module `{}`", args.input.display(), module);
    let code = compiler::compile(&source, module)?;
    log::debug!("generated {} instructions", code.lines().count());

    match &args.output {
        Some(path) if path.as_os_str() == "-" => print!("{code}"),
        Some(path) => fs::write(path, &code)?,
        None => fs::write(args.input.with_extension("vm"), &code)?,
    }
    Ok(())
}
