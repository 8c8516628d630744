//! Command line entry point.
//!
//! Reads a module, analyzes it, and writes the two output files. Diagnostic
//! blocks go to stderr.

use clap::Parser;
use memcheck::core::{Config, PROJECT_ROOT_ENV};
use memcheck::driver;
use memcheck::text_ir::{TextIR, TextIRAdaptor};
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "memcheck")]
#[command(about = "Count loads, stores and bytes per user function of a compiled module")]
#[command(version)]
struct Cli {
    /// Module to analyze (.tir, or .ll/.bc with the llvm feature)
    input: PathBuf,

    /// Only functions whose source file lies under this path are analyzed
    #[arg(long, env = PROJECT_ROOT_ENV)]
    project_root: Option<String>,

    /// Directory receiving the CSV and JSON files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Print the parsed text IR to stdout before analyzing
    #[arg(long)]
    print_ir: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::new()
        .with_project_root(cli.project_root.clone())
        .with_output_dir(&cli.output_dir);

    match extension(&cli.input) {
        "ll" | "bc" => run_llvm(&cli, &config),
        _ => run_text_ir(&cli, &config),
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|ext| ext.to_str()).unwrap_or("")
}

fn run_text_ir(cli: &Cli, config: &Config) -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(&cli.input)?;
    let ir = TextIR::parse(&text)?;
    if cli.print_ir {
        print!("{}", ir.print());
    }

    let summary = driver::run(&TextIRAdaptor::new(&ir), config, &mut io::stderr())?;
    log::debug!("{} instruction walk(s)", summary.walks);
    Ok(())
}

#[cfg(feature = "llvm")]
fn run_llvm(cli: &Cli, config: &Config) -> Result<(), Box<dyn Error>> {
    use inkwell::context::Context;
    use memcheck::llvm::{load_module, LlvmAdaptor};

    let context = Context::create();
    let module = load_module(&context, &cli.input)?;
    if cli.print_ir {
        print!("{}", module.print_to_string().to_string());
    }

    let summary = driver::run(&LlvmAdaptor::new(&module), config, &mut io::stderr())?;
    log::debug!("{} instruction walk(s)", summary.walks);
    Ok(())
}

#[cfg(not(feature = "llvm"))]
fn run_llvm(cli: &Cli, _config: &Config) -> Result<(), Box<dyn Error>> {
    Err(format!(
        "{}: LLVM input requires memcheck to be built with the `llvm` feature",
        cli.input.display()
    )
    .into())
}
