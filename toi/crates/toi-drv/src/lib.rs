//! toi-drv — the `toi` command-line driver (spec §6, §7).
//!
//! Reads a script, runs it through the tree interpreter and the stack VM in
//! sequence, and treats any disagreement between their captured output as a
//! fatal error (spec §7, "dual-engine self-check"). With `-o`, also lowers
//! the parsed script to bytecode and writes it out in the line-oriented
//! format from spec §6.

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use toi_sem::CapturingHost;

#[derive(Debug, Parser)]
#[command(name = "toi", about = "Run a Toi script with both engines and compare their output")]
pub struct Cli {
    /// Path to a `.toi` script. Reads from standard input if omitted.
    pub script: Option<PathBuf>,

    /// Write the compiled bytecode program to this path (spec §6).
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,

    /// Enable debug-level tracing on stderr (also settable via `RUST_LOG`).
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ToiError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Lex(String),
    #[error(transparent)]
    Parse(#[from] toi_par::ParseError),
    #[error(transparent)]
    Compile(#[from] toi_mir::CompileError),
    #[error(transparent)]
    Interp(#[from] toi_sem::InterpError),
    #[error(transparent)]
    Vm(#[from] toi_runtime::RuntimeError),
    #[error(transparent)]
    Serialize(#[from] toi_mir::SerializeError),
    #[error(
        "the tree interpreter and the VM produced different output\n--- tree interpreter ---\n{tree}--- vm ---\n{vm}"
    )]
    EngineMismatch { tree: String, vm: String },
    #[error("{0:#}")]
    Context(#[from] anyhow::Error),
}

/// Installs a `tracing-subscriber` fmt layer writing to stderr. `--verbose`
/// forces debug level; otherwise `RUST_LOG` governs, falling back to `warn`.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Runs the full pipeline for `cli` and writes the canonical (agreed-upon)
/// output to stdout.
pub fn run(cli: Cli) -> Result<(), ToiError> {
    let (source, host_input) = load_source(&cli.script)?;

    tracing::debug!(bytes = source.len(), "lexing source");
    let (tokens, lex_errors) = toi_lex::tokenize(&source);
    if !lex_errors.is_empty() {
        let joined = lex_errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
        return Err(ToiError::Lex(joined));
    }

    tracing::debug!(tokens = tokens.len(), "parsing tokens");
    let block = toi_par::parse(tokens)?;

    tracing::debug!("running tree interpreter");
    let mut tree_host = CapturingHost {
        input: host_input.clone(),
        output: String::new(),
    };
    toi_sem::run(&block, &mut tree_host)?;

    tracing::debug!("compiling to bytecode");
    let program = toi_mir::compile(&block)?;

    tracing::debug!("running the stack vm");
    let mut vm_host = CapturingHost {
        input: host_input,
        output: String::new(),
    };
    toi_runtime::run_program(&program, &mut vm_host)?;

    if tree_host.output != vm_host.output {
        return Err(ToiError::EngineMismatch {
            tree: tree_host.output,
            vm: vm_host.output,
        });
    }

    if let Some(path) = &cli.out {
        tracing::debug!(path = %path.display(), "writing compiled program");
        let file = std::fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = std::io::BufWriter::new(file);
        toi_mir::write_program(&program, &mut writer)?;
    }

    std::io::stdout().write_all(tree_host.output.as_bytes())?;
    Ok(())
}

/// Loads the script source and the runtime input stream. With a script
/// path, standard input becomes the runtime input presented to the script;
/// with no script argument, standard input supplies the script itself and
/// there is no separate input stream left over for it to read (spec §6).
fn load_source(script: &Option<PathBuf>) -> Result<(String, String), ToiError> {
    match script {
        Some(path) => {
            let source = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok((source, input))
        }
        None => {
            let mut source = String::new();
            std::io::stdin().read_to_string(&mut source)?;
            Ok((source, String::new()))
        }
    }
}
