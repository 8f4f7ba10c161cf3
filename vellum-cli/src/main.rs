//! Thin driver binary: reads the config record, then either lexes/parses
//! a vellum source file (reporting diagnostics) or loads an already
//! assembled program image and runs it to completion. Downstream code
//! generation bridging the two is out of scope for the core, so this
//! binary never does both in one invocation.

mod config;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::{load_file_config, Cli, Config, FileConfig};
use vellum::{Diagnostic, DiagnosticCode};
use vellum_asm::{Listing, ListingKind, ListingLine};
use vellum_vm::{Instruction, Terp, INSTRUCTION_BYTES};

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INTERNAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .init();
    }

    let file_config = match &cli.config {
        Some(path) => match load_file_config(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{}", err);
                return ExitCode::from(EXIT_ERROR);
            }
        },
        None => FileConfig::default(),
    };
    let config = Config::resolve(&cli, file_config);

    let result = if cli.run { run_program(&cli, &config) } else { compile_source(&cli) };

    match result {
        Ok(true) => ExitCode::from(EXIT_SUCCESS),
        Ok(false) => ExitCode::from(EXIT_ERROR),
        Err(message) => {
            eprintln!("internal error: {}", message);
            ExitCode::from(EXIT_INTERNAL)
        }
    }
}

/// Reads `path` as bytes and decodes it as UTF-8, surfacing both an I/O
/// failure and an illegal encoding as a `Diagnostic` rather than a bare
/// string, since a `String` can never itself carry invalid UTF-8.
fn load_source_text(path: &std::path::Path) -> Result<String, Diagnostic> {
    let bytes = std::fs::read(path).map_err(|err| {
        Diagnostic::error(
            DiagnosticCode::UnableToOpenFile,
            format!("unable to open {}: {}", path.display(), err),
        )
    })?;
    String::from_utf8(bytes).map_err(|err| {
        let offset = err.utf8_error().valid_up_to();
        Diagnostic::error(
            DiagnosticCode::IllegalUtf8Encoding,
            format!("illegal UTF-8 sequence at byte offset {}", offset),
        )
    })
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    eprintln!("{}[{}]: {}", diagnostic.severity, diagnostic.code, diagnostic.message);
}

/// Lexes and parses `cli.input_path`, printing any diagnostics. Returns
/// `Ok(true)` when compilation produced no error-severity diagnostic.
fn compile_source(cli: &Cli) -> Result<bool, String> {
    let text = match load_source_text(&cli.input_path) {
        Ok(text) => text,
        Err(diagnostic) => {
            print_diagnostic(&diagnostic);
            return Ok(false);
        }
    };
    let name = cli.input_path.to_string_lossy().into_owned();

    let mut session = vellum::Session::new(name, text);
    let _parsed = session.compile();

    if session.had_error() {
        eprint!("{}", session.render_diagnostics());
        Ok(false)
    } else {
        Ok(true)
    }
}

/// Loads `cli.input_path` as a raw, already assembled program image and
/// runs it to completion, optionally printing a disassembly listing
/// first when `--debug-listing` is set.
fn run_program(cli: &Cli, config: &Config) -> Result<bool, String> {
    let program = std::fs::read(&cli.input_path).map_err(|err| err.to_string())?;

    let mut terp = Terp::new(config.heap_size, config.stack_size);
    terp.load_program(&program);

    if config.debug_listing {
        let listing = disassemble(&program, terp.heap_vector(vellum_vm::HeapVector::ProgramStart));
        print_listing(&listing);
    }

    let exit_code = terp.run().map_err(|err| err.to_string())?;
    println!("exit: {:?}", exit_code);
    Ok(exit_code == vellum_vm::ExitCode::Halted)
}

fn disassemble(program: &[u8], base_address: u32) -> Listing {
    let mut listing = Listing::new();
    let mut offset = 0usize;
    while offset < program.len() {
        let remaining = &program[offset..];
        let instr = match Instruction::decode(remaining) {
            Some(instr) => instr,
            None => break,
        };
        listing.push(ListingLine {
            address: base_address + offset as u32,
            source: format!("{:?}", instr),
            kind: ListingKind::Instruction,
        });
        offset += instr.encoded_len().max(INSTRUCTION_BYTES);
    }
    listing
}

fn print_listing(listing: &Listing) {
    for line in listing.lines() {
        println!("{:08x}  {}", line.address, line.source);
    }
}
