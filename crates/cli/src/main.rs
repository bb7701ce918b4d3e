//! skt CLI
//!
//! Driver over the compiler pipeline: tokenize, parse, or run a `.skt`
//! program. Diagnostics go to stderr as `line:col: kind: message`; their
//! presence never changes the exit code. The process exits non-zero only
//! on I/O failure or when a `run` stops abnormally.

mod outline;
mod stdio_hooks;

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{generate, Shell};
use sktc::semantic::Severity;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(ClapParser)]
#[command(name = "skt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "skt compiler and P-code VM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize a .skt file and print the token listing
    Tokens {
        /// Input .skt source file
        input: PathBuf,

        /// Print the tokens as JSON instead of the plain listing
        #[arg(long)]
        json: bool,

        /// Also write the .sktt sidecar next to the source
        #[arg(long)]
        sidecar: bool,
    },

    /// Parse a .skt file and print the syntax tree outline
    Parse {
        /// Input .skt source file
        input: PathBuf,
    },

    /// Run semantic analysis and print the symbol table
    Check {
        /// Input .skt source file
        input: PathBuf,
    },

    /// Compile a .skt file and execute it on the VM
    Run {
        /// Input .skt source file
        input: PathBuf,

        /// Print the P-code listing before executing
        #[arg(long)]
        emit_pcode: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tokens {
            input,
            json,
            sidecar,
        } => run_tokens(&input, json, sidecar),
        Commands::Parse { input } => run_parse(&input),
        Commands::Check { input } => run_check(&input),
        Commands::Run { input, emit_pcode } => run_run(&input, emit_pcode),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "skt", &mut io::stdout());
        }
    }
}

fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: failed to read '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn run_tokens(input: &Path, json: bool, sidecar: bool) {
    let source = read_source(input);
    let (tokens, errors) = sktc::tokenize(&source);

    if json {
        match serde_json::to_string_pretty(&tokens) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: failed to serialize tokens: {}", e);
                process::exit(1);
            }
        }
    } else {
        for token in &tokens {
            println!(
                "{}:{}-{}:{}\t{}\t{}",
                token.span.line,
                token.span.column,
                token.span.end_line,
                token.span.end_column,
                token.kind,
                token.lexeme.escape_default()
            );
        }
    }

    for error in &errors {
        eprintln!(
            "{}:{}: {}: {}",
            error.span.line, error.span.column, error.kind, error.message
        );
    }

    if sidecar {
        let path = input.with_extension("sktt");
        if let Err(e) = sktc::write_token_file(&path, &tokens) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_parse(input: &Path) {
    let source = read_source(input);
    let (tokens, lex_errors) = sktc::tokenize(&source);
    let (ast, parse_errors) = sktc::parse(&tokens);

    for error in &lex_errors {
        eprintln!(
            "{}:{}: {}: {}",
            error.span.line, error.span.column, error.kind, error.message
        );
    }
    for error in &parse_errors {
        eprintln!("{}:{}: {}: {}", error.line, error.column, error.kind, error.message);
    }

    match ast {
        Some(program) => print!("{}", outline::render(&program)),
        None => eprintln!("no syntax tree produced"),
    }
}

fn run_check(input: &Path) {
    let source = read_source(input);
    let result = sktc::compile(&source);
    report_diagnostics(&result);

    if let Some(analysis) = &result.analysis {
        println!("symbols:");
        for entry in analysis.symbols.entries() {
            println!(
                "  {}:{}\t{}\t{}\t{}{}",
                entry.line,
                entry.column,
                entry.name,
                entry.declared_type,
                entry.scope,
                if entry.initialized { "" } else { "\t(never assigned)" }
            );
        }
    }
}

fn run_run(input: &Path, emit_pcode: bool) {
    let source = read_source(input);
    let result = sktc::compile(&source);
    report_diagnostics(&result);

    if let Some(e) = &result.codegen_error {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    let Some(program) = &result.program else {
        // diagnostics already explained why; not an I/O failure
        return;
    };

    if emit_pcode {
        print!("{}", program);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    register_cancel_on_interrupt(&cancel);

    let mut hooks = stdio_hooks::StdioHooks::new();
    let outcome = skt_vm::execute(program, &mut hooks, Some(&*cancel));
    if !outcome.success {
        if let Some(message) = outcome.error {
            eprintln!("Error: {}", message);
        }
        process::exit(1);
    }
}

#[cfg(unix)]
fn register_cancel_on_interrupt(cancel: &Arc<AtomicBool>) {
    if let Err(e) = signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(cancel)) {
        eprintln!("warning: could not install SIGINT handler: {}", e);
    }
}

#[cfg(not(unix))]
fn register_cancel_on_interrupt(_cancel: &Arc<AtomicBool>) {}

/// Print every stage's diagnostics as `line:col: kind: message`.
fn report_diagnostics(result: &sktc::CompileResult) {
    for error in &result.lex_errors {
        eprintln!(
            "{}:{}: {}: {}",
            error.span.line, error.span.column, error.kind, error.message
        );
    }
    for error in &result.parse_errors {
        eprintln!("{}:{}: {}: {}", error.line, error.column, error.kind, error.message);
    }
    if let Some(analysis) = &result.analysis {
        for error in &analysis.errors {
            let level = match error.severity {
                Severity::Error => "",
                Severity::Warning => "warning: ",
            };
            eprintln!(
                "{}:{}: {}{}: {}",
                error.line, error.column, level, error.kind, error.message
            );
        }
    }
}
