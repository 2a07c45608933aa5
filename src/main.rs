use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Result, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

use gpc::Toolchain;
use gpc::assembler::AssemblerRules;
use gpc::ast::ParseNode;
use gpc::cipher;
use gpc::config::Resources;
use gpc::interpreter::{Interpreter, StdHost};
use gpc::parser;

/// gpc runs programs written in a language defined by a token table and a
/// grammar loaded at startup.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding tokens.list, grammar.list and assemble.list.
    #[arg(long, global = true, value_name = "DIR")]
    config: Option<PathBuf>,

    /// Token table to use instead of the bundled one.
    #[arg(long, global = true, value_name = "FILE")]
    tokens: Option<PathBuf>,

    /// Grammar to use instead of the bundled one.
    #[arg(long, global = true, value_name = "FILE")]
    grammar: Option<PathBuf>,

    /// Assembler templates to use instead of the bundled ones.
    #[arg(long = "assemble", global = true, value_name = "FILE")]
    assembler: Option<PathBuf>,

    /// Log more. Repeat for more detail. RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interpret a program.
    Run { file: PathBuf },
    /// Render a program through the assembler templates.
    Assemble {
        file: PathBuf,
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the tokens of a program.
    Tokens { file: PathBuf },
    /// Print the parse tree of a program.
    Tree { file: PathBuf },
    /// Encode text as a character literal body.
    Encode { text: String },
    /// Decode a character literal body.
    Decode { text: String },
}

impl Cli {
    fn resources(&self) -> Resources {
        let base = match &self.config {
            Some(dir) => Resources::from_dir(dir),
            None => Resources::default(),
        };
        base.with_tokens(self.tokens.clone())
            .with_grammar(self.grammar.clone())
            .with_assembler(self.assembler.clone())
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer().with_writer(io::stderr).with_filter(
                EnvFilter::builder()
                    .with_default_directive(level.into())
                    .from_env_lossy(),
            ),
        )
        .init();
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|error| anyhow!("ln 0 col 0: Unable to read {}: {error}", path.display()))
}

/// Decodes a literal body given on the command line, reported at `ln 0 col 0`.
fn decode_text(text: &str) -> Result<String> {
    let bytes = cipher::decode(text).map_err(|error| anyhow!("ln 0 col 0: {error}"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn parse_file(toolchain: &Toolchain, path: &Path) -> Result<ParseNode> {
    let source = read_source(path)?;

    let started = Instant::now();
    let tokens = toolchain.tokenize(&source)?;
    debug!(elapsed = ?started.elapsed(), tokens = tokens.len(), "tokenizer finished");

    let started = Instant::now();
    let tree = parser::parse(&tokens, toolchain.grammar())?;
    debug!(elapsed = ?started.elapsed(), "parser finished");
    Ok(tree)
}

fn run(cli: &Cli) -> Result<()> {
    let resources = cli.resources();

    match &cli.command {
        Command::Encode { text } => println!("{}", cipher::encode(text.as_bytes())),
        Command::Decode { text } => println!("{}", decode_text(text)?),
        Command::Tokens { file } => {
            let toolchain = Toolchain::load(&resources)?;
            let source = read_source(file)?;
            for token in toolchain.tokenize(&source)? {
                println!(
                    "{}:{} {} {}",
                    token.span.line, token.span.column, token.name, token.value
                );
            }
        }
        Command::Tree { file } => {
            let toolchain = Toolchain::load(&resources)?;
            print!("{}", parse_file(&toolchain, file)?.render());
        }
        Command::Run { file } => {
            let toolchain = Toolchain::load(&resources)?;
            let program = parse_file(&toolchain, file)?;

            let started = Instant::now();
            Interpreter::new().run(&program, &mut StdHost)?;
            debug!(elapsed = ?started.elapsed(), "interpreter finished");
        }
        Command::Assemble { file, output } => {
            let toolchain = Toolchain::load(&resources)?;
            let rules = AssemblerRules::load(&resources.assembler.read()?)?;
            let program = parse_file(&toolchain, file)?;

            let started = Instant::now();
            let assembly = rules.assemble(&program);
            debug!(elapsed = ?started.elapsed(), "assembler finished");

            match output {
                Some(path) => fs::write(path, assembly).map_err(|error| {
                    anyhow!("ln 0 col 0: Unable to write {}: {error}", path.display())
                })?,
                None => println!("{assembly}"),
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}
