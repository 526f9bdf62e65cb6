use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::{LoxError, Reporter, StderrReporter};
use rox::expr::Expr;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::session::Session;
use rox::token::Token;

const EXIT_USAGE: i32 = 64;
const EXIT_COMPILE_ERROR: i32 = 65;
const EXIT_RUNTIME_ERROR: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Script to run; starts an interactive prompt when omitted
    script: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Log file written when --log is set
    #[arg(long, global = true, default_value = "rox.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print one JSON object per token
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },
}

/// Reads a source file as UTF-8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file: File = File::open(filename)
        .map_err(LoxError::from)
        .with_context(|| format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf: Vec<u8> = Vec::new();

    let bytes: usize = reader
        .read_to_end(&mut buf)
        .map_err(LoxError::from)
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    let source: String = String::from_utf8(buf)
        .map_err(LoxError::from)
        .with_context(|| format!("File {:?} is not valid UTF-8", filename))?;

    Ok(source)
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file: File =
        File::create(path).with_context(|| format!("Failed to create {:?}", path))?;

    Builder::new()
        .format(|buf, record| {
            let module_path: &str = record.module_path().unwrap_or("<unnamed>");
            let module: &str = module_path.strip_prefix("rox::").unwrap_or(module_path);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn run_file(path: &Path) -> Result<()> {
    let source: String = read_file(path)?;
    let mut session = Session::new(StderrReporter);

    session.run(&source);

    if session.had_error() {
        process::exit(EXIT_COMPILE_ERROR);
    }
    if session.had_runtime_error() {
        process::exit(EXIT_RUNTIME_ERROR);
    }

    Ok(())
}

fn run_prompt() -> Result<()> {
    info!("Starting interactive prompt");

    let mut session = Session::new(StderrReporter);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line: String = line.context("Failed to read from stdin")?;

        session.run(&line);
        session.reset_errors();
    }

    println!();
    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");

    let source: String = read_file(filename)?;
    let mut reporter = StderrReporter;
    let mut tokenized: bool = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if json {
                    println!("{}", serde_json::to_string(&token)?);
                } else {
                    println!("{}", token);
                }
            }

            Err(e) => {
                tokenized = false;
                e.report(&mut reporter);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_COMPILE_ERROR);
        process::exit(EXIT_COMPILE_ERROR);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

/// Scans and parses a file holding one expression, exiting with the
/// compile-error code on any diagnostic.
fn parse_single_expression(filename: &Path) -> Result<Expr> {
    let source: String = read_file(filename)?;
    let mut reporter = StderrReporter;

    let (tokens, lex_errors): (Vec<Token>, Vec<LoxError>) = Scanner::new(&source).scan_all();

    match Parser::new(tokens).parse_expression() {
        Ok(expr) if lex_errors.is_empty() => Ok(expr),

        Ok(_) => {
            lex_errors.iter().for_each(|e| e.report(&mut reporter));
            process::exit(EXIT_COMPILE_ERROR);
        }

        Err(parse_errors) => {
            lex_errors
                .iter()
                .chain(parse_errors.iter())
                .for_each(|e| e.report(&mut reporter));
            process::exit(EXIT_COMPILE_ERROR);
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            e.print().context("Failed to print usage")?;
            process::exit(EXIT_USAGE);
        }
        Err(e) => {
            e.print().context("Failed to print help")?;
            return Ok(());
        }
    };

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();
    }

    info!("CLI arguments: {:?}", args);

    match (args.command, args.script) {
        (Some(Commands::Tokenize { filename, json }), _) => tokenize(&filename, json)?,

        (Some(Commands::Parse { filename }), _) => {
            info!("Running Parse subcommand");

            let expr: Expr = parse_single_expression(&filename)?;
            let ast: String = AstPrinter::print(&expr);

            debug!("AST: {}", ast);
            println!("{}", ast);
        }

        (Some(Commands::Evaluate { filename }), _) => {
            info!("Running Evaluate subcommand");

            let expr: Expr = parse_single_expression(&filename)?;
            let mut interpreter = Interpreter::new();

            match interpreter.evaluate(&expr) {
                Ok(value) => {
                    debug!("Evaluated to: {}", value);
                    println!("{}", value);
                }

                Err(e) => {
                    StderrReporter.runtime_error(&e);
                    process::exit(EXIT_RUNTIME_ERROR);
                }
            }
        }

        (None, Some(script)) => run_file(&script)?,

        (None, None) => run_prompt()?,
    }

    Ok(())
}
