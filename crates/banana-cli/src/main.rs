//! banana code-intelligence CLI

use banana_error::{DiagnosticRenderer, SourceFile};
use banana_lexer::LanguageConfiguration;
use banana_session::{init_logging, Session, SessionConfig};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Parser)]
#[command(name = "banana")]
#[command(author = "Guilherme Mendes")]
#[command(version = "0.1.0")]
#[command(about = "Code intelligence for the banana pipeline language", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, value_name = "URL", global = true)]
    server: Option<Url>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Retries for catalog loads and type table refreshes
    #[arg(long, value_name = "N", global = true)]
    retries: Option<u32>,

    /// Per-request timeout in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    timeout_ms: Option<u64>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the tokenizer grammar compiled from the backend catalog
    Grammar,

    /// Shows the highlighting tokens of a file
    Highlight {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Prints the type table the backend infers for a file
    Types {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Lists completions at a position of a file
    Complete {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Line (1-based)
        #[arg(short, long)]
        line: usize,

        /// Column (1-based)
        #[arg(short, long)]
        column: usize,
    },

    /// Type checks a file
    Check {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Submits a file to the backend for execution
    Submit {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    });

    let session = Session::connect(session_config(&cli));

    match cli.command {
        Commands::Grammar => {
            load_catalog(&session).await;
            let output = serde_json::json!({
                "grammar": session.grammar(),
                "languageConfiguration": LanguageConfiguration::default(),
            });
            print_json(&output);
        }

        Commands::Highlight { input } => {
            let source = read_source(&input);
            load_catalog(&session).await;

            match session.highlight(&source) {
                Ok(tokens) => {
                    for token in tokens.iter().filter(|t| !t.class.is_trivia()) {
                        println!(
                            "{:>4}:{:<4} {:<24} {:?}",
                            token.span.start.line,
                            token.span.start.column,
                            token.class.as_str(),
                            token.text(&source)
                        );
                    }
                }
                Err(e) => fail(&format!("Invalid grammar: {}", e)),
            }
        }

        Commands::Types { input } => {
            let source = read_source(&input);
            if let Err(e) = session.refresh(&source).await {
                fail(&format!("Type table refresh failed: {}", e));
            }

            let table = session.type_table();
            if table.is_empty() {
                println!("No variables");
            }
            for (name, ty) in table.iter() {
                println!("{}: {}", name, ty);
            }
        }

        Commands::Complete { input, line, column } => {
            let source = read_source(&input);
            load_catalog(&session).await;
            if let Err(e) = session.refresh(&source).await {
                tracing::warn!("completing without a type table: {}", e);
            }

            let candidates = session.complete_at(&source, line, column);
            print_json(&candidates);
        }

        Commands::Check { input } => {
            let source = read_source(&input);

            let Some(report) = session.typecheck(&source).await else {
                fail("Type check failed");
            };

            let file = SourceFile::new(input.display().to_string(), source);
            let renderer = DiagnosticRenderer::new(&file);
            let markers = report.markers();
            if !markers.is_empty() {
                eprintln!("{}", renderer.render_all(&markers));
            }

            if report.has_errors() {
                eprintln!("{} error(s), {} warning(s)", report.errors.len(), report.warnings.len());
                std::process::exit(1);
            }
            println!("[ok] {} type checks ({} warning(s))", input.display(), report.warnings.len());
        }

        Commands::Submit { input } => {
            let source = read_source(&input);

            match session.submit(&source).await {
                Ok(report) => print_json(&report),
                Err(e) => fail(&format!("Submit failed: {}", e)),
            }
        }
    }
}

/// Builds the session configuration: file first, then flags
fn session_config(cli: &Cli) -> SessionConfig {
    let mut config = match &cli.config {
        Some(path) => match SessionConfig::load(path) {
            Ok(config) => config,
            Err(e) => fail(&format!("Error reading config: {}", e)),
        },
        None => SessionConfig::default(),
    };

    if let Some(server) = &cli.server {
        config.base_url = server.clone();
    }
    if let Some(retries) = cli.retries {
        config = config.with_retries(retries);
    }
    if let Some(ms) = cli.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    config
}

/// Loads the catalog, falling back to the empty one
async fn load_catalog(session: &Session) {
    if let Err(e) = session.load_catalog().await {
        tracing::warn!("using an empty component catalog: {}", e);
    }
}

fn read_source(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => fail(&format!("Error reading file: {}", e)),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(&format!("Error encoding output: {}", e)),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}
