mod settings;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use narrative::Narrative;
use narrative::block::Block;
use narrative::config::NarrativeConfig;
use narrative::parser::ParseError;
use presenter::{Action, Dispatch, NarrativeSession, PresenterError};

const SUBCOMMANDS: &[&str] = &["parse", "check", "blocks", "walk", "test", "help"];

#[derive(Parser)]
#[command(name = "narrative", version, about = "Narrative file parser and presenter")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// TOML file with a [narrative] table
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Recognized dataset host (repeatable, replaces configured hosts)
    #[arg(long = "host", global = true)]
    hosts: Vec<String>,

    /// Log parser progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a narrative and print its blocks as JSON
    Parse(ParseArgs),

    /// Parse only (exit 0 if valid)
    Check(FileArgs),

    /// List the blocks of a narrative
    Blocks(FileArgs),

    /// Step through a narrative and print the dispatched actions
    Walk(WalkArgs),

    /// Run .narrative.md fixtures against their .expect.toml files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct FileArgs {
    /// Narrative Markdown file
    file: String,
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Narrative Markdown file
    file: String,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Args)]
struct WalkArgs {
    /// Narrative Markdown file
    file: String,

    /// Block to open the narrative at
    #[arg(long, default_value_t = 0)]
    from: usize,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .narrative.md file or directory containing them
    path: String,

    /// Run only fixtures in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `narrative file.md` works like `narrative parse file.md`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = first_positional(&args) {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "parse".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    let config = match settings::load(cli.config.as_deref(), &cli.hosts) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match cli.command {
        Command::Parse(args) => {
            let narrative = load_narrative(&args.file, &config, color_choice);
            let json = if args.pretty {
                serde_json::to_string_pretty(&narrative.blocks)
            } else {
                serde_json::to_string(&narrative.blocks)
            };
            match json {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("error: cannot serialize blocks: {}", e);
                    process::exit(1);
                }
            }
        }
        Command::Check(args) => {
            let narrative = load_narrative(&args.file, &config, color_choice);
            eprintln!(
                "ok: {} parsed successfully ({} blocks)",
                args.file,
                narrative.blocks.len()
            );
        }
        Command::Blocks(args) => {
            let narrative = load_narrative(&args.file, &config, color_choice);
            for (i, block) in narrative.blocks.iter().enumerate() {
                println!("{}", block_line(i, block));
            }
        }
        Command::Walk(args) => {
            let narrative = load_narrative(&args.file, &config, color_choice);
            do_walk(narrative, args.from);
        }
        Command::Test(args) => {
            let path = Path::new(&args.path);
            if args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &args.category, &config);
            process::exit(exit_code);
        }
    }
}

/// Index of the first argument that is neither a flag nor a flag's value.
fn first_positional(args: &[String]) -> Option<usize> {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == "--config" || arg == "--host" {
            i += 2;
        } else if arg.starts_with('-') {
            i += 1;
        } else {
            return Some(i);
        }
    }
    None
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read and parse `file`, printing diagnostics. Exits the process on failure.
fn load_narrative(file: &str, config: &NarrativeConfig, color_choice: ColorChoice) -> Narrative {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(file.to_string(), source.clone());

    let parser = narrative::parser::Parser::with_config(source, file_id, config.clone());
    match parser.parse() {
        Ok(narrative) => {
            emit_diagnostics(&files, &narrative.warnings, color_choice);
            narrative
        }
        Err(error) => {
            emit_diagnostics(&files, std::slice::from_ref(&error), color_choice);
            process::exit(1);
        }
    }
}

fn emit_diagnostics(
    files: &SimpleFiles<String, String>,
    diagnostics: &[ParseError],
    color_choice: ColorChoice,
) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for diag in diagnostics {
        let diagnostic = diag.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
    }
}

/// Prints each action as one line of JSON.
struct JsonLines;

impl Dispatch for JsonLines {
    fn dispatch(&mut self, action: Action) {
        match serde_json::to_string(&action) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("error: cannot serialize action: {}", e),
        }
    }
}

/// One line of `narrative blocks` output: index, dataset and query.
fn block_line(index: usize, block: &Block) -> String {
    let query = if block.query().is_empty() {
        String::new()
    } else {
        format!("?{}", block.query())
    };
    let main_display = if block.main_display_markdown().is_some() {
        " (main display)"
    } else {
        ""
    };
    format!("{:>3}  {}{}{}", index, block.dataset(), query, main_display)
}

/// Open the narrative at `from`, step to the end page, then leave and exit.
/// Returns the number of pages.
fn walk(
    blocks: Vec<Block>,
    from: usize,
    sink: &mut impl Dispatch,
) -> Result<usize, PresenterError> {
    let mut session = NarrativeSession::starting_at(blocks, from)?;
    session.start(sink);
    while session.next_slide(sink) {}
    session.leave(sink);
    session.exit(sink);
    Ok(session.pages())
}

fn do_walk(narrative: Narrative, from: usize) {
    match walk(narrative.blocks, from, &mut JsonLines) {
        Ok(pages) => eprintln!("end of narrative ({} pages)", pages),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
