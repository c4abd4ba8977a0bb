mod host;
mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use engine::check;
use engine::overlay::Theme;
use engine::pass;
use engine::scope::Scope;

#[derive(Parser)]
#[command(name = "prosecalc", version, about = "Inline calculation overlay for editable text")]
struct Cli {
    /// Disable colored diagnostic output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the overlay stylesheet for a document
    Render(RenderArgs),

    /// Report directives that will never compute
    Check(CheckArgs),

    /// Run .case.txt fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Document file (empty lines separate blocks)
    file: String,

    /// Print substituted unit text instead of the stylesheet
    #[arg(long)]
    text: bool,

    /// Mark the nth block (0-based) as being edited. Repeatable.
    #[arg(long)]
    focus: Vec<usize>,

    /// Overlay theme TOML file
    #[arg(long)]
    config: Option<String>,

    /// Seed a global variable. Repeatable.
    #[arg(long = "global", value_name = "NAME=VALUE")]
    globals: Vec<String>,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Document file to check
    file: String,

    /// Seed a global variable. Repeatable.
    #[arg(long = "global", value_name = "NAME=VALUE")]
    globals: Vec<String>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .case.txt file or a directory containing them
    path: String,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render(args) => do_render(args),
        Command::Check(args) => do_check(args, cli.no_color),
        Command::Test(args) => {
            process::exit(test_runner::run_cases(Path::new(&args.path)));
        }
    }
}

fn do_render(args: RenderArgs) {
    let source = read_file(&args.file);
    let mut document = host::parse_document(&source);
    log::debug!("parsed {} blocks from {}", document.blocks().len(), args.file);
    host::mark_focused(&mut document, &args.focus);
    let global = parse_globals(&args.globals);
    let theme = load_theme(args.config.as_deref());

    if args.text {
        print!("{}", host::render_text(&document, &global));
    } else {
        println!("{}", pass::render_document(&document, &global, &theme));
    }
}

fn do_check(args: CheckArgs, no_color: bool) {
    let source = read_file(&args.file);
    let global = parse_globals(&args.globals);

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let mut warnings = Vec::new();
    for block in host::parse_blocks_with_offsets(&source) {
        warnings.extend(check::check_block(&block, &global, file_id));
    }

    if warnings.is_empty() {
        println!("{}: every directive computes", args.file);
        return;
    }

    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();
    for warning in &warnings {
        let _ = term::emit_to_write_style(
            &mut writer.lock(),
            &term_config,
            &files,
            &warning.to_diagnostic(),
        );
    }
    eprintln!("{} directive(s) will render the warning glyph", warnings.len());
    process::exit(1);
}

fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read '{}': {}", path, err);
            process::exit(1);
        }
    }
}

/// Parse repeated `NAME=VALUE` flags into a scope.
fn parse_globals(pairs: &[String]) -> Scope {
    let mut scope = Scope::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            eprintln!("error: invalid --global '{}', expected NAME=VALUE", pair);
            process::exit(1);
        };
        let Ok(value) = value.trim().parse::<f64>() else {
            eprintln!("error: invalid --global value in '{}'", pair);
            process::exit(1);
        };
        scope.set(name.trim(), value);
    }
    scope
}

fn load_theme(path: Option<&str>) -> Theme {
    let Some(path) = path else {
        return Theme::default();
    };
    let source = read_file(path);
    match toml::from_str(&source) {
        Ok(theme) => theme,
        Err(err) => {
            eprintln!("error: invalid theme '{}': {}", path, err);
            process::exit(1);
        }
    }
}
