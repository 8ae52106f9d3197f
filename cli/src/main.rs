mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use onsong::ParseError;
use onsong::ast::Warning;
use song::{Song, SongEntry};

#[derive(Parser)]
#[command(name = "onsong", version, about = "OnSong chord chart parser")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log parser activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a chart and report problems
    Parse(ParseArgs),

    /// Run .test.onsong fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Chart source file
    file: String,

    /// Parse only (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump parsed AST
    #[arg(long)]
    ast: bool,

    /// Print the document as JSON
    #[arg(long)]
    json: bool,

    /// List sections in play order
    #[arg(long)]
    list_sections: bool,

    /// Print the production trace after an error
    #[arg(long)]
    trace: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.onsong file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        StderrLogger::install();
    }

    match cli.command {
        Command::Parse(parse_args) => do_parse(parse_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn do_parse(args: ParseArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    let song = match Song::parse_with_id(&source, file_id) {
        Ok(song) => song,
        Err(error) => {
            emit_parse_error(&writer, &config, &files, &error);
            if args.trace {
                eprintln!("trace:");
                for step in &error.trace {
                    eprintln!("  {}", step);
                }
            }
            process::exit(1);
        }
    };

    emit_warnings(&writer, &config, &files, file_id, song.warnings());

    if args.check {
        eprintln!(
            "ok: {} parsed successfully ({} warnings)",
            args.file,
            song.warnings().len()
        );
        return;
    }

    if args.ast {
        println!("{:#?}", song.document());
        return;
    }

    if args.json {
        let output = serde_json::json!({
            "metadata": song.metadata(),
            "document": song.document(),
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: cannot serialize '{}': {}", args.file, e);
                process::exit(1);
            }
        }
        return;
    }

    if args.list_sections {
        for entry in song.sections() {
            match entry {
                SongEntry::Section(section) => {
                    println!("{}", section.name().unwrap_or("(untitled)"))
                }
                SongEntry::Instruction(instruction) => println!("{}", instruction),
            }
        }
        return;
    }

    let metadata = song.metadata();
    for (name, value) in metadata.iter() {
        println!("{}: {}", name, value);
    }
    for entry in song.sections() {
        println!();
        match entry {
            SongEntry::Section(section) => print!("{}", section.section()),
            SongEntry::Instruction(instruction) => println!("{}", instruction),
        }
    }
}

fn emit_parse_error(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    error: &ParseError,
) {
    let diagnostic = error.to_diagnostic();
    let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
}

fn emit_warnings(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    file_id: usize,
    warnings: &[Warning],
) {
    for warning in warnings {
        let diagnostic = warning.to_diagnostic(file_id);
        let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
    }
}

/// Writes `log` records from the parser to stderr.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl StderrLogger {
    fn install() {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Debug);
        }
    }
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::Level::Debug
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}
