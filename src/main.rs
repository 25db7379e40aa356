//! novelbind - plain-text novel to EPUB converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use encoding_rs::Encoding;
use log::info;

use novelbind::{
    Cover, DecodeOptions, HeadingNode, Line, Metadata, NormalizedText, RuleConfig, RuleSet, assemble, read_text_file,
    recognize, test_line, test_line_at, write_epub,
};

#[derive(Parser)]
#[command(name = "novelbind")]
#[command(version, about = "Plain-text novel to EPUB converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    novelbind convert novel.txt --title 三体 --author 刘慈欣
    novelbind outline novel.txt --rules rules.toml
    novelbind test novel.txt --line 42
    novelbind rules > rules.toml")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors and skip the summary
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(clap::Args)]
struct Input {
    /// Plain-text novel
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Rules file (TOML); built-in rules when omitted
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Decode with this encoding instead of detecting it (e.g. gbk, big5)
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a text file into an EPUB
    Convert {
        #[command(flatten)]
        input: Input,

        /// Output file; INPUT with an .epub extension by default
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Vec<String>,

        /// Category, written as a subject (repeatable)
        #[arg(long)]
        category: Vec<String>,

        /// Cover image (JPEG, PNG, GIF, SVG, WebP)
        #[arg(long, value_name = "IMAGE")]
        cover: Option<PathBuf>,

        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Show the recognized heading tree
    Outline {
        #[command(flatten)]
        input: Input,

        /// Print the outline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check how a single line is classified
    Test {
        /// Text file holding the line
        #[arg(value_name = "INPUT", required_unless_present = "text")]
        input: Option<PathBuf>,

        /// 1-based line number within INPUT
        #[arg(long, requires = "input")]
        line: Option<usize>,

        /// Classify this text instead of a line from a file
        #[arg(long, conflicts_with = "line")]
        text: Option<String>,

        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,

        #[arg(long, value_name = "LABEL")]
        encoding: Option<String>,
    },

    /// Print the built-in rules as TOML
    Rules,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .target(env_logger::Target::Stderr)
        .init();

    let result = match cli.command {
        Command::Convert {
            input,
            output,
            title,
            author,
            category,
            cover,
            language,
            description,
        } => {
            let mut metadata = Metadata::new(title.unwrap_or_else(|| file_stem(&input.input)));
            metadata.authors = author;
            metadata.subjects = category;
            metadata.language = language.unwrap_or_default();
            metadata.description = description;
            convert(&input, output, &metadata, cover.as_deref(), cli.quiet)
        }
        Command::Outline { input, json } => show_outline(&input, json),
        Command::Test {
            input,
            line,
            text,
            rules,
            encoding,
        } => run_test(input.as_deref(), line, text.as_deref(), rules.as_deref(), encoding.as_deref()),
        Command::Rules => print_rules(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_rules(path: Option<&Path>) -> Result<RuleSet, novelbind::Error> {
    match path {
        Some(path) => {
            info!("loading rules from {}", path.display());
            Ok(RuleConfig::load(path)?.compile()?)
        }
        None => Ok(RuleSet::default()),
    }
}

fn read_input(path: &Path, encoding: Option<&str>) -> Result<NormalizedText, Box<dyn std::error::Error>> {
    let mut options = DecodeOptions::default();
    if let Some(label) = encoding {
        let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| format!("unknown encoding: {label}"))?;
        options = options.with_override(encoding);
    }
    let text = read_text_file(path, &options)?;
    info!("read {} lines from {} ({})", text.lines.len(), path.display(), text.encoding_name());
    Ok(text)
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

fn convert(input: &Input, output: Option<PathBuf>, metadata: &Metadata, cover: Option<&Path>, quiet: bool) -> CliResult {
    let rules = load_rules(input.rules.as_deref())?;
    let text = read_input(&input.input, input.encoding.as_deref())?;
    let outline = recognize(&text.lines, &rules)?;

    let cover = cover.map(Cover::from_path).transpose()?;
    let book = assemble(&outline, metadata, cover.as_ref());

    let output = output.unwrap_or_else(|| input.input.with_extension("epub"));
    write_epub(&book, &output)?;

    if !quiet {
        println!(
            "{} -> {} ({} headings, {} pages)",
            input.input.display(),
            output.display(),
            outline.heading_count(),
            book.metadata.page_count.unwrap_or_default()
        );
    }
    Ok(())
}

fn show_outline(input: &Input, json: bool) -> CliResult {
    let rules = load_rules(input.rules.as_deref())?;
    let text = read_input(&input.input, input.encoding.as_deref())?;
    let outline = recognize(&text.lines, &rules)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outline)?);
        return Ok(());
    }

    for root in &outline.roots {
        print_node(root, 0);
    }
    println!("{} headings in {} lines", outline.heading_count(), outline.line_count);
    Ok(())
}

fn print_node(node: &HeadingNode, depth: usize) {
    let indent = "  ".repeat(depth);
    if node.is_preamble() {
        println!("{:>7}  {indent}[{}]", node.start_line + 1, node.title);
    } else {
        println!("{:>7}  {indent}{} ({})", node.start_line + 1, node.title, node.level_name);
    }
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn run_test(
    input: Option<&Path>,
    line: Option<usize>,
    text: Option<&str>,
    rules: Option<&Path>,
    encoding: Option<&str>,
) -> CliResult {
    let rules = load_rules(rules)?;

    let (result, number) = match (text, input) {
        (Some(text), _) => (test_line(&Line::new(0, text), &rules), 1),
        (None, Some(input)) => {
            let number = line.ok_or("--line is required with INPUT")?;
            let index = number.checked_sub(1).ok_or("line numbers start at 1")?;
            let document = read_input(input, encoding)?;
            (test_line_at(&document.lines, index, &rules)?, number)
        }
        (None, None) => return Err("nothing to test".into()),
    };
    println!("{}", result.describe(number, &rules));
    Ok(())
}

fn print_rules() -> CliResult {
    print!("{}", RuleConfig::default().to_toml_string()?);
    Ok(())
}
