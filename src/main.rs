//! CLI for docxcite - fills LaTeX-style citations in DOCX files from BibTeX

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use docxcite::{CitationProcessor, ConvertOptions, TracingSink, DEFAULT_STYLE};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input DOCX file path
    #[arg(required_unless_present = "list_styles")]
    input: Option<PathBuf>,

    /// BibTeX database path
    #[arg(required_unless_present_any = ["list_styles", "dump_markers"])]
    bibliography: Option<PathBuf>,

    /// Citation style name (case-insensitive)
    #[arg(required_unless_present_any = ["list_styles", "dump_markers"])]
    style: Option<String>,

    /// Output DOCX file path
    #[arg(required_unless_present_any = ["list_styles", "dump_markers"])]
    output: Option<PathBuf>,

    /// JSON style sheet to use instead of the builtin styles
    #[arg(long)]
    styles: Option<PathBuf>,

    /// Skip re-opening the written document to check it
    #[arg(long)]
    no_verify: bool,

    /// Print the bibliography and citation markers of the input as JSON and exit
    #[arg(long)]
    dump_markers: bool,

    /// List the available style names and exit
    #[arg(long)]
    list_styles: bool,

    /// Log debug details
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> docxcite::Result<()> {
    let sink = TracingSink;
    let options = ConvertOptions {
        style: args.style.clone().unwrap_or_else(|| DEFAULT_STYLE.to_string()),
        styles_file: args.styles.clone(),
        verify_output: !args.no_verify,
    };
    let processor = CitationProcessor::new(options, &sink);

    if args.list_styles {
        for name in processor.catalog()?.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let input = required(args.input, "input");
    require_extension(&input, "docx", "input");

    if args.dump_markers {
        let markers = processor.markers(&input)?;
        println!("{}", serde_json::to_string_pretty(&markers)?);
        return Ok(());
    }

    let bibliography = required(args.bibliography, "bibliography");
    require_extension(&bibliography, "bib", "bibliography");
    let output = required(args.output, "output");
    require_extension(&output, "docx", "output");

    processor.catalog()?.resolve(&processor.options().style)?;

    let report = processor.process(&input, &bibliography, &output)?;
    println!(
        "Successfully wrote {:?} ({} citation(s), {} dropped)",
        output, report.citations, report.dropped_citations
    );
    Ok(())
}

fn required<T>(value: Option<T>, name: &str) -> T {
    match value {
        Some(value) => value,
        None => Args::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                format!("the <{}> argument is required", name),
            )
            .exit(),
    }
}

fn require_extension(path: &Path, extension: &str, name: &str) {
    let matches = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    if !matches {
        Args::command()
            .error(
                ErrorKind::ValueValidation,
                format!("{} must be a .{} file: {}", name, extension, path.display()),
            )
            .exit();
    }
}
