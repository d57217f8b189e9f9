//! # quoteform CLI
//!
//! Usage:
//!   quoteform -o out/
//!   quoteform --config quote.toml --number QUO-2026-014 --client "Globex"
//!   quoteform --item "Design=1x2500" --item "Hosting (1 Year)=1x300" --tax-rate 18
//!   quoteform --print-document > quotation.json

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;
use tracing::Level;

use quoteform::config::Config;
use quoteform::editor::{Editor, FormEvent, LineItemField, PartyField};
use quoteform::error::{ConfigError, EditError, ExportError};
use quoteform::export::LastPageFit;
use quoteform::model::{Quotation, StyleOptions};
use quoteform::totals::Totals;

#[derive(Parser)]
#[command(name = "quoteform")]
#[command(author, version, about = "Build a quotation and export it as a paginated PDF", long_about = None)]
struct Cli {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to save the PDF into (overrides the config file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Quotation number; also names the file
    #[arg(long)]
    number: Option<String>,

    /// Client name
    #[arg(long)]
    client: Option<String>,

    /// Tax rate in percent
    #[arg(long)]
    tax_rate: Option<String>,

    /// Page background color (hex)
    #[arg(long)]
    background: Option<String>,

    /// Accent color (hex)
    #[arg(long)]
    accent: Option<String>,

    /// Font family: Tinos, Roboto, Lato, or Merriweather
    #[arg(long)]
    font: Option<String>,

    /// Font size: small, medium, or large
    #[arg(long)]
    size: Option<String>,

    /// Logo image file (PNG, JPEG, or WebP)
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Line item as "<description>=<qty>x<price>"; replaces the sample items
    #[arg(long = "item", value_parser = parse_item)]
    items: Vec<ItemArg>,

    /// Notes text
    #[arg(long)]
    notes: Option<String>,

    /// Short last page: pad with background, or stretch to fill
    #[arg(long, value_parser = parse_last_page)]
    last_page: Option<LastPageFit>,

    /// Print the document as JSON instead of exporting
    #[arg(long)]
    print_document: bool,

    /// More output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone)]
struct ItemArg {
    description: String,
    quantity: String,
    unit_price: String,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to serialize document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Snapshot printed by `--print-document`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentSnapshot<'a> {
    quotation: &'a Quotation,
    style_options: &'a StyleOptions,
    totals: Totals,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    let base_dir = cli
        .config
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default();

    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if let Some(fit) = cli.last_page {
        config.export.last_page = fit;
    }

    let mut session = quoteform::open_session(&config, &base_dir)?;
    for event in form_events(&cli) {
        session.apply(event)?;
    }
    if !cli.items.is_empty() {
        session.edit(|editor| replace_items(editor, &cli.items));
    }

    if cli.print_document {
        let editor = session.editor();
        let snapshot = DocumentSnapshot {
            quotation: editor.quotation(),
            style_options: editor.style(),
            totals: editor.totals(),
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let report = session.download()?;
    eprintln!(
        "✓ Written {} page(s) to {}",
        report.page_count,
        report.path.display()
    );
    Ok(())
}

/// Translate flags into the form inputs they stand for.
fn form_events(cli: &Cli) -> Vec<FormEvent> {
    let mut events = Vec::new();
    if let Some(number) = &cli.number {
        events.push(FormEvent::QuotationNumber(number.clone()));
    }
    if let Some(name) = &cli.client {
        events.push(FormEvent::Client {
            field: PartyField::Name,
            value: name.clone(),
        });
    }
    if let Some(rate) = &cli.tax_rate {
        events.push(FormEvent::TaxRate(rate.clone()));
    }
    if let Some(color) = &cli.background {
        events.push(FormEvent::BackgroundColor(color.clone()));
    }
    if let Some(color) = &cli.accent {
        events.push(FormEvent::AccentColor(color.clone()));
    }
    if let Some(font) = &cli.font {
        events.push(FormEvent::FontFamily(font.clone()));
    }
    if let Some(size) = &cli.size {
        events.push(FormEvent::FontSize(size.clone()));
    }
    if let Some(logo) = &cli.logo {
        events.push(FormEvent::UploadLogo(logo.clone()));
    }
    if let Some(notes) = &cli.notes {
        events.push(FormEvent::Notes(notes.replace("\\n", "\n")));
    }
    events
}

fn replace_items(editor: &mut Editor, items: &[ItemArg]) {
    let existing: Vec<String> = editor
        .quotation()
        .line_items
        .iter()
        .map(|item| item.id.clone())
        .collect();
    for id in existing {
        editor.remove_line_item(&id);
    }
    for item in items {
        let id = editor.add_line_item();
        editor.update_line_item(&id, LineItemField::Description, &item.description);
        editor.update_line_item(&id, LineItemField::Quantity, &item.quantity);
        editor.update_line_item(&id, LineItemField::UnitPrice, &item.unit_price);
    }
}

fn parse_item(s: &str) -> Result<ItemArg, String> {
    let (description, amounts) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected \"<description>=<qty>x<price>\", got \"{}\"", s))?;
    let (quantity, unit_price) = amounts
        .split_once(|c: char| c.eq_ignore_ascii_case(&'x'))
        .ok_or_else(|| format!("expected \"<qty>x<price>\" after '=', got \"{}\"", amounts))?;
    Ok(ItemArg {
        description: description.trim().to_string(),
        quantity: quantity.trim().to_string(),
        unit_price: unit_price.trim().to_string(),
    })
}

fn parse_last_page(s: &str) -> Result<LastPageFit, String> {
    match s.to_ascii_lowercase().as_str() {
        "pad" => Ok(LastPageFit::Pad),
        "stretch" => Ok(LastPageFit::Stretch),
        other => Err(format!("expected \"pad\" or \"stretch\", got \"{}\"", other)),
    }
}
