use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use regex::Regex;

use pdfworks::app::App;
use pdfworks::config::Config;
use pdfworks::document::SourceDocument;
use pdfworks::export::{Artifact, ImageFormat};
use pdfworks::order::PageIndex;
use pdfworks::parallel;
use pdfworks::text::TextBlock;

#[derive(Parser)]
#[command(name = "pdfworks")]
#[command(about = "Draw on, edit, split, merge, rearrange and rasterize PDF files")]
struct Cli {
    #[arg(long, global = true, help = "JSON configuration file")]
    config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Directory receiving the output file")]
    output_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Reorder, duplicate and delete pages")]
    Arrange {
        #[arg(help = "Input PDF file")]
        input: PathBuf,
        #[arg(
            long = "op",
            value_name = "OP",
            help = "move:FROM:TO, dup:POS or del:POS (1-indexed positions), applied in order"
        )]
        ops: Vec<String>,
    },
    #[command(about = "Extract selected pages into a new PDF")]
    Split {
        #[arg(help = "Input PDF file")]
        input: PathBuf,
        #[arg(long, help = "Pages to keep, e.g. 1,3,5-7 (1-indexed)")]
        pages: String,
    },
    #[command(about = "Merge multiple PDFs into one")]
    Merge {
        #[arg(help = "Input PDF files", num_args = 2..)]
        inputs: Vec<PathBuf>,
    },
    #[command(about = "Stamp ink overlays onto pages")]
    Draw {
        #[arg(help = "Input PDF file")]
        input: PathBuf,
        #[arg(
            long = "overlay",
            value_name = "PAGE:PNG",
            required = true,
            help = "Transparent PNG drawn over a page (1-indexed)"
        )]
        overlays: Vec<String>,
    },
    #[command(about = "Add text blocks to pages")]
    Edit {
        #[arg(help = "Input PDF file")]
        input: PathBuf,
        #[arg(long, help = "JSON list of text blocks")]
        blocks: PathBuf,
    },
    #[command(about = "Export pages as images")]
    ToImage {
        #[arg(help = "Input PDF file")]
        input: PathBuf,
        #[arg(long, help = "Pages to export, e.g. 1,3,5-7 (default: all)")]
        pages: Option<String>,
        #[arg(long, help = "png, jpeg or webp", default_value = "png")]
        format: ImageFormat,
    },
    #[command(about = "Show page count and page sizes")]
    Info {
        #[arg(help = "Input PDF file")]
        input: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    let output_dir = config.output_dir.clone();
    let mut app = App::new(config);

    let artifact = match cli.command {
        Commands::Arrange { input, ops } => {
            let ops = ops
                .iter()
                .map(|op| parse_arrange_op(op))
                .collect::<Result<Vec<_>>>()?;
            app.arrange.load(file_name(&input), read_input(&input)?)?;
            app.arrange.edit(|tool, _| {
                for op in &ops {
                    let changed = match *op {
                        ArrangeOp::Move(from, to) => tool.reorder(from, to),
                        ArrangeOp::Duplicate(pos) => tool.duplicate_at(pos),
                        ArrangeOp::Delete(pos) => tool.delete_at(pos),
                    };
                    if !changed {
                        log::warn!("{op:?} had no effect");
                    }
                }
            })?;
            app.arrange.export().context("Error arranging pages")?
        }
        Commands::Split { input, pages } => {
            app.split.load(file_name(&input), read_input(&input)?)?;
            let pages = parse_pages(&pages, page_count(app.split.source())?)?;
            app.split.edit(|tool, _| {
                for page in pages {
                    tool.selection_mut().select(page);
                }
            })?;
            app.split.export().context("Error splitting PDF")?
        }
        Commands::Merge { inputs } => {
            let documents = parallel::load_documents_parallel(&inputs)?;
            app.merge.add_documents(documents);
            app.merge.export().context("Error merging PDFs")?
        }
        Commands::Draw { input, overlays } => {
            app.draw.load(file_name(&input), read_input(&input)?)?;
            let count = page_count(app.draw.source())?;
            for spec in &overlays {
                let (page, path) = parse_overlay(spec, count)?;
                let image = image::open(&path)
                    .with_context(|| format!("Failed to read overlay {}", path.display()))?
                    .to_rgba8();
                app.draw.edit(|tool, _| tool.set_overlay(page, image))??;
            }
            app.draw.export().context("Error stamping overlays")?
        }
        Commands::Edit { input, blocks } => {
            app.edit.load(file_name(&input), read_input(&input)?)?;
            let text = fs::read_to_string(&blocks)
                .with_context(|| format!("Failed to read {}", blocks.display()))?;
            let blocks: Vec<TextBlock> = serde_json::from_str(&text)
                .with_context(|| format!("Invalid text blocks in {}", blocks.display()))?;
            app.edit.edit(|tool, _| {
                blocks
                    .into_iter()
                    .try_for_each(|block| tool.insert(block).map(|_| ()))
            })??;
            app.edit.export().context("Error drawing text")?
        }
        Commands::ToImage {
            input,
            pages,
            format,
        } => {
            app.to_image.load(file_name(&input), read_input(&input)?)?;
            let count = page_count(app.to_image.source())?;
            let pages = match pages {
                Some(list) => parse_pages(&list, count)?,
                None => (0..count).collect(),
            };
            app.to_image.edit(|tool, _| {
                tool.set_format(format);
                for page in pages {
                    tool.selection_mut().select(page);
                }
            })?;
            app.to_image.export().context("Error exporting images")?
        }
        Commands::Info { input } => {
            let doc = SourceDocument::open(&input)
                .with_context(|| format!("Failed to load {}", input.display()))?;
            println!("{}: {} pages", doc.name(), doc.page_count());
            for (i, page) in doc.page_boxes().iter().enumerate() {
                println!("  page {}: {} x {} pt", i + 1, page.width, page.height);
            }
            return Ok(());
        }
    };

    write_artifact(&artifact, &output_dir)
}

fn write_artifact(artifact: &Artifact, dir: &Path) -> Result<()> {
    let path = artifact
        .save_into(dir)
        .with_context(|| format!("Failed to write {} into {}", artifact.file_name, dir.display()))?;
    println!("Successfully wrote {}", path.display());
    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn page_count(source: Option<&SourceDocument>) -> Result<usize> {
    match source {
        Some(doc) => Ok(doc.page_count()),
        None => bail!("No document loaded"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrangeOp {
    Move(usize, usize),
    Duplicate(usize),
    Delete(usize),
}

/// Parse `move:F:T`, `dup:P` or `del:P` with 1-indexed positions.
fn parse_arrange_op(op: &str) -> Result<ArrangeOp> {
    let re = Regex::new(r"^(move|dup|del):(\d+)(?::(\d+))?$")?;
    let Some(caps) = re.captures(op.trim()) else {
        bail!("Invalid operation '{op}'. Use move:FROM:TO, dup:POS or del:POS");
    };
    let first = one_based(&caps[2])?;
    let second = caps.get(3).map(|m| one_based(m.as_str())).transpose()?;
    match (&caps[1], second) {
        ("move", Some(to)) => Ok(ArrangeOp::Move(first, to)),
        ("dup", None) => Ok(ArrangeOp::Duplicate(first)),
        ("del", None) => Ok(ArrangeOp::Delete(first)),
        _ => bail!("Invalid operation '{op}'. Use move:FROM:TO, dup:POS or del:POS"),
    }
}

fn one_based(s: &str) -> Result<usize> {
    let n: usize = s.parse().with_context(|| format!("Invalid number '{s}'"))?;
    if n == 0 {
        bail!("Positions start at 1");
    }
    Ok(n - 1)
}

/// Parse `1,3,5-7` into zero-based page indices.
fn parse_pages(list: &str, page_count: usize) -> Result<Vec<PageIndex>> {
    let mut pages = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (one_based(a.trim())?, one_based(b.trim())?),
            None => {
                let p = one_based(part)?;
                (p, p)
            }
        };
        if start > end {
            bail!("Invalid page range '{part}'");
        }
        if end >= page_count {
            bail!("Page {} out of range (document has {} pages)", end + 1, page_count);
        }
        pages.extend(start..=end);
    }
    if pages.is_empty() {
        bail!("No pages given");
    }
    Ok(pages)
}

/// Parse `PAGE:PATH` (1-indexed page).
fn parse_overlay(spec: &str, page_count: usize) -> Result<(PageIndex, PathBuf)> {
    let Some((page, path)) = spec.split_once(':') else {
        bail!("Invalid overlay '{spec}'. Use PAGE:PNG");
    };
    let page = one_based(page)?;
    if page >= page_count {
        bail!("Page {} out of range (document has {} pages)", page + 1, page_count);
    }
    Ok((page, PathBuf::from(path)))
}
