//! # Pergamino CLI
//!
//! Command-line interface for template preview and batch export.
//!
//! ## Usage
//!
//! ```bash
//! # Render a template to a PNG page image
//! pergamino preview template.json --output page.png
//!
//! # Export one PDF page per data row
//! pergamino export template.json --data rows.json --mapping mapping.json --output out.pdf
//!
//! # Export the template as-is (single page)
//! pergamino export template.json --output out.pdf
//!
//! # Start the designer API server
//! pergamino serve --listen 0.0.0.0:8080
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use pergamino::editor::Viewport;
use pergamino::export::{export_batch, ExportOptions};
use pergamino::placeholder::{extract_fields, DataSet, Mapping};
use pergamino::render::{encode_png, render_template, RasterSurface};
use pergamino::resolve::{new_cache, ImageResolver};
use pergamino::server::{serve, ServerConfig};
use pergamino::template::{PageLayout, Template, TemplateStore, A4_LANDSCAPE};
use pergamino::PergaminoError;

/// Pergamino - Certificate template utility
#[derive(Parser, Debug)]
#[command(name = "pergamino")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template JSON file to a PNG page image
    Preview {
        /// Template JSON file
        template: PathBuf,

        /// Output PNG path
        #[arg(long, short, default_value = "preview.png")]
        output: PathBuf,

        /// Page layout: "landscape" or "portrait"
        #[arg(long, default_value = "landscape")]
        layout: String,
    },

    /// Export a template to PDF, one page per data row
    Export {
        /// Template JSON file
        template: PathBuf,

        /// Data set JSON file ({"columns": [...], "rows": [...]})
        #[arg(long)]
        data: Option<PathBuf>,

        /// Field-to-column mapping JSON file ({"field": "Column"})
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Output PDF path
        #[arg(long, short, default_value = "export.pdf")]
        output: PathBuf,

        /// Page layout: "landscape" or "portrait"
        #[arg(long, default_value = "landscape")]
        layout: String,

        /// List the template's placeholder fields and exit
        #[arg(long)]
        fields: bool,
    },

    /// Start the designer API server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// Default page layout: "landscape" or "portrait"
        #[arg(long, default_value = "landscape")]
        layout: String,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), PergaminoError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Preview {
            template,
            output,
            layout,
        } => {
            let layout = parse_layout(&layout)?;
            let template = load_template(&template)?;

            let runtime = tokio::runtime::Runtime::new()?;
            let png_bytes = runtime.block_on(async {
                let cache = new_cache();
                let resolver = ImageResolver::new(cache.clone())?;
                resolver.resolve(&template).await;
                let images = cache.read().await.clone();
                encode_png(&render_template(&template, &layout, &images))
            })?;

            std::fs::write(&output, png_bytes)?;
            println!("Wrote {} ({}x{})", output.display(), layout.width, layout.height);
            Ok(())
        }

        Commands::Export {
            template,
            data,
            mapping,
            output,
            layout,
            fields,
        } => {
            let layout = parse_layout(&layout)?;
            let template = load_template(&template)?;

            if fields {
                for field in extract_fields(&template.elements) {
                    println!("{}", field);
                }
                return Ok(());
            }

            let dataset: DataSet = match data {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
                None => DataSet::default(),
            };
            let mapping: Mapping = match mapping {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
                None => Mapping::new(),
            };

            let runtime = tokio::runtime::Runtime::new()?;
            let outcome = runtime.block_on(async {
                let cache = new_cache();
                let resolver = ImageResolver::new(cache.clone())?;
                resolver.resolve(&template).await;

                let mut store = TemplateStore::with_template(template);
                let mut surface = RasterSurface::new(layout, cache);
                let mut viewport = Viewport::new();
                export_batch(
                    &mut store,
                    Some(&mut surface),
                    &mut viewport,
                    &dataset,
                    &mapping,
                    &ExportOptions::default(),
                )
                .await
            })?;

            std::fs::write(&output, &outcome.pdf)?;
            println!("Wrote {} ({} page(s))", output.display(), outcome.pages);
            if !outcome.skipped_rows.is_empty() {
                println!("Skipped rows: {:?}", outcome.skipped_rows);
            }
            Ok(())
        }

        Commands::Serve { listen, layout } => {
            let layout = parse_layout(&layout)?;
            let config = ServerConfig {
                listen_addr: listen,
                layout,
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve(config))
        }
    }
}

fn parse_layout(name: &str) -> Result<PageLayout, PergaminoError> {
    if name.is_empty() {
        return Ok(A4_LANDSCAPE);
    }
    PageLayout::by_name(name)
        .ok_or_else(|| PergaminoError::NotFound(format!("layout '{}'", name)))
}

fn load_template(path: &PathBuf) -> Result<Template, PergaminoError> {
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}
