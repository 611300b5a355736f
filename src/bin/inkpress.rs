//! CLI binary for inkpress.
//!
//! A thin shim over the library crate that maps CLI flags to
//! [`ConvertConfig`] / [`PdfRequest`] and writes the PDF to disk.

use anyhow::{Context, Result};
use clap::Parser;
use inkpress::{
    render_pdf, ConvertConfig, DockerCli, EngineOptions, FileTemplateEngine, PdfRequest,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Render an HTML template to PDF via a containerized conversion engine.
#[derive(Parser, Debug)]
#[command(name = "inkpress", version, about)]
struct Cli {
    /// Main template, relative to --template-dir.
    template: String,

    /// Output PDF path.
    #[arg(short, long)]
    output: PathBuf,

    /// Directory templates are loaded from.
    #[arg(long, default_value = ".")]
    template_dir: PathBuf,

    /// JSON file with the template context.
    #[arg(long)]
    context: Option<PathBuf>,

    /// Header template (repeated on every page).
    #[arg(long)]
    header: Option<String>,

    /// Footer template (repeated on every page).
    #[arg(long)]
    footer: Option<String>,

    /// Cover template (prepended as the first page).
    #[arg(long)]
    cover: Option<String>,

    /// Engine image name.
    #[arg(long, env = "INKPRESS_IMAGE")]
    image: Option<String>,

    /// Fixed container name (default: unique name per run).
    #[arg(long)]
    container_name: Option<String>,

    /// Filesystem root media URLs resolve to.
    #[arg(long, env = "INKPRESS_MEDIA_ROOT")]
    media_root: Option<PathBuf>,

    /// URL prefix media is served under.
    #[arg(long, env = "INKPRESS_MEDIA_URL")]
    media_url: Option<String>,

    /// Filesystem root static-asset URLs resolve to.
    #[arg(long, env = "INKPRESS_STATIC_ROOT")]
    static_root: Option<PathBuf>,

    /// URL prefix static assets are served under.
    #[arg(long, env = "INKPRESS_STATIC_URL")]
    static_url: Option<String>,

    /// Keep rendered HTML and the raw engine output in the temp directory.
    #[arg(long)]
    keep_rendered: bool,

    /// Engine option as key=value, or a bare key for presence-only flags.
    /// May be repeated, e.g. -O grayscale -O margin-top=10.
    #[arg(short = 'O', long = "opt")]
    options: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let context = match &cli.context {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read context file '{}'", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("context file '{}' is not valid JSON", path.display()))?
        }
        None => serde_json::Value::Null,
    };

    let mut options = EngineOptions::new();
    for opt in &cli.options {
        match opt.split_once('=') {
            Some((key, value)) => options.set(key, value),
            None => options.set_flag(opt.clone()),
        }
    }

    let mut builder = ConvertConfig::builder().keep_rendered_files(cli.keep_rendered);
    if let Some(image) = &cli.image {
        builder = builder.image(image);
    }
    if let Some(name) = &cli.container_name {
        builder = builder.container_name(name);
    }
    if let Some(root) = &cli.media_root {
        builder = builder.media_root(root);
    }
    if let Some(url) = &cli.media_url {
        builder = builder.media_url(url);
    }
    if let Some(root) = &cli.static_root {
        builder = builder.static_root(root);
    }
    if let Some(url) = &cli.static_url {
        builder = builder.static_url(url);
    }
    let config = builder.build()?;

    let mut request = PdfRequest::new(&cli.template)
        .context(context)
        .options(options);
    if let Some(header) = &cli.header {
        request = request.header(header);
    }
    if let Some(footer) = &cli.footer {
        request = request.footer(footer);
    }
    if let Some(cover) = &cli.cover {
        request = request.cover(cover);
    }

    let engine = FileTemplateEngine::new(&cli.template_dir);
    let runtime = DockerCli::new();

    let pdf = render_pdf(&engine, &runtime, &request, &config)?;

    std::fs::write(&cli.output, &pdf)
        .with_context(|| format!("cannot write output '{}'", cli.output.display()))?;
    eprintln!("wrote {} bytes to {}", pdf.len(), cli.output.display());
    Ok(())
}
