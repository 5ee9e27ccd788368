use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::RgbaImage;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use annot_model::{parse_value, serialize_value, AnnotationDraft, PathPoint, PdfValue};
use overmark_host::{MemoryValueStore, MutationChannel, ValueStore};
use overmark_viewer::{
    AnnotationMode, DocumentRenderer, FetchError, NoPrompt, OverlayEngine, PdfSource,
    SourceFetcher, TextPrompt,
};
use pdf_raster::{default_engine, OpenSource, RasterEngine};

#[derive(Debug, Parser)]
#[command(name = "overmark")]
#[command(about = "Overmark PDF annotation toolkit")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable document metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Render pages with annotations composited, writing PNG files.
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Value JSON supplying the annotations to composite.
        #[arg(long)]
        value: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        scale: Option<f32>,
        /// Render the page and its neighbors instead of a single page.
        #[arg(long)]
        window: bool,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output directory for --window renders.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Apply an annotation mutation to a value JSON file.
    Annotate {
        #[arg(value_name = "VALUE_FILE")]
        value_file: PathBuf,
        #[command(subcommand)]
        action: AnnotateAction,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Subcommand)]
enum AnnotateAction {
    /// Append a highlight centered on a point.
    Highlight {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        x: f32,
        #[arg(long)]
        y: f32,
    },
    /// Append a text note at a point.
    Text {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        x: f32,
        #[arg(long)]
        y: f32,
        #[arg(long)]
        content: String,
    },
    /// Append a freehand drawing through the given points.
    Drawing {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Path point as an X,Y pair; repeat for each point, at least two.
        #[arg(long = "point", value_name = "X,Y", required = true)]
        points: Vec<String>,
    },
    /// Remove an annotation by id.
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    first_page_size_pt: Option<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Render { file, value, page, scale, window, output, output_dir } => {
            run_render(&file, value.as_deref(), page, scale, window, output, output_dir)
        }
        Commands::Annotate { value_file, action } => run_annotate(&value_file, action),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let mut engine = default_engine();
    let handle = engine.open(OpenSource::from(file)).context("failed to open PDF")?;

    let page_count = engine.page_count(handle)?;
    let first_page_size_pt = if page_count > 0 {
        let size = engine.page_size(handle, 0)?;
        Some(PageSizeOutput { width: size.width_pt, height: size.height_pt })
    } else {
        None
    };

    let payload = InfoOutput { path: file.display().to_string(), page_count, first_page_size_pt };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    engine.close(handle)?;

    Ok(())
}

fn run_render(
    file: &Path,
    value: Option<&Path>,
    page: u32,
    scale: Option<f32>,
    window: bool,
    output: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    ensure_pdf_exists(file)?;

    if page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }

    if let Some(scale) = scale {
        if !scale.is_finite() || scale <= 0.0 {
            anyhow::bail!("--scale must be a positive number");
        }
    }

    if window && output.is_some() {
        anyhow::bail!("--output applies to single-page renders; use --output-dir with --window");
    }

    if !window && output_dir.is_some() {
        anyhow::bail!("--output-dir applies to --window renders; use --output");
    }

    let annotations = match value {
        Some(path) => read_value_file(path)?.annotations,
        None => Vec::new(),
    };

    let mut renderer = DocumentRenderer::new(default_engine());
    let source = PdfSource::Url(file.display().to_string());
    renderer.load(&source, &mut FileFetcher).context("failed to load PDF")?;

    let page_count = renderer.page_count();
    if page > page_count {
        anyhow::bail!("page {page} is out of range: document has {page_count} pages");
    }

    if let Some(scale) = scale {
        renderer.set_scale(scale);
    }
    renderer.set_current_page(page);

    if !window {
        let surface = renderer
            .render_page(page, &annotations)
            .with_context(|| format!("failed to render page {page}"))?;

        let output = output.unwrap_or_else(|| default_render_output(file, page));
        write_png(&surface, &output)?;
        println!("{}", output.display());

        return Ok(());
    }

    let dir = match output_dir {
        Some(dir) => dir,
        None => file.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".")),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    for rendered in renderer.render_window(&annotations) {
        let Some(surface) = rendered.surface else {
            eprintln!("page {} failed to render, skipped", rendered.page);
            continue;
        };

        let output = dir.join(render_file_name(file, rendered.page));
        write_png(&surface, &output)?;
        println!("{}", output.display());
    }

    Ok(())
}

fn run_annotate(value_file: &Path, action: AnnotateAction) -> Result<()> {
    let raw = fs::read_to_string(value_file)
        .with_context(|| format!("failed to read {}", value_file.display()))?;

    let mut store = MemoryValueStore::new(parse_value(Some(&raw)));
    let mut channel = MutationChannel::new(&mut store);

    match action {
        AnnotateAction::Highlight { page, x, y } => {
            let draft = capture_highlight(page, x, y)?;
            println!("{}", channel.add(draft));
        }
        AnnotateAction::Text { page, x, y, content } => {
            let draft = capture_text(page, x, y, content)?;
            println!("{}", channel.add(draft));
        }
        AnnotateAction::Drawing { page, points } => {
            let points = parse_points(&points)?;
            let draft = capture_drawing(page, &points)?;
            println!("{}", channel.add(draft));
        }
        AnnotateAction::Delete { id } => channel.delete(&id),
    }

    fs::write(value_file, serialize_value(&store.read()))
        .with_context(|| format!("failed to write {}", value_file.display()))?;

    Ok(())
}

/// Prompt that answers with a fixed string, standing in for the host dialog.
struct FixedPrompt(String);

impl TextPrompt for FixedPrompt {
    fn request_text(&mut self) -> Option<String> {
        Some(self.0.clone())
    }
}

fn capture_highlight(page: u32, x: f32, y: f32) -> Result<AnnotationDraft> {
    let mut overlay = OverlayEngine::new(NoPrompt);
    overlay.toggle_mode(AnnotationMode::Highlight);
    overlay.pointer_pressed(page, x, y);
    overlay.pointer_released(x, y).context("highlight gesture produced no annotation")
}

fn capture_text(page: u32, x: f32, y: f32, content: String) -> Result<AnnotationDraft> {
    let mut overlay = OverlayEngine::new(FixedPrompt(content));
    overlay.toggle_mode(AnnotationMode::Text);
    overlay.pointer_pressed(page, x, y);
    overlay.pointer_released(x, y).context("--content must not be empty")
}

fn capture_drawing(page: u32, points: &[PathPoint]) -> Result<AnnotationDraft> {
    let (first, rest) =
        points.split_first().context("a drawing needs at least two --point pairs")?;
    let release = rest.last().unwrap_or(first);

    let mut overlay = OverlayEngine::new(NoPrompt);
    overlay.toggle_mode(AnnotationMode::Drawing);
    overlay.pointer_pressed(page, first.x, first.y);
    for point in rest {
        overlay.pointer_moved(point.x, point.y);
    }

    overlay
        .pointer_released(release.x, release.y)
        .context("a drawing needs at least two --point pairs")
}

fn parse_points(raw: &[String]) -> Result<Vec<PathPoint>> {
    raw.iter()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .with_context(|| format!("point '{pair}' is not an X,Y pair"))?;

            let x: f32 =
                x.trim().parse().with_context(|| format!("point '{pair}' has a bad x value"))?;
            let y: f32 =
                y.trim().parse().with_context(|| format!("point '{pair}' has a bad y value"))?;

            Ok(PathPoint::new(x, y))
        })
        .collect()
}

/// Treats source URLs as local filesystem paths.
struct FileFetcher;

impl SourceFetcher for FileFetcher {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, FetchError> {
        Ok(fs::read(url)?)
    }
}

fn read_value_file(path: &Path) -> Result<PdfValue> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    Ok(parse_value(Some(&raw)))
}

fn write_png(surface: &RgbaImage, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    surface
        .save(output)
        .with_context(|| format!("failed to write image to {}", output.display()))?;

    Ok(())
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn render_file_name(file: &Path, page: u32) -> String {
    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("page");

    format!("{stem}-page-{page}.png")
}

fn default_render_output(file: &Path, page: u32) -> PathBuf {
    file.with_file_name(render_file_name(file, page))
}
