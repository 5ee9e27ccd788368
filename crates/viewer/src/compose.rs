use annot_model::{Annotation, AnnotationKind, Color, PathPoint};
use image::{Rgba, RgbaImage};

/// Text annotations paint at this pixel size, matching the creation surface.
pub const TEXT_SIZE_PX: f32 = 14.0;
/// Freehand strokes paint with this brush width.
pub const STROKE_WIDTH_PX: u32 = 2;

const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
];

/// Glyph source for text annotations.
///
/// Composition runs without a GPU or a browser text stack, so glyphs come
/// from a single face rasterized on the CPU. Without a usable face the
/// compositor paints everything except text.
pub struct TextPainter {
    font: Option<fontdue::Font>,
}

impl TextPainter {
    /// Painter that skips text annotations entirely.
    pub fn disabled() -> Self {
        Self { font: None }
    }

    pub fn with_font_bytes(bytes: &[u8]) -> Option<Self> {
        match fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()) {
            Ok(font) => Some(Self { font: Some(font) }),
            Err(reason) => {
                log::warn!("failed to parse font: {reason}");
                None
            }
        }
    }

    /// Probe well-known system font locations, falling back to a disabled
    /// painter when none parses.
    pub fn from_system() -> Self {
        for path in SYSTEM_FONT_PATHS {
            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };

            match fontdue::Font::from_bytes(bytes.as_slice(), fontdue::FontSettings::default()) {
                Ok(font) => {
                    log::debug!("text painter using {path}");
                    return Self { font: Some(font) };
                }
                Err(reason) => log::debug!("skipping font {path}: {reason}"),
            }
        }

        log::warn!("no usable system font found; text annotations will not be painted");
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }
}

/// Paint annotations onto a rendered page surface, in list order.
///
/// Painting is pure pixel arithmetic: identical inputs always produce an
/// identical surface, and geometry reaching past the surface clips silently.
/// Records missing the fields their kind needs are skipped.
pub fn composite_annotations(
    surface: &mut RgbaImage,
    annotations: &[&Annotation],
    painter: &TextPainter,
) {
    for annotation in annotations {
        match annotation.kind {
            AnnotationKind::Highlight => paint_highlight(surface, annotation),
            AnnotationKind::Drawing => paint_drawing(surface, annotation),
            AnnotationKind::Text => paint_text(surface, annotation, painter),
            AnnotationKind::Stamp => {}
        }
    }
}

fn annotation_color(annotation: &Annotation) -> Color {
    annotation
        .color
        .as_deref()
        .and_then(Color::parse_css)
        .unwrap_or_else(|| Color::fallback(annotation.kind))
}

fn paint_highlight(surface: &mut RgbaImage, annotation: &Annotation) {
    let (Some(x), Some(y), Some(width), Some(height)) =
        (annotation.x, annotation.y, annotation.width, annotation.height)
    else {
        return;
    };

    fill_rect(surface, x, y, width, height, annotation_color(annotation));
}

fn paint_drawing(surface: &mut RgbaImage, annotation: &Annotation) {
    let Some(paths) = annotation.paths.as_deref() else {
        return;
    };

    let color = annotation_color(annotation);
    for pair in paths.windows(2) {
        stroke_segment(surface, pair[0], pair[1], color);
    }
}

fn paint_text(surface: &mut RgbaImage, annotation: &Annotation, painter: &TextPainter) {
    let (Some(x), Some(y)) = (annotation.x, annotation.y) else {
        return;
    };
    let Some(content) = annotation.content.as_deref() else {
        return;
    };
    let Some(font) = painter.font.as_ref() else {
        return;
    };
    if content.is_empty() || !(x.is_finite() && y.is_finite()) {
        return;
    }

    let color = annotation_color(annotation);
    let mut pen_x = x;

    // (x, y) is the start of the baseline, as canvas fillText draws it.
    for ch in content.chars() {
        let (metrics, coverage) = font.rasterize(ch, TEXT_SIZE_PX);
        let glyph_left = pen_x + metrics.xmin as f32;
        let glyph_top = y - (metrics.ymin as f32 + metrics.height as f32);

        for (row, row_coverage) in coverage.chunks(metrics.width.max(1)).enumerate() {
            for (col, &cov) in row_coverage.iter().enumerate() {
                if cov == 0 {
                    continue;
                }

                let px = (glyph_left + col as f32).round() as i64;
                let py = (glyph_top + row as f32).round() as i64;
                let alpha = (color.a as u32 * cov as u32 / 255) as u8;
                blend_clipped(surface, px, py, color, alpha);
            }
        }

        pen_x += metrics.advance_width;
    }
}

fn fill_rect(surface: &mut RgbaImage, x: f32, y: f32, width: f32, height: f32, color: Color) {
    if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
        return;
    }
    if width <= 0.0 || height <= 0.0 {
        return;
    }

    let (surface_width, surface_height) = surface.dimensions();
    let left = (x.round() as i64).clamp(0, surface_width as i64);
    let right = ((x + width).round() as i64).clamp(0, surface_width as i64);
    let top = (y.round() as i64).clamp(0, surface_height as i64);
    let bottom = ((y + height).round() as i64).clamp(0, surface_height as i64);

    for py in top..bottom {
        for px in left..right {
            blend_pixel(surface, px as u32, py as u32, color, color.a);
        }
    }
}

fn stroke_segment(surface: &mut RgbaImage, from: PathPoint, to: PathPoint, color: Color) {
    if !(from.x.is_finite() && from.y.is_finite() && to.x.is_finite() && to.y.is_finite()) {
        return;
    }

    let (surface_width, surface_height) = surface.dimensions();
    let margin = STROKE_WIDTH_PX as f32;
    if from.x.max(to.x) < -margin
        || from.y.max(to.y) < -margin
        || from.x.min(to.x) > surface_width as f32 + margin
        || from.y.min(to.y) > surface_height as f32 + margin
    {
        return;
    }

    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let steps = dx.abs().max(dy.abs()).ceil() as u32;

    for step in 0..=steps {
        let t = if steps == 0 { 0.0 } else { step as f32 / steps as f32 };
        stamp_brush(surface, from.x + dx * t, from.y + dy * t, color);
    }
}

// Square brush of STROKE_WIDTH_PX centered on the path position.
fn stamp_brush(surface: &mut RgbaImage, cx: f32, cy: f32, color: Color) {
    let half = STROKE_WIDTH_PX as f32 / 2.0;
    let left = (cx - half).round() as i64;
    let top = (cy - half).round() as i64;

    for py in top..top + STROKE_WIDTH_PX as i64 {
        for px in left..left + STROKE_WIDTH_PX as i64 {
            blend_clipped(surface, px, py, color, color.a);
        }
    }
}

fn blend_clipped(surface: &mut RgbaImage, x: i64, y: i64, color: Color, alpha: u8) {
    let (width, height) = surface.dimensions();
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        return;
    }

    blend_pixel(surface, x as u32, y as u32, color, alpha);
}

// Source-over blend in integer arithmetic.
fn blend_pixel(surface: &mut RgbaImage, x: u32, y: u32, color: Color, alpha: u8) {
    if alpha == 0 {
        return;
    }

    let Rgba([dr, dg, db, da]) = *surface.get_pixel(x, y);
    let src = alpha as u32;
    let inv = 255 - src;

    let r = ((color.r as u32 * src + dr as u32 * inv) / 255) as u8;
    let g = ((color.g as u32 * src + dg as u32 * inv) / 255) as u8;
    let b = ((color.b as u32 * src + db as u32 * inv) / 255) as u8;
    let a = (src + da as u32 * inv / 255).min(255) as u8;

    surface.put_pixel(x, y, Rgba([r, g, b, a]));
}
