// 🖼️ Renderer
// Rasterizes a Figure with plotters and persists it as PNG

use crate::error::{MapError, Result};
use crate::figure::{Colorbar, Figure, Rgb, MAX_CANVAS_SIDE};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};

/// Gradient slices drawn for the colorbar
const COLORBAR_STEPS: usize = 100;

/// In-memory RGB pixel buffer of a rendered figure
#[derive(Debug, Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some(Rgb(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]))
    }

    /// Encode as PNG at `path`, creating parent directories
    pub fn save_png(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| MapError::io(parent, e))?;
        }

        let image = image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| MapError::Render("pixel buffer does not match dimensions".to_string()))?;

        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| MapError::Render(format!("failed to write {}: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), "map saved");
        Ok(())
    }
}

/// Draw the figure into a fresh pixel buffer. Nothing touches disk.
pub fn rasterize(figure: &Figure) -> Result<Raster> {
    paint(figure, true)
}

/// Bytes needed for an RGB buffer of `width` x `height`
fn buffer_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(MapError::Render("figure has zero size".to_string()));
    }
    if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return Err(MapError::Render(format!(
            "figure is {}x{}, sides are limited to {} pixels",
            width, height, MAX_CANVAS_SIDE
        )));
    }

    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| MapError::Render(format!("figure {}x{} is too large", width, height)))
}

fn paint(figure: &Figure, with_text: bool) -> Result<Raster> {
    let mut pixels = vec![0u8; buffer_len(figure.width, figure.height)?];
    {
        // The drawing area borrows the buffer; it is dropped at the end of this
        // scope on success and on every early `?` return.
        let root = BitMapBackend::with_buffer(&mut pixels, (figure.width, figure.height))
            .into_drawing_area();
        draw_layers(&root, figure)?;
        if with_text {
            draw_title(&root, figure)?;
            draw_legend(&root, figure)?;
        }
        root.present().map_err(render_err)?;
    }

    Ok(Raster {
        width: figure.width,
        height: figure.height,
        pixels,
    })
}

/// Rasterize then save
pub fn render_png(figure: &Figure, path: &Path) -> Result<()> {
    rasterize(figure)?.save_png(path)
}

/// Default output file: `{label}_{metric_slug}.png` inside `dir`
pub fn output_path(dir: &Path, label: &str, metric_name: &str) -> PathBuf {
    dir.join(format!("{}_{}.png", file_label(label), slug(metric_name)))
}

/// Keep the label readable, only replacing characters that break file names
fn file_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

/// Lowercase snake case: "Children in Poverty" -> "children_in_poverty"
pub fn slug(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

// ============================================================================
// DRAWING
// ============================================================================

type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

/// Background, tract fills and boundaries; no text, so no fonts needed
fn draw_layers(root: &Area<'_>, figure: &Figure) -> Result<()> {
    root.fill(&color(figure.background)).map_err(render_err)?;

    // Fills: missing and valued tracts interleaved by area, holes after their host
    for layer in &figure.fills {
        if layer.ring.len() < 3 {
            continue;
        }
        root.draw(&Polygon::new(pixels(&layer.ring), color(layer.color).filled()))
            .map_err(render_err)?;
    }

    // Tract boundaries over everything
    let stroke = color(figure.outline.color).stroke_width(figure.outline.width);
    for ring in &figure.outlines {
        if ring.len() < 2 {
            continue;
        }
        root.draw(&PathElement::new(pixels(ring), stroke))
            .map_err(render_err)?;
    }

    Ok(())
}

fn draw_title(root: &Area<'_>, figure: &Figure) -> Result<()> {
    let font = ("sans-serif", figure.title_font_size)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    let x = (figure.map_area.x + figure.map_area.width / 2.0) as i32;
    let y = (figure.map_area.y / 2.0) as i32;
    root.draw(&Text::new(figure.title.clone(), (x, y), font))
        .map_err(render_err)
}

fn draw_legend(root: &Area<'_>, figure: &Figure) -> Result<()> {
    let legend = &figure.legend;
    let bar = legend.area;
    let label_font = ("sans-serif", 16).into_font().color(&BLACK);

    root.draw(&Text::new(
        legend.label.clone(),
        (bar.x as i32, (bar.y - 30.0) as i32),
        label_font,
    ))
    .map_err(render_err)?;

    if let Some(colorbar) = &legend.colorbar {
        draw_colorbar(root, figure, colorbar)?;
    }

    // Swatches: missing data under the colorbar, or the categories themselves
    let tick_font = ("sans-serif", 14).into_font().color(&BLACK);
    let mut swatch_y = legend.patch_top() as i32;
    for patch in &legend.patches {
        let corners = [(bar.x as i32, swatch_y), (bar.right() as i32, swatch_y + 16)];
        root.draw(&Rectangle::new(corners, color(patch.color).filled()))
            .map_err(render_err)?;
        root.draw(&Rectangle::new(corners, BLACK.stroke_width(1)))
            .map_err(render_err)?;
        root.draw(&Text::new(
            patch.label.clone(),
            (bar.right() as i32 + 8, swatch_y),
            tick_font.clone(),
        ))
        .map_err(render_err)?;
        swatch_y += 24;
    }

    Ok(())
}

fn draw_colorbar(root: &Area<'_>, figure: &Figure, colorbar: &Colorbar) -> Result<()> {
    let legend = &figure.legend;
    let bar = legend.area;
    let tick_font = ("sans-serif", 14).into_font().color(&BLACK);

    // Bottom (low) to top (high)
    let slice = bar.height / COLORBAR_STEPS as f64;
    for step in 0..COLORBAR_STEPS {
        let t = (step as f64 + 0.5) / COLORBAR_STEPS as f64;
        let top = bar.bottom() - slice * (step + 1) as f64;
        let bottom = bar.bottom() - slice * step as f64;
        root.draw(&Rectangle::new(
            [
                (bar.x as i32, top.floor() as i32),
                (bar.right() as i32, bottom.ceil() as i32),
            ],
            color(colorbar.scale.color_at(t)).filled(),
        ))
        .map_err(render_err)?;
    }
    root.draw(&Rectangle::new(
        [
            (bar.x as i32, bar.y as i32),
            (bar.right() as i32, bar.bottom() as i32),
        ],
        BLACK.stroke_width(1),
    ))
    .map_err(render_err)?;

    if colorbar.ticks.is_empty() {
        root.draw(&Text::new(
            "no values",
            ((bar.right() + 8.0) as i32, (bar.y + bar.height / 2.0) as i32),
            tick_font.clone(),
        ))
        .map_err(render_err)?;
    }
    for (value, label) in &colorbar.ticks {
        let y = legend.bar_y(*value) as i32;
        root.draw(&PathElement::new(
            vec![(bar.right() as i32, y), (bar.right() as i32 + 5, y)],
            BLACK.stroke_width(1),
        ))
        .map_err(render_err)?;
        root.draw(&Text::new(
            label.clone(),
            (bar.right() as i32 + 8, y - 7),
            tick_font.clone(),
        ))
        .map_err(render_err)?;
    }

    Ok(())
}

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn pixels(ring: &[(f64, f64)]) -> Vec<(i32, i32)> {
    ring.iter()
        .map(|(x, y)| (x.round() as i32, y.round() as i32))
        .collect()
}

fn render_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> MapError {
    MapError::Render(err.to_string())
}

// ============================================================================
// TESTS
// ============================================================================
