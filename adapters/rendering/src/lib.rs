#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rendering sinks that present a finished Pipe Loop grid.
//!
//! Renderers never touch the world directly: they receive a [`GridView`] and
//! map every cell to its artwork. [`compose`] pastes one tile image per cell
//! into a canvas, [`PngSink`] writes that canvas to disk, and [`TextSink`]
//! draws the same grid with box-drawing characters.

mod atlas;

use std::{
    fmt,
    fs,
    io::{self, Cursor, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result as AnyResult};
use image::{imageops, ImageFormat, Limits, RgbImage};
use log::{debug, info};
use pipe_loop_core::{GridView, TileKind};

pub use atlas::TileAtlas;

/// Default tile width in pixels.
pub const TILE_WIDTH: u32 = 172;
/// Default tile height in pixels.
pub const TILE_HEIGHT: u32 = 174;

const CHANNELS: u64 = 3;

/// Pixel dimensions shared by every tile in an atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileSize {
    /// Width of a tile in pixels.
    pub width: u32,
    /// Height of a tile in pixels.
    pub height: u32,
}

impl TileSize {
    /// Creates a new tile size descriptor.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self::new(TILE_WIDTH, TILE_HEIGHT)
    }
}

impl fmt::Display for TileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Errors raised while composing or writing a grid image.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The atlas holds no artwork for a tile kind present in the grid.
    #[error("no tile asset registered for {tile:?}")]
    AssetNotFound {
        /// Tile kind that could not be drawn.
        tile: TileKind,
    },
    /// A tile image does not match the atlas tile size.
    #[error("tile asset for {tile:?} is {width}x{height}, expected {expected_width}x{expected_height}")]
    TileSizeMismatch {
        /// Tile kind whose artwork was rejected.
        tile: TileKind,
        /// Width of the rejected image.
        width: u32,
        /// Height of the rejected image.
        height: u32,
        /// Width required by the atlas.
        expected_width: u32,
        /// Height required by the atlas.
        expected_height: u32,
    },
    /// The canvas for the grid would exceed the image allocation limit.
    #[error("a {columns}x{rows} grid does not fit into a single image")]
    CanvasTooLarge {
        /// Column count of the grid.
        columns: u32,
        /// Row count of the grid.
        rows: u32,
    },
    /// Encoding or writing the image failed.
    #[error(transparent)]
    Image(#[from] image::ImageError),
    /// Preparing the output location failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Pastes each cell's artwork at `(column * width, row * height)`.
pub fn compose(grid: GridView<'_>, atlas: &TileAtlas) -> Result<RgbImage, RenderError> {
    let (columns, rows) = grid.dimensions();
    let tile_size = atlas.tile_size();
    let too_large = || RenderError::CanvasTooLarge { columns, rows };
    let width = columns.checked_mul(tile_size.width).ok_or_else(too_large)?;
    let height = rows.checked_mul(tile_size.height).ok_or_else(too_large)?;
    let bytes = (u64::from(width) * u64::from(height)).saturating_mul(CHANNELS);
    if Limits::default()
        .max_alloc
        .is_some_and(|max_alloc| bytes > max_alloc)
    {
        return Err(too_large());
    }

    let mut canvas = RgbImage::new(width, height);
    for (cell, tile) in grid.iter() {
        let asset = atlas.tile(tile).ok_or(RenderError::AssetNotFound { tile })?;
        let x = i64::from(cell.column()) * i64::from(tile_size.width);
        let y = i64::from(cell.row()) * i64::from(tile_size.height);
        debug!("pasting {tile:?} at ({x}, {y})");
        imageops::replace(&mut canvas, asset, x, y);
    }

    Ok(canvas)
}

/// Encodes the image as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Writes the image as a PNG file, creating missing parent directories.
pub fn save_png(image: &RgbImage, path: &Path) -> Result<(), RenderError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Box-drawing character used to depict a tile in text form.
#[must_use]
pub const fn glyph(tile: TileKind) -> char {
    match tile {
        TileKind::LeftUpper => '╭',
        TileKind::RightUpper => '╮',
        TileKind::LeftLower => '╰',
        TileKind::RightLower => '╯',
        TileKind::Horizontal => '─',
        TileKind::Vertical => '│',
        TileKind::Empty => '·',
    }
}

/// Renders the grid as one line of glyphs per row.
#[must_use]
pub fn render_text(grid: GridView<'_>) -> String {
    let (columns, _) = grid.dimensions();
    let mut text = String::new();
    for (cell, tile) in grid.iter() {
        text.push(glyph(tile));
        if cell.column() + 1 == columns {
            text.push('\n');
        }
    }
    text
}

/// Destination capable of presenting a finished grid.
pub trait RenderSink {
    /// Presents the provided grid.
    fn present(&mut self, grid: GridView<'_>) -> AnyResult<()>;
}

/// Sink that composes the grid from an atlas and writes it as a PNG file.
#[derive(Clone, Debug)]
pub struct PngSink {
    atlas: TileAtlas,
    output_path: PathBuf,
}

impl PngSink {
    /// Creates a sink writing to `output_path`.
    #[must_use]
    pub fn new(atlas: TileAtlas, output_path: impl Into<PathBuf>) -> Self {
        Self {
            atlas,
            output_path: output_path.into(),
        }
    }

    /// Returns the default output path relative to the working directory.
    #[must_use]
    pub fn default_output_path() -> PathBuf {
        PathBuf::from("output/out.png")
    }

    /// Location the sink writes to.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

impl RenderSink for PngSink {
    fn present(&mut self, grid: GridView<'_>) -> AnyResult<()> {
        let image = compose(grid, &self.atlas).context("failed to compose grid image")?;
        save_png(&image, &self.output_path).with_context(|| {
            format!("failed to write grid image to {}", self.output_path.display())
        })?;
        info!(
            "wrote {}x{} image to {}",
            image.width(),
            image.height(),
            self.output_path.display()
        );
        Ok(())
    }
}

/// Sink that writes the text rendering of the grid to any writer.
#[derive(Debug)]
pub struct TextSink<W> {
    writer: W,
}

impl<W: Write> TextSink<W> {
    /// Creates a sink writing into `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink, yielding the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSink for TextSink<W> {
    fn present(&mut self, grid: GridView<'_>) -> AnyResult<()> {
        self.writer
            .write_all(render_text(grid).as_bytes())
            .context("failed to write text rendering")?;
        self.writer.flush().context("failed to flush text rendering")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid_atlas(tile_size: TileSize) -> TileAtlas {
        let tiles = TileKind::ALL.into_iter().map(|kind| {
            let shade = 30 * kind.ordinal() as u8;
            let image = RgbImage::from_pixel(tile_size.width, tile_size.height, Rgb([shade, 0, 0]));
            (kind, image)
        });
        TileAtlas::from_images(tile_size, tiles).expect("tiles match the atlas size")
    }

    #[test]
    fn every_tile_kind_has_a_distinct_glyph() {
        let mut glyphs: Vec<char> = TileKind::ALL.into_iter().map(glyph).collect();
        glyphs.sort_unstable();
        glyphs.dedup();
        assert_eq!(glyphs.len(), TileKind::COUNT);
    }

    #[test]
    fn compose_sizes_canvas_from_grid_and_tiles() {
        let cells = [TileKind::Empty; 6];
        let image = compose(GridView::new(&cells, 3, 2), &solid_atlas(TileSize::new(4, 5)))
            .expect("all tiles available");

        assert_eq!(image.dimensions(), (12, 10));
    }

    #[test]
    fn compose_places_tiles_at_their_cells() {
        let tile_size = TileSize::new(4, 5);
        let mut cells = [TileKind::Empty; 4];
        cells[3] = TileKind::Vertical;
        let image = compose(GridView::new(&cells, 2, 2), &solid_atlas(tile_size))
            .expect("all tiles available");

        let vertical = Rgb([30 * TileKind::Vertical.ordinal() as u8, 0, 0]);
        let empty = Rgb([30 * TileKind::Empty.ordinal() as u8, 0, 0]);
        assert_eq!(*image.get_pixel(4, 5), vertical);
        assert_eq!(*image.get_pixel(7, 9), vertical);
        assert_eq!(*image.get_pixel(3, 9), empty);
        assert_eq!(*image.get_pixel(7, 4), empty);
    }

    #[test]
    fn oversized_canvas_is_rejected_before_allocating() {
        let cells = vec![TileKind::Empty; 3000 * 3000];
        let atlas = TileAtlas::from_images(
            TileSize::default(),
            [(TileKind::Empty, RgbImage::new(TILE_WIDTH, TILE_HEIGHT))],
        )
        .expect("tile matches the atlas size");

        let result = compose(GridView::new(&cells, 3000, 3000), &atlas);

        assert!(matches!(
            result,
            Err(RenderError::CanvasTooLarge {
                columns: 3000,
                rows: 3000
            })
        ));
    }

    #[test]
    fn tile_size_is_validated_when_building_an_atlas() {
        let result = TileAtlas::from_images(
            TileSize::new(4, 4),
            [(TileKind::Horizontal, RgbImage::new(4, 3))],
        );

        assert!(matches!(
            result,
            Err(RenderError::TileSizeMismatch {
                tile: TileKind::Horizontal,
                width: 4,
                height: 3,
                ..
            })
        ));
    }
}
