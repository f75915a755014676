use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use image::RgbImage;
use pipe_loop_core::TileKind;

use crate::{RenderError, TileSize};

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Tile artwork keyed by the pipe segment it depicts.
#[derive(Clone, Debug)]
pub struct TileAtlas {
    tile_size: TileSize,
    tiles: HashMap<TileKind, RgbImage>,
}

impl TileAtlas {
    /// Loads tiles from the manifest located at the provided path.
    pub fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_manifest_with_loader(path, default_loader)
    }

    /// Returns the default manifest path relative to the repository root.
    #[must_use]
    pub fn default_manifest_path() -> PathBuf {
        PathBuf::from("assets/manifest.toml")
    }

    /// Builds an atlas from images already in memory.
    ///
    /// Kinds left out of `tiles` are reported as missing when composing.
    pub fn from_images(
        tile_size: TileSize,
        tiles: impl IntoIterator<Item = (TileKind, RgbImage)>,
    ) -> Result<Self, RenderError> {
        let mut atlas = Self {
            tile_size,
            tiles: HashMap::new(),
        };
        for (kind, image) in tiles {
            atlas.insert(kind, image)?;
        }
        Ok(atlas)
    }

    /// Pixel size shared by every tile.
    #[must_use]
    pub const fn tile_size(&self) -> TileSize {
        self.tile_size
    }

    /// Retrieves the artwork associated with the provided kind.
    #[must_use]
    pub fn tile(&self, kind: TileKind) -> Option<&RgbImage> {
        self.tiles.get(&kind)
    }

    /// Returns whether the atlas contains artwork for the provided kind.
    #[must_use]
    pub fn contains(&self, kind: TileKind) -> bool {
        self.tiles.contains_key(&kind)
    }

    /// Returns the number of tiles stored in the atlas.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    fn insert(&mut self, kind: TileKind, image: RgbImage) -> Result<(), RenderError> {
        let (width, height) = image.dimensions();
        if width != self.tile_size.width || height != self.tile_size.height {
            return Err(RenderError::TileSizeMismatch {
                tile: kind,
                width,
                height,
                expected_width: self.tile_size.width,
                expected_height: self.tile_size.height,
            });
        }
        let _ = self.tiles.insert(kind, image);
        Ok(())
    }

    fn from_manifest_with_loader(
        path: impl AsRef<Path>,
        mut loader: impl FnMut(TileKind, &Path) -> Result<RgbImage>,
    ) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read tile manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let (tile_size, entries) = parse_manifest(&contents, &base)?;
        Self::from_entries(tile_size, entries, &mut loader)
    }

    fn from_entries(
        tile_size: TileSize,
        entries: Vec<(TileKind, PathBuf)>,
        loader: &mut impl FnMut(TileKind, &Path) -> Result<RgbImage>,
    ) -> Result<Self> {
        let mut atlas = Self {
            tile_size,
            tiles: HashMap::with_capacity(entries.len()),
        };
        for (kind, path) in entries {
            let image = loader(kind, &path).with_context(|| {
                format!("failed to load tile {kind:?} from {}", path.display())
            })?;
            atlas
                .insert(kind, image)
                .with_context(|| format!("tile asset {} is unusable", path.display()))?;
        }
        Ok(atlas)
    }
}

fn default_loader(_kind: TileKind, path: &Path) -> Result<RgbImage> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read tile asset at {}", path.display()))?;
    let image = image::load_from_memory(&bytes)
        .with_context(|| format!("failed to decode tile asset at {}", path.display()))?;
    Ok(image.to_rgb8())
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    tile_width: Option<u32>,
    tile_height: Option<u32>,
    tiles: HashMap<String, String>,
}

fn parse_manifest(contents: &str, base_path: &Path) -> Result<(TileSize, Vec<(TileKind, PathBuf)>)> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse tile manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported tile manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let defaults = TileSize::default();
    let tile_size = TileSize::new(
        manifest.tile_width.unwrap_or(defaults.width),
        manifest.tile_height.unwrap_or(defaults.height),
    );
    if tile_size.width == 0 || tile_size.height == 0 {
        bail!("tile size must be positive, got {tile_size}");
    }

    let mut resolved = HashMap::new();
    for (name, relative_path) in manifest.tiles {
        let kind = parse_tile_key(&name)
            .with_context(|| format!("unknown tile key `{name}` in manifest"))?;
        let path = base_path.join(relative_path);
        let _ = resolved.insert(kind, path);
    }

    let mut ordered = Vec::with_capacity(TileKind::COUNT);
    for kind in TileKind::ALL {
        let Some(path) = resolved.remove(&kind) else {
            bail!("tile manifest missing entry for {kind:?}");
        };
        ordered.push((kind, path));
    }

    Ok((tile_size, ordered))
}

fn parse_tile_key(name: &str) -> Result<TileKind> {
    match name {
        "RightUpper" => Ok(TileKind::RightUpper),
        "RightLower" => Ok(TileKind::RightLower),
        "LeftUpper" => Ok(TileKind::LeftUpper),
        "LeftLower" => Ok(TileKind::LeftLower),
        "Horizontal" => Ok(TileKind::Horizontal),
        "Vertical" => Ok(TileKind::Vertical),
        "Empty" => Ok(TileKind::Empty),
        _ => bail!("unknown tile key `{name}`"),
    }
}
