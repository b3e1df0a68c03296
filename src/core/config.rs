//! Terrain configuration, loaded from JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::terrain::settings::DEFAULT_LEVEL_COUNT;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything needed to build a [`crate::terrain::Terrain`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Number of clipmap levels. The finest level has grid spacing 1,
    /// each coarser level doubles it.
    pub level_count: usize,
    /// Where the 16-bit heightmap comes from.
    pub heightmap: HeightmapSource,
    /// Optional RGBA texture tiled over the terrain.
    pub grass_texture: Option<PathBuf>,
    /// World-space height of a heightmap sample of 65535.
    pub height_scale: f32,
    /// Direction towards the light, world space (z up).
    pub light_direction: [f32; 3],
    /// Rewrite only the newly exposed texels when a level moves instead of
    /// the whole elevation texture.
    pub toroidal_updates: bool,
    /// Tint each geometry kind (blocks, fixups, trims, stitches) with its
    /// own colour.
    pub debug_shading: bool,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            level_count: DEFAULT_LEVEL_COUNT,
            heightmap: HeightmapSource::default(),
            grass_texture: None,
            height_scale: 600.0,
            light_direction: [0.0, 0.0, 1.0],
            toroidal_updates: false,
            debug_shading: false,
        }
    }
}

impl TerrainConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Save as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Light direction, normalized. Falls back to straight up for a zero vector.
    pub fn light_direction(&self) -> glam::Vec3 {
        glam::Vec3::from_array(self.light_direction).try_normalize().unwrap_or(glam::Vec3::Z)
    }
}

// ---------------------------------------------------------------------------
// Heightmap source
// ---------------------------------------------------------------------------

/// Source of the static heightmap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeightmapSource {
    /// Grayscale image on disk (16-bit PNG/TIFF preferred, 8-bit is widened).
    File { path: PathBuf },
    /// Fractal noise, generated at startup.
    Procedural {
        /// Width and height in samples.
        size: u32,
        seed: u32,
        octaves: usize,
        /// Base frequency in cycles per sample.
        frequency: f64,
    },
}

impl Default for HeightmapSource {
    fn default() -> Self {
        Self::Procedural {
            size: 1024,
            seed: 7,
            octaves: 6,
            frequency: 1.0 / 256.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TerrainConfig::default();
        assert_eq!(config.level_count, DEFAULT_LEVEL_COUNT);
        assert!(!config.toroidal_updates);
        assert_eq!(config.light_direction(), glam::Vec3::Z);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "level_count": 3, "heightmap": { "kind": "file", "path": "maps/alps.png" } }"#;
        let config: TerrainConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.level_count, 3);
        assert_eq!(config.heightmap, HeightmapSource::File { path: PathBuf::from("maps/alps.png") });
        assert_eq!(config.height_scale, TerrainConfig::default().height_scale);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("terrain.json");

        let mut config = TerrainConfig::default();
        config.toroidal_updates = true;
        config.grass_texture = Some(PathBuf::from("grass.png"));
        config.save(&path).unwrap();

        let loaded = TerrainConfig::load(&path).unwrap();
        assert!(loaded.toroidal_updates);
        assert_eq!(loaded.grass_texture, Some(PathBuf::from("grass.png")));
        assert_eq!(loaded.heightmap, config.heightmap);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ level_count: ").unwrap();
        assert!(matches!(TerrainConfig::load(&path), Err(crate::core::Error::Config(_))));
    }

    #[test]
    fn test_zero_light_direction_falls_back() {
        let mut config = TerrainConfig::default();
        config.light_direction = [0.0, 0.0, 0.0];
        assert_eq!(config.light_direction(), glam::Vec3::Z);
    }
}
