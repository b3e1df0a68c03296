//! Static 16-bit heightmap

use std::f64::consts::TAU;
use std::path::Path;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rayon::prelude::*;

use crate::core::config::HeightmapSource;
use crate::core::error::Error;
use crate::core::types::Result;

/// Immutable grid of 16-bit height samples, one per world unit.
pub struct ElevationData {
    width: u32,
    height: u32,
    samples: Vec<u16>,
}

impl ElevationData {
    /// Wrap raw row-major samples
    pub fn from_samples(width: u32, height: u32, samples: Vec<u16>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Heightmap(format!("empty heightmap ({width}x{height})")));
        }
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(Error::Heightmap(format!("heightmap too large ({width}x{height})")));
        }
        if samples.len() != width as usize * height as usize {
            return Err(Error::Heightmap(format!(
                "expected {} samples for {width}x{height}, got {}",
                width as usize * height as usize,
                samples.len()
            )));
        }
        Ok(Self { width, height, samples })
    }

    /// Load a grayscale image. 8-bit images are widened to 16 bits.
    pub fn load(path: &Path) -> Result<Self> {
        let image = image::open(path)?.into_luma16();
        let (width, height) = image.dimensions();
        log::info!("Loaded heightmap {} ({}x{})", path.display(), width, height);
        Self::from_samples(width, height, image.into_raw())
    }

    /// Tileable fractal noise heightmap of `size`×`size` samples.
    ///
    /// The noise is sampled on a 4D torus so opposite edges match, which keeps
    /// wrapped sampling seamless.
    pub fn procedural(size: u32, seed: u32, octaves: usize, frequency: f64) -> Result<Self> {
        if size == 0 {
            return Err(Error::Heightmap("procedural heightmap size is 0".into()));
        }

        let fbm = Fbm::<Perlin>::new(seed)
            .set_octaves(octaves.max(1))
            .set_persistence(0.5)
            .set_lacunarity(2.0);

        // Circumference of the torus equals `size * frequency` noise units
        let radius = size as f64 * frequency / TAU;
        let width = size as usize;
        let mut samples = vec![0u16; width * width];

        samples.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            let ay = TAU * y as f64 / size as f64;
            for (x, sample) in row.iter_mut().enumerate() {
                let ax = TAU * x as f64 / size as f64;
                let value = fbm.get([
                    radius * ax.cos(),
                    radius * ax.sin(),
                    radius * ay.cos(),
                    radius * ay.sin(),
                ]);
                let normalized = ((value + 1.0) * 0.5).clamp(0.0, 1.0);
                *sample = (normalized * u16::MAX as f64).round() as u16;
            }
        });

        log::info!("Generated procedural heightmap {}x{} (seed {}, {} octaves)", size, size, seed, octaves);
        Self::from_samples(size, size, samples)
    }

    /// Build from a configured source
    pub fn from_source(source: &HeightmapSource) -> Result<Self> {
        match source {
            HeightmapSource::File { path } => Self::load(path),
            HeightmapSource::Procedural { size, seed, octaves, frequency } => {
                Self::procedural(*size, *seed, *octaves, *frequency)
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw row-major samples
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Sample at `(x, y)`, or 0 outside the map
    pub fn get(&self, x: i32, y: i32) -> u16 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.samples[y as usize * self.width as usize + x as usize]
    }

    /// Sample with toroidal addressing, matching a wrapping texture sampler
    pub fn sample_wrapped(&self, x: i32, y: i32) -> u16 {
        let x = x.rem_euclid(self.width as i32) as usize;
        let y = y.rem_euclid(self.height as i32) as usize;
        self.samples[y * self.width as usize + x]
    }

    /// Lowest and highest sample
    pub fn range(&self) -> (u16, u16) {
        self.samples
            .par_iter()
            .fold(|| (u16::MAX, u16::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)))
            .reduce(|| (u16::MAX, u16::MIN), |a, b| (a.0.min(b.0), a.1.max(b.1)))
    }
}
