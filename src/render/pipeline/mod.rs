//! Render pipelines

pub mod terrain;

pub use terrain::{TerrainPipeline, SKY_COLOR};
