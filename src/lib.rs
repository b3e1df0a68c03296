//! geomip - geometry clipmap terrain renderer
//!
//! Nested square grids of doubling spacing follow the viewer over a static
//! heightmap. The terrain core is back-end neutral: it talks to a
//! [`render::RenderDevice`], implemented for wgpu and for a CPU-side
//! headless device used by tests and tools.

pub mod core;
pub mod math;
pub mod terrain;
pub mod render;
