//! Rendering back ends and GPU interfaces

pub mod device;
pub mod headless;
pub mod context;
pub mod depth;
pub mod wgpu_device;
pub mod pipeline;

pub use device::{ElevationUpdate, NormalMapUpdate, RenderDevice, TargetFormat};
pub use headless::HeadlessDevice;
pub use wgpu_device::WgpuDevice;
