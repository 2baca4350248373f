pub mod device;
pub mod instance;
pub mod recording;
pub mod registry;
pub mod shaders;
pub mod viewer;

#[cfg(feature = "gl")]
mod glow_device;

pub use device::{GpuError, GraphicsDevice, ShaderStage};
#[cfg(feature = "gl")]
pub use glow_device::GlowDevice;
pub use instance::InstanceDrawState;
pub use recording::{DrawCommand, RecordingDevice};
pub use registry::{SharedDrawResources, SharedResourceRegistry};
pub use shaders::ShaderSources;
pub use viewer::PageViewer;
