use std::sync::Arc;

use glpdf_core::Quad;
use parking_lot::Mutex;
use tracing::{error, info, instrument, warn};

use crate::device::GraphicsDevice;
use crate::shaders::ShaderSources;

pub const HIGHLIGHT_COLOR_UNIFORM: &str = "highlight_color";

/// Full-viewport square in normalized device coordinates.
pub const UNIT_QUAD_POSITIONS: Quad = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];
pub const UNIT_QUAD_UVS: Quad = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];

/// GPU assets shared by every viewer instance. A program that failed to
/// build is `None` and its draws are skipped.
pub struct SharedDrawResources<D: GraphicsDevice> {
    pub rendered_program: Option<D::Program>,
    pub unrendered_program: Option<D::Program>,
    pub highlight_program: Option<D::Program>,
    pub highlight_color_location: Option<D::UniformLocation>,
    /// Rewritten by every quad draw; holds one quad at a time.
    pub position_buffer: D::Buffer,
    pub uv_buffer: D::Buffer,
}

enum RegistryState<D: GraphicsDevice> {
    Uninitialized,
    Ready(Arc<SharedDrawResources<D>>),
    Released,
}

/// Owner of the [`SharedDrawResources`]. The host creates one registry and
/// hands it to every viewer; the first viewer whose context becomes ready
/// builds the resources, later ones reuse them.
pub struct SharedResourceRegistry<D: GraphicsDevice> {
    state: Mutex<RegistryState<D>>,
    shaders: ShaderSources,
}

impl<D: GraphicsDevice> SharedResourceRegistry<D> {
    pub fn new(shaders: ShaderSources) -> Self {
        Self {
            state: Mutex::new(RegistryState::Uninitialized),
            shaders,
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(*self.state.lock(), RegistryState::Ready(_))
    }

    /// `None` when released, or when buffer allocation failed (retried on
    /// the next call).
    #[instrument(skip_all)]
    pub fn ensure_initialized(&self, device: &D) -> Option<Arc<SharedDrawResources<D>>> {
        let mut state = self.state.lock();
        match &*state {
            RegistryState::Ready(resources) => return Some(Arc::clone(resources)),
            RegistryState::Released => {
                warn!("shared draw resources requested after release");
                return None;
            }
            RegistryState::Uninitialized => {}
        }

        let resources = Arc::new(self.build(device)?);
        *state = RegistryState::Ready(Arc::clone(&resources));
        info!(
            rendered = resources.rendered_program.is_some(),
            unrendered = resources.unrendered_program.is_some(),
            highlight = resources.highlight_program.is_some(),
            "shared draw resources initialized"
        );
        Some(resources)
    }

    /// Deletes the shared programs and buffers. Viewers must have been torn
    /// down first; the registry cannot be initialized again afterwards.
    pub fn release(&self, device: &D) {
        let previous = std::mem::replace(&mut *self.state.lock(), RegistryState::Released);
        if let RegistryState::Ready(resources) = previous {
            let programs = [
                resources.rendered_program,
                resources.unrendered_program,
                resources.highlight_program,
            ];
            for program in programs.into_iter().flatten() {
                device.delete_program(program);
            }
            device.delete_buffer(resources.position_buffer);
            device.delete_buffer(resources.uv_buffer);
            info!("shared draw resources released");
        }
    }

    fn build(&self, device: &D) -> Option<SharedDrawResources<D>> {
        let position_buffer = match device.create_buffer() {
            Ok(buffer) => buffer,
            Err(err) => {
                error!(%err, "failed to create quad position buffer");
                return None;
            }
        };
        let uv_buffer = match device.create_buffer() {
            Ok(buffer) => buffer,
            Err(err) => {
                error!(%err, "failed to create quad uv buffer");
                device.delete_buffer(position_buffer);
                return None;
            }
        };
        device.upload_quad(position_buffer, &UNIT_QUAD_POSITIONS);
        device.upload_quad(uv_buffer, &UNIT_QUAD_UVS);

        let shaders = &self.shaders;
        let vertex = shaders.vertex.as_deref();
        let rendered_program =
            compile(device, "rendered", vertex, shaders.rendered_fragment.as_deref());
        let unrendered_program =
            compile(device, "unrendered", vertex, shaders.unrendered_fragment.as_deref());
        let highlight_program =
            compile(device, "highlight", vertex, shaders.highlight_fragment.as_deref());
        let highlight_color_location = highlight_program
            .and_then(|program| device.uniform_location(program, HIGHLIGHT_COLOR_UNIFORM));
        if highlight_program.is_some() && highlight_color_location.is_none() {
            warn!("highlight program has no `{}` uniform", HIGHLIGHT_COLOR_UNIFORM);
        }

        Some(SharedDrawResources {
            rendered_program,
            unrendered_program,
            highlight_program,
            highlight_color_location,
            position_buffer,
            uv_buffer,
        })
    }
}

fn compile<D: GraphicsDevice>(
    device: &D,
    label: &'static str,
    vertex: Option<&str>,
    fragment: Option<&str>,
) -> Option<D::Program> {
    let (Some(vertex), Some(fragment)) = (vertex, fragment) else {
        error!(program = label, "shader source missing, program disabled");
        return None;
    };
    match device.compile_program(vertex, fragment) {
        Ok(program) => Some(program),
        Err(err) => {
            error!(program = label, %err, "failed to build program");
            None
        }
    }
}
