use std::rc::Rc;
use std::sync::Arc;

use glpdf_core::{Color, Rect};
use tracing::{debug, error};

use crate::device::GraphicsDevice;
use crate::registry::{SharedDrawResources, SharedResourceRegistry};

/// Per-viewer GPU state. The vertex layout is private to the viewer even
/// though the buffers it references are shared.
pub struct InstanceDrawState<D: GraphicsDevice> {
    device: Rc<D>,
    resources: Arc<SharedDrawResources<D>>,
    vertex_layout: D::VertexLayout,
}

impl<D: GraphicsDevice> InstanceDrawState<D> {
    pub fn create(registry: &SharedResourceRegistry<D>, device: Rc<D>) -> Option<Self> {
        let resources = registry.ensure_initialized(&device)?;
        let vertex_layout =
            match device.create_vertex_layout(resources.position_buffer, resources.uv_buffer) {
                Ok(layout) => layout,
                Err(err) => {
                    error!(%err, "failed to create vertex layout");
                    return None;
                }
            };
        Some(Self {
            device,
            resources,
            vertex_layout,
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn resources(&self) -> &SharedDrawResources<D> {
        &self.resources
    }

    pub fn vertex_layout(&self) -> D::VertexLayout {
        self.vertex_layout
    }

    pub fn begin_frame(&self) {
        self.device.set_face_culling(false);
        self.device.set_blending(false);
        self.device.bind_vertex_layout(self.vertex_layout);
    }

    /// Upload and draw stay paired: the position buffer holds one quad.
    pub fn draw_window_rect(&self, window_rect: Rect) {
        self.device
            .upload_quad(self.resources.position_buffer, &window_rect.to_quad());
        self.device.draw_quad();
    }

    pub fn prepare_highlight(&self, color: Color) -> Option<D::Program> {
        let Some(program) = self.resources.highlight_program else {
            debug!("highlight program unavailable, skipping highlight");
            return None;
        };
        self.device.use_program(program);
        if let Some(location) = &self.resources.highlight_color_location {
            self.device.set_uniform_color(location, color);
        }
        Some(program)
    }

    /// Blended quad over page content. Leaves blending disabled.
    pub fn draw_highlight(&self, program: D::Program, window_rect: Rect) {
        self.device.set_blending(true);
        self.device.use_program(program);
        self.draw_window_rect(window_rect);
        self.device.set_blending(false);
    }

    pub fn teardown(self) {
        self.device.delete_vertex_layout(self.vertex_layout);
    }
}
