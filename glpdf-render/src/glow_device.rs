use glow::HasContext;
use glpdf_core::{Color, Quad};
use tracing::debug;

use crate::device::{GpuError, GraphicsDevice, ShaderStage};

type Gl = glow::Context;
type Shader = <Gl as HasContext>::Shader;

const FLOATS_PER_VERTEX: i32 = 2;
const QUAD_VERTICES: i32 = 4;

/// [`GraphicsDevice`] over an OpenGL 3.3 core context.
pub struct GlowDevice {
    gl: Gl,
}

impl GlowDevice {
    /// # Safety
    ///
    /// `gl` must have been loaded for a context that is current on the
    /// calling thread every time a method of the returned device runs.
    pub unsafe fn new(gl: Gl) -> Self {
        Self { gl }
    }

    unsafe fn compile_shader(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Shader, GpuError> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        let shader = self
            .gl
            .create_shader(kind)
            .map_err(|reason| GpuError::Allocation {
                what: "shader",
                reason,
            })?;
        self.gl.shader_source(shader, source);
        self.gl.compile_shader(shader);
        if !self.gl.get_shader_compile_status(shader) {
            let log = self.gl.get_shader_info_log(shader);
            self.gl.delete_shader(shader);
            return Err(GpuError::Compile { stage, log });
        }
        Ok(shader)
    }
}

// SAFETY (every `unsafe` block below): `GlowDevice::new` requires the
// context to be current whenever the device is used.
impl GraphicsDevice for GlowDevice {
    type Program = <Gl as HasContext>::Program;
    type Buffer = <Gl as HasContext>::Buffer;
    type VertexLayout = <Gl as HasContext>::VertexArray;
    type Texture = <Gl as HasContext>::Texture;
    type UniformLocation = <Gl as HasContext>::UniformLocation;

    fn compile_program(
        &self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self::Program, GpuError> {
        unsafe {
            let vertex = self.compile_shader(ShaderStage::Vertex, vertex_src)?;
            let fragment = match self.compile_shader(ShaderStage::Fragment, fragment_src) {
                Ok(fragment) => fragment,
                Err(err) => {
                    self.gl.delete_shader(vertex);
                    return Err(err);
                }
            };

            let program = match self.gl.create_program() {
                Ok(program) => program,
                Err(reason) => {
                    self.gl.delete_shader(vertex);
                    self.gl.delete_shader(fragment);
                    return Err(GpuError::Allocation {
                        what: "program",
                        reason,
                    });
                }
            };
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);

            let linked = self.gl.get_program_link_status(program);
            let log = self.gl.get_program_info_log(program);

            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            self.gl.delete_shader(vertex);
            self.gl.delete_shader(fragment);

            if !linked {
                self.gl.delete_program(program);
                return Err(GpuError::Link(log));
            }
            if !log.is_empty() {
                debug!(%log, "program linked with messages");
            }
            Ok(program)
        }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, GpuError> {
        unsafe {
            self.gl
                .create_buffer()
                .map_err(|reason| GpuError::Allocation {
                    what: "buffer",
                    reason,
                })
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn upload_quad(&self, buffer: Self::Buffer, vertices: &Quad) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vertices.as_slice()),
                glow::DYNAMIC_DRAW,
            );
        }
    }

    fn create_vertex_layout(
        &self,
        position: Self::Buffer,
        uv: Self::Buffer,
    ) -> Result<Self::VertexLayout, GpuError> {
        unsafe {
            let layout = self
                .gl
                .create_vertex_array()
                .map_err(|reason| GpuError::Allocation {
                    what: "vertex array",
                    reason,
                })?;
            self.gl.bind_vertex_array(Some(layout));

            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(position));
            self.gl.vertex_attrib_pointer_f32(0, FLOATS_PER_VERTEX, glow::FLOAT, false, 0, 0);

            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(uv));
            self.gl.vertex_attrib_pointer_f32(1, FLOATS_PER_VERTEX, glow::FLOAT, false, 0, 0);
            Ok(layout)
        }
    }

    fn delete_vertex_layout(&self, layout: Self::VertexLayout) {
        unsafe { self.gl.delete_vertex_array(layout) }
    }

    fn bind_vertex_layout(&self, layout: Self::VertexLayout) {
        unsafe { self.gl.bind_vertex_array(Some(layout)) }
    }

    fn set_viewport(&self, width: u32, height: u32) {
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        unsafe { self.gl.viewport(0, 0, width, height) }
    }

    fn clear(&self, color: [f32; 4]) {
        let [r, g, b, a] = color;
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn use_program(&self, program: Self::Program) {
        unsafe { self.gl.use_program(Some(program)) }
    }

    fn bind_texture(&self, texture: Self::Texture) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, Some(texture)) }
    }

    fn set_uniform_color(&self, location: &Self::UniformLocation, color: Color) {
        let [r, g, b] = color.0;
        unsafe { self.gl.uniform_3_f32(Some(location), r, g, b) }
    }

    fn set_blending(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::BLEND);
                self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            } else {
                self.gl.disable(glow::BLEND);
            }
        }
    }

    fn set_face_culling(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::CULL_FACE);
            } else {
                self.gl.disable(glow::CULL_FACE);
            }
        }
    }

    fn draw_quad(&self) {
        unsafe {
            self.gl.enable_vertex_attrib_array(0);
            self.gl.enable_vertex_attrib_array(1);
            self.gl.draw_arrays(glow::TRIANGLE_STRIP, 0, QUAD_VERTICES);
        }
    }
}
