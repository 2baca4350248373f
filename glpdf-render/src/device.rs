use std::fmt;

use glpdf_core::{Color, Quad};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("program failed to link: {0}")]
    Link(String),
    #[error("failed to allocate {what}: {reason}")]
    Allocation { what: &'static str, reason: String },
}

/// The slice of a GL-style immediate API the viewer draws with.
///
/// Implementations are bound to one render context and are only driven from
/// that context's thread. Quad draws read vertex attribute 0 (positions) and
/// 1 (UVs) from the bound vertex layout.
pub trait GraphicsDevice {
    type Program: Copy + fmt::Debug + PartialEq;
    type Buffer: Copy + fmt::Debug + PartialEq;
    type VertexLayout: Copy + fmt::Debug + PartialEq;
    type Texture: Copy + fmt::Debug + PartialEq;
    type UniformLocation: Clone + fmt::Debug;

    fn compile_program(
        &self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self::Program, GpuError>;
    fn delete_program(&self, program: Self::Program);
    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;

    fn create_buffer(&self) -> Result<Self::Buffer, GpuError>;
    fn delete_buffer(&self, buffer: Self::Buffer);
    /// Replaces the whole content of `buffer` with one quad.
    fn upload_quad(&self, buffer: Self::Buffer, vertices: &Quad);

    /// Binds `position` to attribute 0 and `uv` to attribute 1, two floats
    /// per vertex, tightly packed.
    fn create_vertex_layout(
        &self,
        position: Self::Buffer,
        uv: Self::Buffer,
    ) -> Result<Self::VertexLayout, GpuError>;
    fn delete_vertex_layout(&self, layout: Self::VertexLayout);
    fn bind_vertex_layout(&self, layout: Self::VertexLayout);

    fn set_viewport(&self, width: u32, height: u32);
    fn clear(&self, color: [f32; 4]);
    fn use_program(&self, program: Self::Program);
    fn bind_texture(&self, texture: Self::Texture);
    fn set_uniform_color(&self, location: &Self::UniformLocation, color: Color);
    /// Standard `SRC_ALPHA, ONE_MINUS_SRC_ALPHA` blending when enabled.
    fn set_blending(&self, enabled: bool);
    fn set_face_culling(&self, enabled: bool);
    /// Draws the bound layout as a 4-vertex triangle strip.
    fn draw_quad(&self);
}
