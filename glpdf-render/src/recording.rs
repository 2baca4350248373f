use std::cell::{Cell, RefCell};

use glpdf_core::{Color, Quad};
use serde::Serialize;

use crate::device::{GpuError, GraphicsDevice, ShaderStage};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    CompileProgram { program: u32 },
    DeleteProgram { program: u32 },
    CreateBuffer { buffer: u32 },
    DeleteBuffer { buffer: u32 },
    UploadQuad { buffer: u32, vertices: Quad },
    CreateVertexLayout { layout: u32, position: u32, uv: u32 },
    DeleteVertexLayout { layout: u32 },
    BindVertexLayout { layout: u32 },
    Viewport { width: u32, height: u32 },
    Clear { color: [f32; 4] },
    UseProgram { program: u32 },
    BindTexture { texture: u32 },
    UniformColor { location: u32, color: [f32; 3] },
    Blending { enabled: bool },
    FaceCulling { enabled: bool },
    DrawQuad,
}

/// Headless [`GraphicsDevice`] that hands out integer handles and records
/// every call, for tests and draw-list dumps.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    commands: RefCell<Vec<DrawCommand>>,
    next_handle: Cell<u32>,
    compile_calls: Cell<usize>,
    failing_fragments: RefCell<Vec<String>>,
    fail_buffers: Cell<bool>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<DrawCommand> {
        self.commands.borrow().clone()
    }

    pub fn take_commands(&self) -> Vec<DrawCommand> {
        self.commands.take()
    }

    pub fn compile_calls(&self) -> usize {
        self.compile_calls.get()
    }

    /// Makes `compile_program` fail for fragment sources containing `needle`.
    pub fn fail_fragments_containing(&self, needle: &str) {
        self.failing_fragments.borrow_mut().push(needle.to_owned());
    }

    pub fn fail_buffer_allocation(&self, fail: bool) {
        self.fail_buffers.set(fail);
    }

    fn record(&self, command: DrawCommand) {
        self.commands.borrow_mut().push(command);
    }

    fn allocate(&self) -> u32 {
        let handle = self.next_handle.get() + 1;
        self.next_handle.set(handle);
        handle
    }
}

impl GraphicsDevice for RecordingDevice {
    type Program = u32;
    type Buffer = u32;
    type VertexLayout = u32;
    type Texture = u32;
    type UniformLocation = u32;

    fn compile_program(&self, _vertex_src: &str, fragment_src: &str) -> Result<u32, GpuError> {
        self.compile_calls.set(self.compile_calls.get() + 1);
        let failing = self
            .failing_fragments
            .borrow()
            .iter()
            .any(|needle| fragment_src.contains(needle.as_str()));
        if failing {
            return Err(GpuError::Compile {
                stage: ShaderStage::Fragment,
                log: "rejected by recording device".to_owned(),
            });
        }
        let program = self.allocate();
        self.record(DrawCommand::CompileProgram { program });
        Ok(program)
    }

    fn delete_program(&self, program: u32) {
        self.record(DrawCommand::DeleteProgram { program });
    }

    fn uniform_location(&self, program: u32, _name: &str) -> Option<u32> {
        Some(program)
    }

    fn create_buffer(&self) -> Result<u32, GpuError> {
        if self.fail_buffers.get() {
            return Err(GpuError::Allocation {
                what: "buffer",
                reason: "rejected by recording device".to_owned(),
            });
        }
        let buffer = self.allocate();
        self.record(DrawCommand::CreateBuffer { buffer });
        Ok(buffer)
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record(DrawCommand::DeleteBuffer { buffer });
    }

    fn upload_quad(&self, buffer: u32, vertices: &Quad) {
        self.record(DrawCommand::UploadQuad {
            buffer,
            vertices: *vertices,
        });
    }

    fn create_vertex_layout(&self, position: u32, uv: u32) -> Result<u32, GpuError> {
        let layout = self.allocate();
        self.record(DrawCommand::CreateVertexLayout {
            layout,
            position,
            uv,
        });
        Ok(layout)
    }

    fn delete_vertex_layout(&self, layout: u32) {
        self.record(DrawCommand::DeleteVertexLayout { layout });
    }

    fn bind_vertex_layout(&self, layout: u32) {
        self.record(DrawCommand::BindVertexLayout { layout });
    }

    fn set_viewport(&self, width: u32, height: u32) {
        self.record(DrawCommand::Viewport { width, height });
    }

    fn clear(&self, color: [f32; 4]) {
        self.record(DrawCommand::Clear { color });
    }

    fn use_program(&self, program: u32) {
        self.record(DrawCommand::UseProgram { program });
    }

    fn bind_texture(&self, texture: u32) {
        self.record(DrawCommand::BindTexture { texture });
    }

    fn set_uniform_color(&self, location: &u32, color: Color) {
        self.record(DrawCommand::UniformColor {
            location: *location,
            color: color.0,
        });
    }

    fn set_blending(&self, enabled: bool) {
        self.record(DrawCommand::Blending { enabled });
    }

    fn set_face_culling(&self, enabled: bool) {
        self.record(DrawCommand::FaceCulling { enabled });
    }

    fn draw_quad(&self) {
        self.record(DrawCommand::DrawQuad);
    }
}
