//! In-memory [`GraphicsDevice`] that records every call, for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use super::{
    BufferHandle, BufferTarget, BufferUsage, Capability, GraphicsDevice, ProgramHandle,
    ShaderHandle, ShaderStage, TextureHandle, UniformLocation, VertexArrayHandle,
};

#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CompileShader(ShaderStage),
    DeleteShader(ShaderHandle),
    LinkProgram(ProgramHandle),
    DeleteProgram(ProgramHandle),
    UseProgram(Option<ProgramHandle>),
    UniformInt(UniformLocation, i32),
    UniformFloat(UniformLocation, f32),
    UniformVec3(UniformLocation, [f32; 3]),
    UniformVec4(UniformLocation, [f32; 4]),
    UniformMat4(UniformLocation, [f32; 16]),
    BindVertexArray(Option<VertexArrayHandle>),
    DeleteVertexArray(VertexArrayHandle),
    BindBuffer(BufferTarget, Option<BufferHandle>),
    BufferDataSize(BufferTarget, usize, BufferUsage),
    BufferData(BufferTarget, Vec<u8>, BufferUsage),
    BufferSubData(BufferTarget, usize, Vec<u8>),
    WriteMapped(BufferTarget, Vec<u8>),
    DeleteBuffer(BufferHandle),
    EnableAttrib(u32),
    AttribPointer { index: u32, size: i32, stride: i32, offset: i32 },
    UploadTexture(TextureHandle, u32, u32),
    BindTexture(u32, Option<TextureHandle>),
    DeleteTexture(TextureHandle),
    Viewport(i32, i32),
    SetCapability(Capability, bool),
    BlendAlpha,
    Clear(Option<[f32; 4]>, bool),
    DrawElements(i32),
}

#[derive(Default)]
pub struct RecordingDevice {
    calls: RefCell<Vec<GlCall>>,
    next_handle: Cell<u32>,
    locations: RefCell<HashMap<(ProgramHandle, String), UniformLocation>>,
    inactive_uniforms: HashSet<String>,
    fail_link: bool,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uniforms with these names report no location, as if the linker optimized them out
    pub fn with_inactive_uniforms(mut self, names: &[&str]) -> Self {
        self.inactive_uniforms = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn failing_link(mut self) -> Self {
        self.fail_link = true;
        self
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, GlCall::DrawElements(_)))
            .count()
    }

    fn record(&self, call: GlCall) {
        self.calls.borrow_mut().push(call);
    }

    fn next_id(&self) -> NonZeroU32 {
        let id = self.next_handle.get() + 1;
        self.next_handle.set(id);
        NonZeroU32::new(id).unwrap()
    }
}

impl GraphicsDevice for RecordingDevice {
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String> {
        self.record(GlCall::CompileShader(stage));
        if source.contains("#error") {
            return Err(format!("0:1: {} stage: #error directive", stage));
        }
        Ok(ShaderHandle(self.next_id()))
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        self.record(GlCall::DeleteShader(shader));
    }

    fn link_program(&self, _shaders: &[ShaderHandle]) -> Result<ProgramHandle, String> {
        if self.fail_link {
            return Err("error: undefined varying".to_string());
        }
        let program = ProgramHandle(self.next_id());
        self.record(GlCall::LinkProgram(program));
        Ok(program)
    }

    fn delete_program(&self, program: ProgramHandle) {
        self.record(GlCall::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        self.record(GlCall::UseProgram(program));
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        if self.inactive_uniforms.contains(name) {
            return None;
        }
        let mut locations = self.locations.borrow_mut();
        let next = locations.len() as u32;
        Some(*locations
            .entry((program, name.to_string()))
            .or_insert(UniformLocation(next)))
    }

    fn uniform_1_i32(&self, location: UniformLocation, value: i32) {
        self.record(GlCall::UniformInt(location, value));
    }

    fn uniform_1_f32(&self, location: UniformLocation, value: f32) {
        self.record(GlCall::UniformFloat(location, value));
    }

    fn uniform_3_f32(&self, location: UniformLocation, value: [f32; 3]) {
        self.record(GlCall::UniformVec3(location, value));
    }

    fn uniform_4_f32(&self, location: UniformLocation, value: [f32; 4]) {
        self.record(GlCall::UniformVec4(location, value));
    }

    fn uniform_matrix_4_f32(&self, location: UniformLocation, value: &[f32; 16]) {
        self.record(GlCall::UniformMat4(location, *value));
    }

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        Ok(VertexArrayHandle(self.next_id()))
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        self.record(GlCall::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        self.record(GlCall::DeleteVertexArray(vertex_array));
    }

    fn create_buffer(&self) -> Result<BufferHandle, String> {
        Ok(BufferHandle(self.next_id()))
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        self.record(GlCall::BindBuffer(target, buffer));
    }

    fn buffer_data_size(&self, target: BufferTarget, size: usize, usage: BufferUsage) {
        self.record(GlCall::BufferDataSize(target, size, usage));
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.record(GlCall::BufferData(target, data.to_vec(), usage));
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        self.record(GlCall::BufferSubData(target, offset, data.to_vec()));
    }

    fn write_mapped(&self, target: BufferTarget, data: &[u8]) -> bool {
        self.record(GlCall::WriteMapped(target, data.to_vec()));
        true
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        self.record(GlCall::DeleteBuffer(buffer));
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(GlCall::EnableAttrib(index));
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        self.record(GlCall::AttribPointer { index, size, stride, offset });
    }

    fn create_texture(&self) -> Result<TextureHandle, String> {
        Ok(TextureHandle(self.next_id()))
    }

    fn upload_texture_rgba8(&self, texture: TextureHandle, width: u32, height: u32, _pixels: &[u8]) {
        self.record(GlCall::UploadTexture(texture, width, height));
    }

    fn bind_texture(&self, unit: u32, texture: Option<TextureHandle>) {
        self.record(GlCall::BindTexture(unit, texture));
    }

    fn delete_texture(&self, texture: TextureHandle) {
        self.record(GlCall::DeleteTexture(texture));
    }

    fn viewport(&self, width: i32, height: i32) {
        self.record(GlCall::Viewport(width, height));
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        self.record(GlCall::SetCapability(capability, enabled));
    }

    fn blend_alpha(&self) {
        self.record(GlCall::BlendAlpha);
    }

    fn clear(&self, color: Option<[f32; 4]>, depth: bool) {
        self.record(GlCall::Clear(color, depth));
    }

    fn draw_elements(&self, index_count: i32) {
        self.record(GlCall::DrawElements(index_count));
    }
}
