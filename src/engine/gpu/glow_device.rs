use glow::HasContext;

use super::{
    BufferHandle, BufferTarget, BufferUsage, Capability, GraphicsDevice, ProgramHandle,
    ShaderHandle, ShaderStage, TextureHandle, UniformLocation, VertexArrayHandle,
};

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn target_enum(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn usage_enum(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::StaticDraw => glow::STATIC_DRAW,
        BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
        BufferUsage::StreamDraw => glow::STREAM_DRAW,
    }
}

fn capability_enum(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::Blend => glow::BLEND,
        Capability::CullFace => glow::CULL_FACE,
    }
}

fn program(handle: ProgramHandle) -> glow::NativeProgram {
    glow::NativeProgram(handle.0)
}

fn location(location: UniformLocation) -> glow::NativeUniformLocation {
    glow::NativeUniformLocation(location.0)
}

impl GraphicsDevice for glow::Context {
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String> {
        unsafe {
            let shader = self.create_shader(stage_enum(stage))?;
            self.shader_source(shader, source);
            HasContext::compile_shader(self, shader);

            if !self.get_shader_compile_status(shader) {
                let log = self.get_shader_info_log(shader);
                HasContext::delete_shader(self, shader);
                return Err(log);
            }
            Ok(ShaderHandle(shader.0))
        }
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        unsafe { HasContext::delete_shader(self, glow::NativeShader(shader.0)) }
    }

    fn link_program(&self, shaders: &[ShaderHandle]) -> Result<ProgramHandle, String> {
        unsafe {
            let program = self.create_program()?;
            for shader in shaders {
                self.attach_shader(program, glow::NativeShader(shader.0));
            }
            HasContext::link_program(self, program);

            for shader in shaders {
                self.detach_shader(program, glow::NativeShader(shader.0));
            }

            if !self.get_program_link_status(program) {
                let log = self.get_program_info_log(program);
                HasContext::delete_program(self, program);
                return Err(log);
            }
            Ok(ProgramHandle(program.0))
        }
    }

    fn delete_program(&self, handle: ProgramHandle) {
        unsafe { HasContext::delete_program(self, program(handle)) }
    }

    fn use_program(&self, handle: Option<ProgramHandle>) {
        unsafe { HasContext::use_program(self, handle.map(program)) }
    }

    fn uniform_location(&self, handle: ProgramHandle, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.get_uniform_location(program(handle), name)
                .map(|loc| UniformLocation(loc.0))
        }
    }

    fn uniform_1_i32(&self, loc: UniformLocation, value: i32) {
        unsafe { HasContext::uniform_1_i32(self, Some(&location(loc)), value) }
    }

    fn uniform_1_f32(&self, loc: UniformLocation, value: f32) {
        unsafe { HasContext::uniform_1_f32(self, Some(&location(loc)), value) }
    }

    fn uniform_3_f32(&self, loc: UniformLocation, [x, y, z]: [f32; 3]) {
        unsafe { HasContext::uniform_3_f32(self, Some(&location(loc)), x, y, z) }
    }

    fn uniform_4_f32(&self, loc: UniformLocation, [x, y, z, w]: [f32; 4]) {
        unsafe { HasContext::uniform_4_f32(self, Some(&location(loc)), x, y, z, w) }
    }

    fn uniform_matrix_4_f32(&self, loc: UniformLocation, value: &[f32; 16]) {
        unsafe { self.uniform_matrix_4_f32_slice(Some(&location(loc)), false, value) }
    }

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        unsafe { HasContext::create_vertex_array(self).map(|vao| VertexArrayHandle(vao.0)) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        unsafe {
            HasContext::bind_vertex_array(self, vertex_array.map(|vao| glow::NativeVertexArray(vao.0)))
        }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        unsafe { HasContext::delete_vertex_array(self, glow::NativeVertexArray(vertex_array.0)) }
    }

    fn create_buffer(&self) -> Result<BufferHandle, String> {
        unsafe { HasContext::create_buffer(self).map(|buffer| BufferHandle(buffer.0)) }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        unsafe {
            HasContext::bind_buffer(self, target_enum(target), buffer.map(|b| glow::NativeBuffer(b.0)))
        }
    }

    fn buffer_data_size(&self, target: BufferTarget, size: usize, usage: BufferUsage) {
        unsafe { HasContext::buffer_data_size(self, target_enum(target), size as i32, usage_enum(usage)) }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe { self.buffer_data_u8_slice(target_enum(target), data, usage_enum(usage)) }
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        unsafe { self.buffer_sub_data_u8_slice(target_enum(target), offset as i32, data) }
    }

    fn write_mapped(&self, target: BufferTarget, data: &[u8]) -> bool {
        let target = target_enum(target);
        unsafe {
            let ptr = self.map_buffer_range(
                target,
                0,
                data.len() as i32,
                glow::MAP_WRITE_BIT | glow::MAP_INVALIDATE_BUFFER_BIT,
            );
            if ptr.is_null() {
                return false;
            }
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr, data.len());
            self.unmap_buffer(target);
        }
        true
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        unsafe { HasContext::delete_buffer(self, glow::NativeBuffer(buffer.0)) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        unsafe { HasContext::vertex_attrib_pointer_f32(self, index, size, glow::FLOAT, false, stride, offset) }
    }

    fn create_texture(&self) -> Result<TextureHandle, String> {
        unsafe { HasContext::create_texture(self).map(|texture| TextureHandle(texture.0)) }
    }

    fn upload_texture_rgba8(&self, texture: TextureHandle, width: u32, height: u32, pixels: &[u8]) {
        unsafe {
            HasContext::bind_texture(self, glow::TEXTURE_2D, Some(glow::NativeTexture(texture.0)));
            self.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );

            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);

            HasContext::bind_texture(self, glow::TEXTURE_2D, None);
        }
    }

    fn bind_texture(&self, unit: u32, texture: Option<TextureHandle>) {
        unsafe {
            self.active_texture(glow::TEXTURE0 + unit);
            HasContext::bind_texture(self, glow::TEXTURE_2D, texture.map(|t| glow::NativeTexture(t.0)));
        }
    }

    fn delete_texture(&self, texture: TextureHandle) {
        unsafe { HasContext::delete_texture(self, glow::NativeTexture(texture.0)) }
    }

    fn viewport(&self, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, 0, 0, width, height) }
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        unsafe {
            if enabled {
                self.enable(capability_enum(capability));
            } else {
                self.disable(capability_enum(capability));
            }
        }
    }

    fn blend_alpha(&self) {
        unsafe { self.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA) }
    }

    fn clear(&self, color: Option<[f32; 4]>, depth: bool) {
        let mut mask = 0;
        unsafe {
            if let Some([r, g, b, a]) = color {
                self.clear_color(r, g, b, a);
                mask |= glow::COLOR_BUFFER_BIT;
            }
            if depth {
                mask |= glow::DEPTH_BUFFER_BIT;
            }
            if mask != 0 {
                HasContext::clear(self, mask);
            }
        }
    }

    fn draw_elements(&self, index_count: i32) {
        unsafe { HasContext::draw_elements(self, glow::TRIANGLES, index_count, glow::UNSIGNED_INT, 0) }
    }
}
