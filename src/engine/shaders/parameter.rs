use std::fmt;

use glam::{Mat4, Vec3, Vec4};
use log::error;

use crate::engine::errors::ContractError;
use crate::engine::gpu::{GraphicsDevice, UniformLocation};

/// GLSL uniform types the engine can feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Bool,
    Float,
    Vec3,
    Vec4,
    Mat4,
    Sampler2D,
}

impl UniformType {
    /// Maps a GLSL type keyword, ignoring ASCII case
    pub fn from_glsl(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "bool" => Some(UniformType::Bool),
            "float" => Some(UniformType::Float),
            "vec3" => Some(UniformType::Vec3),
            "vec4" => Some(UniformType::Vec4),
            "mat4" => Some(UniformType::Mat4),
            "sampler2d" => Some(UniformType::Sampler2D),
            _ => None,
        }
    }

    pub fn glsl_name(&self) -> &'static str {
        match self {
            UniformType::Bool => "bool",
            UniformType::Float => "float",
            UniformType::Vec3 => "vec3",
            UniformType::Vec4 => "vec4",
            UniformType::Mat4 => "mat4",
            UniformType::Sampler2D => "sampler2D",
        }
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    /// Texture unit the sampler reads from
    Sampler2D(u32),
}

impl UniformValue {
    pub fn uniform_type(&self) -> UniformType {
        match self {
            UniformValue::Bool(_) => UniformType::Bool,
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::Mat4(_) => UniformType::Mat4,
            UniformValue::Sampler2D(_) => UniformType::Sampler2D,
        }
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        UniformValue::Bool(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        UniformValue::Vec4(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        UniformValue::Mat4(value)
    }
}

/// A named, typed uniform slot of one shader program.
///
/// The slot starts empty and becomes satisfied after its first successful
/// `set`; later frames keep uploading the last value until it is replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderParameter {
    name: String,
    uniform_type: UniformType,
    location: Option<UniformLocation>,
    value: Option<UniformValue>,
}

impl ShaderParameter {
    pub fn new(name: impl Into<String>, uniform_type: UniformType, location: Option<UniformLocation>) -> Self {
        Self {
            name: name.into(),
            uniform_type,
            location,
            value: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uniform_type(&self) -> UniformType {
        self.uniform_type
    }

    /// `None` when the driver reported the uniform inactive
    pub fn location(&self) -> Option<UniformLocation> {
        self.location
    }

    pub fn value(&self) -> Option<UniformValue> {
        self.value
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Stores `value` if its type matches the declared one
    pub fn set(&mut self, value: impl Into<UniformValue>) -> Result<(), ContractError> {
        let value = value.into();
        if value.uniform_type() != self.uniform_type {
            let err = ContractError::TypeMismatch {
                name: self.name.clone(),
                expected: self.uniform_type,
                actual: value.uniform_type(),
            };
            error!("{}", err);
            return Err(err);
        }
        self.value = Some(value);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    /// Uploads the stored value to the bound program.
    /// Returns false when there is nothing to send or nowhere to send it.
    pub fn upload(&self, gl: &dyn GraphicsDevice) -> bool {
        let (Some(location), Some(value)) = (self.location, self.value) else {
            return false;
        };

        match value {
            UniformValue::Bool(v) => gl.uniform_1_i32(location, v as i32),
            UniformValue::Float(v) => gl.uniform_1_f32(location, v),
            UniformValue::Vec3(v) => gl.uniform_3_f32(location, v.to_array()),
            UniformValue::Vec4(v) => gl.uniform_4_f32(location, v.to_array()),
            UniformValue::Mat4(m) => gl.uniform_matrix_4_f32(location, &m.to_cols_array()),
            UniformValue::Sampler2D(unit) => gl.uniform_1_i32(location, unit as i32),
        }
        true
    }
}
