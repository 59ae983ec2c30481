use std::collections::{BTreeMap, HashMap};

use log::{debug, error, info, warn};

use super::scanner::{scan_requirements, VertexAttribute};
use super::{ShaderParameter, UniformValue};
use crate::engine::errors::{ContractError, ShaderError};
use crate::engine::gpu::{GraphicsDevice, ProgramHandle, ShaderStage};

/// A linked program together with what it needs from the engine:
/// one typed slot per declared uniform and a location per vertex input.
#[derive(Debug)]
pub struct ShaderContract {
    name: String,
    program: Option<ProgramHandle>,
    parameters: BTreeMap<String, ShaderParameter>,
    attributes: HashMap<VertexAttribute, u32>,
}

impl ShaderContract {
    /// Compiles and links a vertex/fragment pair, then scans both sources
    /// for uniforms and vertex inputs.
    pub fn compile(
        gl: &dyn GraphicsDevice,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let compile = |stage: ShaderStage, source: &str| {
            gl.compile_shader(stage, source).map_err(|log| ShaderError::Compile {
                shader: name.to_string(),
                stage,
                log,
            })
        };

        let vs = compile(ShaderStage::Vertex, vertex_source)?;
        let fs = match compile(ShaderStage::Fragment, fragment_source) {
            Ok(fs) => fs,
            Err(err) => {
                gl.delete_shader(vs);
                return Err(err);
            }
        };

        let linked = gl.link_program(&[vs, fs]);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
        let program = linked.map_err(|log| ShaderError::Link {
            shader: name.to_string(),
            log,
        })?;

        let requirements = scan_requirements(&format!("{}\n{}", vertex_source, fragment_source));

        let mut parameters = BTreeMap::new();
        for (uniform, uniform_type) in requirements.uniforms {
            let location = gl.uniform_location(program, &uniform);
            if location.is_none() {
                debug!("Uniform {} of shader {} is inactive; it will not be uploaded", uniform, name);
            }
            parameters.insert(uniform.clone(), ShaderParameter::new(uniform, uniform_type, location));
        }

        let mut attributes = HashMap::new();
        for (attribute, location) in requirements.attributes {
            if let Some(previous) = attributes.insert(attribute, location) {
                warn!(
                    "Shader {} declares the {} input twice (locations {} and {})",
                    name, attribute, previous, location
                );
            }
        }

        info!(
            "Created shader {} ({} uniforms, {} vertex inputs)",
            name,
            parameters.len(),
            attributes.len()
        );

        Ok(Self {
            name: name.to_string(),
            program: Some(program),
            parameters,
            attributes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` once the program has been deleted
    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    pub fn is_uniform_required(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn parameter(&self, name: &str) -> Option<&ShaderParameter> {
        self.parameters.get(name)
    }

    /// Mutable slot for `name`, or `None` (with a warning) if the shader
    /// does not declare it
    pub fn required_parameter(&mut self, name: &str) -> Option<&mut ShaderParameter> {
        let parameter = self.parameters.get_mut(name);
        if parameter.is_none() {
            warn!("Not retrieving {} as it's not a required parameter for shader {}", name, self.name);
        }
        parameter
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ShaderParameter> {
        self.parameters.values()
    }

    pub fn set_parameter(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<(), ContractError> {
        match self.parameters.get_mut(name) {
            Some(parameter) => parameter.set(value),
            None => {
                let err = ContractError::UnknownUniform {
                    shader: self.name.clone(),
                    name: name.to_string(),
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Supplies `value` only if the shader declares `name`
    pub fn supply_if_required(&mut self, name: &str, value: impl Into<UniformValue>) {
        if let Some(parameter) = self.parameters.get_mut(name) {
            // A type clash is logged by `set`; the slot keeps its old value
            let _ = parameter.set(value);
        }
    }

    pub fn attribute_location(&self, attribute: VertexAttribute) -> Option<u32> {
        self.attributes.get(&attribute).copied()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (VertexAttribute, u32)> + '_ {
        self.attributes.iter().map(|(attribute, location)| (*attribute, *location))
    }

    /// Uploads every slot that has a value to the bound program.
    ///
    /// Each slot that has never been given a value is logged, and the result
    /// is false if there was at least one.
    pub fn all_parameters_satisfied(&self, gl: &dyn GraphicsDevice) -> bool {
        let mut satisfied = true;
        for parameter in self.parameters.values() {
            if parameter.is_set() {
                parameter.upload(gl);
            } else {
                error!("Shader {} is missing a value for uniform {}", self.name, parameter.name());
                satisfied = false;
            }
        }
        satisfied
    }

    pub fn bind(&self, gl: &dyn GraphicsDevice) {
        match self.program {
            Some(program) => gl.use_program(Some(program)),
            None => error!("Shader {} was deleted and cannot be bound", self.name),
        }
    }

    pub fn unbind(&self, gl: &dyn GraphicsDevice) {
        gl.use_program(None);
    }

    /// Releases the GPU program. Later calls are no-ops.
    pub fn delete(&mut self, gl: &dyn GraphicsDevice) {
        if let Some(program) = self.program.take() {
            gl.delete_program(program);
            debug!("Deleted shader {}", self.name);
        }
    }
}
