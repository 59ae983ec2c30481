//! Discovers what a shader pair expects by scanning its GLSL text.
//!
//! Only single-line declarations of the forms
//! `uniform <type> <name>;` and `layout(location = N) in <type> <name>;`
//! are recognized. Anything else is ignored.

use std::fmt;

use log::warn;

use super::UniformType;

/// Per-vertex inputs the mesh layout knows how to provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexAttribute {
    Position,
    TextureCoord,
    Normal,
}

impl VertexAttribute {
    /// Recognized input names; both snake and camel spellings are accepted
    pub fn from_input_name(name: &str) -> Option<Self> {
        match name {
            "position_in" | "positionIn" => Some(VertexAttribute::Position),
            "texture_in" | "textureIn" | "texcoord_in" | "texCoordIn" => Some(VertexAttribute::TextureCoord),
            "normal_in" | "normalIn" => Some(VertexAttribute::Normal),
            _ => None,
        }
    }

    pub fn components(&self) -> i32 {
        match self {
            VertexAttribute::Position | VertexAttribute::Normal => 3,
            VertexAttribute::TextureCoord => 2,
        }
    }
}

impl fmt::Display for VertexAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexAttribute::Position => write!(f, "position"),
            VertexAttribute::TextureCoord => write!(f, "texture coordinate"),
            VertexAttribute::Normal => write!(f, "normal"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderRequirements {
    /// Declared uniforms, in order of first appearance
    pub uniforms: Vec<(String, UniformType)>,
    pub attributes: Vec<(VertexAttribute, u32)>,
}

/// Scans combined vertex and fragment source
pub fn scan_requirements(source: &str) -> ShaderRequirements {
    let mut requirements = ShaderRequirements::default();

    for line in source.lines().map(str::trim) {
        if line.starts_with("uniform ") {
            let Some((name, uniform_type)) = parse_uniform(line) else {
                continue;
            };
            match requirements.uniforms.iter().find(|(existing, _)| *existing == name) {
                Some((_, existing_type)) if *existing_type != uniform_type => {
                    warn!(
                        "Uniform {} declared as both {} and {}; keeping {}",
                        name, existing_type, uniform_type, existing_type
                    );
                }
                Some(_) => {}
                None => requirements.uniforms.push((name, uniform_type)),
            }
        } else if line.starts_with("layout") {
            if let Some(attribute) = parse_layout_input(line) {
                requirements.attributes.push(attribute);
            }
        }
    }
    requirements
}

fn parse_uniform(line: &str) -> Option<(String, UniformType)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [_, type_name, name] = parts.as_slice() else {
        return None;
    };
    let name = name.strip_suffix(';')?;
    if !is_identifier(name) {
        return None;
    }

    match UniformType::from_glsl(type_name) {
        Some(uniform_type) => Some((name.to_string(), uniform_type)),
        None => {
            warn!("Unsupported uniform type {} for {}", type_name, name);
            None
        }
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_layout_input(line: &str) -> Option<(VertexAttribute, u32)> {
    let open = line.find('(')?;
    let close = open + line[open..].find(')')?;

    let qualifiers: String = line[open + 1..close].chars().filter(|c| !c.is_whitespace()).collect();
    let location = qualifiers
        .split(',')
        .find_map(|qualifier| qualifier.strip_prefix("location="))?
        .parse::<u32>()
        .ok()?;

    let parts: Vec<&str> = line[close + 1..].split_whitespace().collect();
    let ["in", _, name] = parts.as_slice() else {
        return None;
    };
    let name = name.strip_suffix(';')?;

    match VertexAttribute::from_input_name(name) {
        Some(attribute) => Some((attribute, location)),
        None => {
            warn!("Unrecognized vertex input {} at location {}", name, location);
            None
        }
    }
}
