//! runst-render: OBJ geometry ingestion and shader-contract driven OpenGL rendering.
//!
//! Shaders declare what they need in plain GLSL (`uniform <type> <name>;` and
//! `layout(location = N) in <type> <name>;`); meshes derive their buffer layout
//! from their vertices and are only drawn once every declared uniform has a value.

pub mod engine;
