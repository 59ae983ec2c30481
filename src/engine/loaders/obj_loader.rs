//! Wavefront OBJ importer for the `v` / `vt` / `vn` / `f` subset.
//!
//! Polygons are fan-triangulated, identical (position, texcoord, normal)
//! combinations are merged into one vertex, and normals are derived when the
//! file provides none. Everything else in the file is ignored.

use std::collections::HashMap;
use std::path::Path;

use glam::{Vec2, Vec3};
use log::{debug, info, warn};

use crate::engine::components::{Face, Vertex, VertexIndex};
use crate::engine::errors::AssetError;
use crate::engine::utils::{compute_normals, read_file, NormalMode};

/// Counters for input the importer dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Faces rejected because a reference pointed outside its list
    pub skipped_faces: usize,
    /// Recognized records with the wrong arity or unparsable numbers
    pub malformed_lines: usize,
}

/// Indexed triangle geometry produced by [`ObjLoader`]
#[derive(Debug, Clone, Default)]
pub struct ImportedGeometry {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    pub stats: ImportStats,
    /// Set when normals were computed rather than read from the file
    pub derived_normals: Option<NormalMode>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjLoader {
    normal_mode: NormalMode,
}

impl ObjLoader {
    pub fn new(normal_mode: NormalMode) -> Self {
        Self { normal_mode }
    }

    pub fn normal_mode(&self) -> NormalMode {
        self.normal_mode
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<ImportedGeometry, AssetError> {
        let path = path.as_ref();
        let text = read_file(path)?;
        let geometry = self.parse(&text);
        info!(
            "Loaded model {}: {} vertices, {} triangles",
            path.display(),
            geometry.vertices.len(),
            geometry.faces.len()
        );
        Ok(geometry)
    }

    /// Parses OBJ text. Never fails; bad records are counted in [`ImportStats`].
    pub fn parse(&self, text: &str) -> ImportedGeometry {
        let mut parser = ObjParser::default();
        for (line_number, line) in text.lines().enumerate() {
            parser.parse_line(line_number + 1, line);
        }
        parser.finish(self.normal_mode)
    }
}

/// One `f` corner resolved to zero-based indices
#[derive(Debug, Clone, Copy)]
struct Corner {
    position: usize,
    texture_coord: Option<usize>,
    normal: Option<usize>,
}

/// A raw `p/t/n` reference before range checking
#[derive(Debug, Clone, Copy)]
struct Reference {
    position: i64,
    texture_coord: Option<i64>,
    normal: Option<i64>,
}

#[derive(Default)]
struct ObjParser {
    positions: Vec<Vec3>,
    texture_coords: Vec<Vec2>,
    normals: Vec<Vec3>,
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    dedup: HashMap<Vertex, VertexIndex>,
    stats: ImportStats,
}

impl ObjParser {
    fn parse_line(&mut self, line_number: usize, line: &str) {
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return;
        };
        let args: Vec<&str> = tokens.collect();

        let parsed = match keyword {
            "v" => parse_floats::<3>(&args).map(|[x, y, z]| self.positions.push(Vec3::new(x, y, z))),
            "vn" => parse_floats::<3>(&args).map(|[x, y, z]| self.normals.push(Vec3::new(x, y, z))),
            "vt" => self.parse_texture_coord(&args),
            "f" => self.parse_face(&args),
            _ => return,
        };

        if parsed.is_none() {
            self.stats.malformed_lines += 1;
            debug!("Ignoring malformed '{}' record on line {}", keyword, line_number);
        }
    }

    /// `vt u v` with an optional third component that is ignored
    fn parse_texture_coord(&mut self, args: &[&str]) -> Option<()> {
        let [u, v] = match args.len() {
            2 => parse_floats::<2>(args)?,
            3 => {
                let [u, v, _] = parse_floats::<3>(args)?;
                [u, v]
            }
            _ => return None,
        };
        self.texture_coords.push(Vec2::new(u, v));
        Some(())
    }

    fn parse_face(&mut self, args: &[&str]) -> Option<()> {
        if args.len() < 3 {
            return None;
        }
        let references = args
            .iter()
            .map(|token| parse_reference(token))
            .collect::<Option<Vec<_>>>()?;

        let corners: Option<Vec<Corner>> = references
            .iter()
            .map(|reference| self.resolve(reference))
            .collect();
        let Some(corners) = corners else {
            self.stats.skipped_faces += 1;
            return Some(());
        };

        // Fan around the first corner: (0, i, i + 1)
        let first = self.vertex_index(corners[0]);
        for pair in corners[1..].windows(2) {
            let second = self.vertex_index(pair[0]);
            let third = self.vertex_index(pair[1]);
            self.faces.push([first, second, third]);
        }
        Some(())
    }

    fn resolve(&self, reference: &Reference) -> Option<Corner> {
        Some(Corner {
            position: resolve_index(reference.position, self.positions.len())?,
            texture_coord: match reference.texture_coord {
                Some(index) => Some(resolve_index(index, self.texture_coords.len())?),
                None => None,
            },
            normal: match reference.normal {
                Some(index) => Some(resolve_index(index, self.normals.len())?),
                None => None,
            },
        })
    }

    fn vertex_index(&mut self, corner: Corner) -> VertexIndex {
        let vertex = Vertex {
            position: self.positions[corner.position],
            texture_coord: corner.texture_coord.map(|i| self.texture_coords[i]),
            normal: corner.normal.map(|i| self.normals[i]),
        };

        if let Some(&index) = self.dedup.get(&vertex) {
            return index;
        }
        let index = self.vertices.len() as VertexIndex;
        self.vertices.push(vertex);
        self.dedup.insert(vertex, index);
        index
    }

    fn finish(self, normal_mode: NormalMode) -> ImportedGeometry {
        if self.stats.skipped_faces > 0 {
            warn!("{} faces skipped due to out of bounds indices", self.stats.skipped_faces);
        }
        if self.stats.malformed_lines > 0 {
            warn!("{} malformed lines ignored", self.stats.malformed_lines);
        }

        let mut geometry = ImportedGeometry {
            vertices: self.vertices,
            faces: self.faces,
            stats: self.stats,
            derived_normals: None,
        };

        if self.normals.is_empty() && !geometry.vertices.is_empty() {
            geometry.vertices = compute_normals(&geometry.vertices, &geometry.faces, normal_mode);
            geometry.derived_normals = Some(normal_mode);
        }
        geometry
    }
}

fn parse_floats<const N: usize>(args: &[&str]) -> Option<[f32; N]> {
    if args.len() != N {
        return None;
    }
    let mut values = [0.0; N];
    for (value, arg) in values.iter_mut().zip(args) {
        *value = arg.parse().ok()?;
    }
    Some(values)
}

/// Parses `p`, `p/t`, `p//n` or `p/t/n`. Empty components mean "absent".
fn parse_reference(token: &str) -> Option<Reference> {
    let mut parts = token.split('/');
    let position = parts.next()?.parse().ok()?;
    let texture_coord = parse_optional_index(parts.next())?;
    let normal = parse_optional_index(parts.next())?;
    if parts.next().is_some() {
        return None;
    }
    Some(Reference {
        position,
        texture_coord,
        normal,
    })
}

/// Outer `None` is a parse failure, inner `None` an absent component
fn parse_optional_index(part: Option<&str>) -> Option<Option<i64>> {
    match part {
        None | Some("") => Some(None),
        Some(text) => text.parse().ok().map(Some),
    }
}

/// One-based OBJ index to zero-based. Zero, negative and past-the-end indices are rejected.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    if index >= 1 && (index as u64) <= len as u64 {
        Some(index as usize - 1)
    } else {
        None
    }
}
