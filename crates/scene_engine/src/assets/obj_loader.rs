//! OBJ file loader for 3D models
//!
//! Supports the `o`, `g`, `v`, `vn`, `vt`, `usemtl` and `f` statements.
//! Every object, group or material block that follows a run of faces
//! starts a new geometry.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use super::mesh_data::{
    triangulate_polygon, GeometryData, MeshData, VertexDeduplicator, DEFAULT_NORMAL, DEFAULT_TEXCOORD,
};
use crate::foundation::math::{Vec2, Vec3};

/// OBJ loading errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A number or index could not be parsed
    #[error("Parse error at line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },
    /// An index points outside its vertex array
    #[error("Invalid format at line {line}: {message}")]
    InvalidFormat {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FaceCorner {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

#[derive(Debug, Default)]
struct MeshObject {
    name: Option<String>,
    triangles: Vec<[FaceCorner; 3]>,
}

impl MeshObject {
    fn name_if_unset(&mut self, name: String) {
        if self.name.is_none() {
            self.name = Some(name);
        }
    }
}

/// OBJ loader
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file; positions are multiplied by `scale`
    pub fn load<P: AsRef<Path>>(path: P, scale: f32) -> Result<MeshData, ObjError> {
        let path = path.as_ref();
        let default_name = path
            .file_stem()
            .map_or_else(|| "obj".to_string(), |stem| stem.to_string_lossy().into_owned());
        let reader = BufReader::new(File::open(path)?);
        Self::parse(reader, &default_name, scale)
    }

    /// Parse OBJ text from any reader
    pub fn parse<R: BufRead>(reader: R, default_name: &str, scale: f32) -> Result<MeshData, ObjError> {
        let mut positions: Vec<Vec3> = Vec::new();
        let mut normals: Vec<Vec3> = Vec::new();
        let mut texcoords: Vec<Vec2> = Vec::new();
        let mut meshes: Vec<MeshObject> = Vec::new();
        let mut prev_prefix = String::new();

        for (line_index, line) in reader.lines().enumerate() {
            let line_number = line_index + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 2 {
                continue;
            }

            let prefix = parts[0];
            let values = &parts[1..];

            // a non-face statement after a face block starts a new mesh
            if meshes.is_empty() || (prev_prefix == "f" && prefix != "f" && prefix != "s") {
                meshes.push(MeshObject::default());
            }
            prev_prefix.clear();
            prev_prefix.push_str(prefix);

            let Some(mesh) = meshes.last_mut() else {
                continue;
            };

            match prefix {
                "o" => mesh.name = Some(values.join(" ")),
                "g" => mesh.name_if_unset(values.join(" ")),
                "usemtl" | "usemat" => mesh.name_if_unset(values.join(" ")),
                "v" if values.len() >= 3 => {
                    positions.push(parse_vec3(values, line_number)? * scale);
                }
                "vn" if values.len() >= 3 => {
                    normals.push(parse_vec3(values, line_number)?);
                }
                "vt" if values.len() >= 2 => {
                    texcoords.push(Vec2::new(
                        parse_float(values[0], line_number)?,
                        parse_float(values[1], line_number)?,
                    ));
                }
                "f" => {
                    let corners = values
                        .iter()
                        .map(|token| {
                            parse_corner(token, positions.len(), texcoords.len(), normals.len(), line_number)
                        })
                        .collect::<Result<Vec<_>, _>>()?;

                    for [a, b, c] in triangulate_polygon(corners.len()) {
                        mesh.triangles.push([corners[a], corners[b], corners[c]]);
                    }
                }
                _ => {
                    // Ignore other statements
                }
            }
        }

        let mut mesh_data = MeshData::default();
        for mesh in meshes {
            let name = mesh.name.clone().unwrap_or_else(|| default_name.to_string());
            let geometry = build_geometry(name, &mesh, &positions, &normals, &texcoords);
            if geometry.positions.is_empty() {
                log::info!("{} has an empty mesh. {}", default_name, geometry.name);
                continue;
            }
            mesh_data.geometries.push(geometry);
        }

        Ok(mesh_data)
    }
}

fn build_geometry(
    name: String,
    mesh: &MeshObject,
    positions: &[Vec3],
    normals: &[Vec3],
    texcoords: &[Vec2],
) -> GeometryData {
    let mut geometry = GeometryData {
        name,
        ..Default::default()
    };
    let mut dedup = VertexDeduplicator::new();

    for corner in mesh.triangles.iter().flatten() {
        if dedup.push((corner.position, corner.normal, corner.texcoord)) {
            geometry.positions.push(positions[corner.position]);

            let normal = corner
                .normal
                .map_or_else(|| Vec3::from(DEFAULT_NORMAL), |index| normals[index]);
            geometry
                .normals
                .push(normal.try_normalize(f32::EPSILON).unwrap_or_else(|| Vec3::from(DEFAULT_NORMAL)));

            let texcoord = corner
                .texcoord
                .map_or_else(|| Vec2::from(DEFAULT_TEXCOORD), |index| texcoords[index]);
            geometry.texcoords.push(texcoord);
        }
    }

    geometry.indices = dedup.into_indices();
    geometry.compute_bounds();
    geometry
}

fn parse_float(value: &str, line: usize) -> Result<f32, ObjError> {
    value.parse().map_err(|_| ObjError::ParseError {
        line,
        message: format!("invalid number '{value}'"),
    })
}

fn parse_vec3(values: &[&str], line: usize) -> Result<Vec3, ObjError> {
    Ok(Vec3::new(
        parse_float(values[0], line)?,
        parse_float(values[1], line)?,
        parse_float(values[2], line)?,
    ))
}

/// Resolve a 1-based or negative relative OBJ index against `count` items
fn resolve_index(token: &str, count: usize, what: &str, line: usize) -> Result<usize, ObjError> {
    let raw: i64 = token.parse().map_err(|_| ObjError::ParseError {
        line,
        message: format!("invalid {what} index '{token}'"),
    })?;

    #[allow(clippy::cast_possible_wrap)]
    let count_signed = count as i64;
    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r - 1),
        r => Some(count_signed + r),
    };

    match resolved {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        Some(index) if (0..count_signed).contains(&index) => Ok(index as usize),
        _ => Err(ObjError::InvalidFormat {
            line,
            message: format!("{what} index {raw} out of range (have {count})"),
        }),
    }
}

fn parse_corner(
    token: &str,
    position_count: usize,
    texcoord_count: usize,
    normal_count: usize,
    line: usize,
) -> Result<FaceCorner, ObjError> {
    let mut slots = token.split('/');
    let position = resolve_index(slots.next().unwrap_or_default(), position_count, "position", line)?;

    let texcoord = match slots.next() {
        Some(slot) if !slot.is_empty() => Some(resolve_index(slot, texcoord_count, "texcoord", line)?),
        _ => None,
    };
    let normal = match slots.next() {
        Some(slot) if !slot.is_empty() => Some(resolve_index(slot, normal_count, "normal", line)?),
        _ => None,
    };

    Ok(FaceCorner {
        position,
        texcoord,
        normal,
    })
}
