//! OFF (Object File Format) mesh reader.
//!
//! Accepts the plain ASCII variant: an `OFF` header, a counts line
//! (`vertices faces edges`), one `x y z` line per vertex and one
//! `n i0 i1 .. in-1` line per polygon. Polygons are fan-triangulated.
//! `#` starts a comment; blank lines are skipped.

use std::path::{Path, PathBuf};

use glam::Vec3;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshFormatError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing OFF header")]
    MissingHeader,
    #[error("line {line}: expected vertex/face/edge counts")]
    BadCounts { line: usize },
    #[error("line {line}: mesh has {vertices} vertices and {faces} faces, nothing to draw")]
    EmptyMesh { line: usize, vertices: usize, faces: usize },
    #[error("line {line}: invalid number {token:?}")]
    InvalidNumber { line: usize, token: String },
    #[error("line {line}: vertex index {index} out of range (mesh has {count} vertices)")]
    IndexOutOfRange { line: usize, index: u32, count: usize },
    #[error("line {line}: face has {arity} vertices, at least 3 required")]
    DegenerateFace { line: usize, arity: usize },
    #[error("unexpected end of file: expected {expected} more {what}")]
    UnexpectedEof { expected: usize, what: &'static str },
}

/// Indexed triangle mesh with per-vertex normals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }

    /// Area-weighted vertex normals from the triangle list.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let face = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        for n in &mut normals {
            *n = n.normalize_or_zero();
        }
        self.normals = normals;
    }

    /// Centres the bounding box on the origin and scales so the farthest
    /// vertex is at distance 1.
    pub fn standardize(&mut self) {
        let Some((lo, hi)) = self.bounds() else {
            return;
        };
        let center = (lo + hi) * 0.5;
        let radius = self
            .positions
            .iter()
            .map(|p| (*p - center).length())
            .fold(0.0f32, f32::max);
        let inv = if radius > 0.0 { 1.0 / radius } else { 1.0 };
        for p in &mut self.positions {
            *p = (*p - center) * inv;
        }
    }
}

/// Reads and parses an OFF file, computing normals.
pub fn load_off(path: impl AsRef<Path>) -> Result<MeshData, MeshFormatError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| MeshFormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = parse_off(&text)?;
    log::info!(
        "Loaded {}: {} vertices, {} triangles",
        path.display(),
        mesh.positions.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

pub fn parse_off(text: &str) -> Result<MeshData, MeshFormatError> {
    // (1-based line number, tokens) for every non-empty line.
    let mut lines = text.lines().enumerate().filter_map(|(i, raw)| {
        let content = raw.split('#').next().unwrap_or("").trim();
        (!content.is_empty()).then(|| (i + 1, content))
    });

    let (header_line, header) = lines.next().ok_or(MeshFormatError::MissingHeader)?;
    let mut header_tokens = header.split_whitespace();
    if header_tokens.next() != Some("OFF") {
        return Err(MeshFormatError::MissingHeader);
    }
    // Counts may follow the header on the same line.
    let rest: Vec<&str> = header_tokens.collect();
    let (counts_line, counts) = if rest.is_empty() {
        let (line, content) = lines.next().ok_or(MeshFormatError::UnexpectedEof {
            expected: 1,
            what: "count lines",
        })?;
        (line, content.split_whitespace().collect::<Vec<_>>())
    } else {
        (header_line, rest)
    };
    if counts.len() < 2 {
        return Err(MeshFormatError::BadCounts { line: counts_line });
    }
    let vertex_count: usize = parse_token(counts[0], counts_line)?;
    let face_count: usize = parse_token(counts[1], counts_line)?;
    if vertex_count == 0 || face_count == 0 {
        return Err(MeshFormatError::EmptyMesh {
            line: counts_line,
            vertices: vertex_count,
            faces: face_count,
        });
    }
    let index_estimate = face_count
        .checked_mul(3)
        .ok_or(MeshFormatError::BadCounts { line: counts_line })?;

    // Header counts are untrusted; the text length bounds what can follow.
    let mut positions = Vec::with_capacity(vertex_count.min(text.len()));
    for remaining in (1..=vertex_count).rev() {
        let (line, content) = lines.next().ok_or(MeshFormatError::UnexpectedEof {
            expected: remaining,
            what: "vertices",
        })?;
        let coords: Vec<f32> = content
            .split_whitespace()
            .take(3)
            .map(|t| parse_token(t, line))
            .collect::<Result<_, _>>()?;
        if coords.len() < 3 {
            return Err(MeshFormatError::UnexpectedEof {
                expected: 3 - coords.len(),
                what: "vertex coordinates",
            });
        }
        positions.push(Vec3::new(coords[0], coords[1], coords[2]));
    }

    let mut indices = Vec::with_capacity(index_estimate.min(text.len()));
    for remaining in (1..=face_count).rev() {
        let (line, content) = lines.next().ok_or(MeshFormatError::UnexpectedEof {
            expected: remaining,
            what: "faces",
        })?;
        let mut tokens = content.split_whitespace();
        let arity: usize = match tokens.next() {
            Some(t) => parse_token(t, line)?,
            None => 0,
        };
        if arity < 3 {
            return Err(MeshFormatError::DegenerateFace { line, arity });
        }
        let face: Vec<u32> = tokens
            .take(arity)
            .map(|t| parse_token(t, line))
            .collect::<Result<_, _>>()?;
        if face.len() < arity {
            return Err(MeshFormatError::UnexpectedEof {
                expected: arity - face.len(),
                what: "face indices",
            });
        }
        if let Some(&index) = face.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshFormatError::IndexOutOfRange {
                line,
                index,
                count: positions.len(),
            });
        }
        for k in 1..arity - 1 {
            indices.extend_from_slice(&[face[0], face[k], face[k + 1]]);
        }
    }

    let mut mesh = MeshData {
        positions,
        normals: Vec::new(),
        indices,
    };
    mesh.compute_normals();
    Ok(mesh)
}

fn parse_token<T: std::str::FromStr>(token: &str, line: usize) -> Result<T, MeshFormatError> {
    token.parse().map_err(|_| MeshFormatError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "OFF\n# unit quad\n4 1 0\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n\n4 0 1 2 3\n";

    #[test]
    fn test_parse_quad_fan_triangulated() {
        let mesh = parse_off(QUAD).unwrap();
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        for n in &mesh.normals {
            assert!((*n - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_counts_on_header_line() {
        let mesh = parse_off("OFF 3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n").unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(parse_off("PLY\n"), Err(MeshFormatError::MissingHeader)));
        assert!(matches!(parse_off(""), Err(MeshFormatError::MissingHeader)));
    }

    #[test]
    fn test_index_out_of_range() {
        let err = parse_off("OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 7\n").unwrap_err();
        assert!(matches!(
            err,
            MeshFormatError::IndexOutOfRange { line: 6, index: 7, count: 3 }
        ));
    }

    #[test]
    fn test_invalid_number_reports_line() {
        let err = parse_off("OFF\n1 1 0\n0 zero 0\n").unwrap_err();
        assert!(matches!(err, MeshFormatError::InvalidNumber { line: 3, .. }));
    }

    #[test]
    fn test_truncated_file() {
        let err = parse_off("OFF\n3 1 0\n0 0 0\n").unwrap_err();
        assert!(matches!(
            err,
            MeshFormatError::UnexpectedEof { expected: 2, what: "vertices" }
        ));
    }

    #[test]
    fn test_degenerate_face_rejected() {
        let err = parse_off("OFF\n2 1 0\n0 0 0\n1 0 0\n2 0 1\n").unwrap_err();
        assert!(matches!(err, MeshFormatError::DegenerateFace { arity: 2, .. }));
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let err = parse_off("OFF\n3 0 0\n0 0 0\n1 0 0\n0 1 0\n").unwrap_err();
        assert!(matches!(
            err,
            MeshFormatError::EmptyMesh { line: 2, vertices: 3, faces: 0 }
        ));
        let err = parse_off("OFF 0 0 0\n").unwrap_err();
        assert!(matches!(err, MeshFormatError::EmptyMesh { vertices: 0, .. }));
    }

    #[test]
    fn test_huge_counts_are_errors_not_aborts() {
        let err = parse_off("OFF\n18446744073709551615 0 0\n0 0 0\n").unwrap_err();
        assert!(matches!(err, MeshFormatError::EmptyMesh { faces: 0, .. }));

        let err = parse_off("OFF\n18446744073709551615 1 0\n0 0 0\n").unwrap_err();
        assert!(matches!(err, MeshFormatError::UnexpectedEof { what: "vertices", .. }));

        let err = parse_off("OFF\n3 18446744073709551615 0\n0 0 0\n").unwrap_err();
        assert!(matches!(err, MeshFormatError::BadCounts { line: 2 }));

        let err = parse_off("OFF\n3 6148914691236517205 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n").unwrap_err();
        assert!(matches!(err, MeshFormatError::UnexpectedEof { what: "faces", .. }));
    }

    #[test]
    fn test_standardize_centres_and_scales() {
        let mut mesh = parse_off(QUAD).unwrap();
        for p in &mut mesh.positions {
            *p = *p * 10.0 + Vec3::new(5.0, -3.0, 2.0);
        }
        mesh.standardize();
        let (lo, hi) = mesh.bounds().unwrap();
        assert!(((lo + hi) * 0.5).length() < 1e-5);
        let max = mesh.positions.iter().map(|p| p.length()).fold(0.0, f32::max);
        assert!((max - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_off("definitely/not/here.off").unwrap_err();
        assert!(matches!(err, MeshFormatError::Io { .. }));
        assert!(err.to_string().contains("here.off"));
    }
}
