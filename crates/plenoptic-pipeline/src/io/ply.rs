//! ASCII PLY reading and writing for geometry snapshots.
//!
//! Supports the subset written by common DCC exporters: a `vertex` element
//! with `x y z`, optional `nx ny nz`, optional `red green blue` (uchar or
//! float), and a `face` element with a vertex index list. Unknown
//! properties and elements are skipped on read.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use plenoptic_core::{GeometryError, GeometrySnapshot, Pt3, Vec3};
use thiserror::Error;

use super::json::write_atomic;

#[derive(Debug, Error)]
pub enum PlyError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid PLY header: {0}")]
    Header(String),
    #[error("unsupported PLY format '{0}', only ascii 1.0 is supported")]
    UnsupportedFormat(String),
    #[error("line {line}: {message}")]
    Body { line: usize, message: String },
    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryError),
    #[error("failed to write PLY: {0}")]
    Write(String),
}

#[derive(Debug, Clone)]
enum Property {
    Scalar { name: String, kind: String },
    List { name: String },
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

/// Accepted names of the face vertex index list.
const FACE_INDEX_LISTS: [&str; 2] = ["vertex_indices", "vertex_index"];

fn is_float_kind(kind: &str) -> bool {
    matches!(kind, "float" | "double" | "float32" | "float64")
}

fn parse_header<'a, I>(lines: &mut I) -> Result<(Vec<Element>, usize), PlyError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    match lines.next() {
        Some((_, l)) if l.trim() == "ply" => {}
        _ => return Err(PlyError::Header("missing 'ply' magic".into())),
    }
    let mut elements: Vec<Element> = Vec::new();
    let mut saw_format = false;
    for (idx, raw) in lines.by_ref() {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        match tokens.as_slice() {
            [] => continue,
            ["format", fmt, version] => {
                if *fmt != "ascii" || *version != "1.0" {
                    return Err(PlyError::UnsupportedFormat(format!("{fmt} {version}")));
                }
                saw_format = true;
            }
            ["comment", ..] | ["obj_info", ..] => {}
            ["element", name, count] => {
                let count = count
                    .parse()
                    .map_err(|_| PlyError::Header(format!("bad element count '{count}'")))?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            ["property", "list", _, _, name] => elements
                .last_mut()
                .ok_or_else(|| PlyError::Header("property before element".into()))?
                .properties
                .push(Property::List {
                    name: name.to_string(),
                }),
            ["property", kind, name] => elements
                .last_mut()
                .ok_or_else(|| PlyError::Header("property before element".into()))?
                .properties
                .push(Property::Scalar {
                    name: name.to_string(),
                    kind: kind.to_string(),
                }),
            ["end_header"] => {
                if !saw_format {
                    return Err(PlyError::Header("missing format line".into()));
                }
                return Ok((elements, idx + 1));
            }
            _ => return Err(PlyError::Header(format!("unrecognized line '{raw}'"))),
        }
    }
    Err(PlyError::Header("missing end_header".into()))
}

/// Parse ASCII PLY text into a snapshot.
pub fn parse_ply(text: &str) -> Result<GeometrySnapshot, PlyError> {
    let mut lines = text.lines().enumerate();
    let (elements, _) = parse_header(&mut lines)?;
    let mut body = lines.filter(|(_, l)| !l.trim().is_empty());

    let mut snapshot = GeometrySnapshot::default();
    for element in &elements {
        match element.name.as_str() {
            "vertex" => read_vertices(element, &mut body, &mut snapshot)?,
            "face" => read_faces(element, &mut body, &mut snapshot)?,
            _ => {
                for _ in 0..element.count {
                    body.next().ok_or_else(|| PlyError::Body {
                        line: 0,
                        message: format!("unexpected end of file in element '{}'", element.name),
                    })?;
                }
            }
        }
    }
    snapshot.validate()?;
    Ok(snapshot)
}

fn body_error(line: usize, message: impl Into<String>) -> PlyError {
    PlyError::Body {
        line: line + 1,
        message: message.into(),
    }
}

fn read_vertices<'a, I>(
    element: &Element,
    body: &mut I,
    snapshot: &mut GeometrySnapshot,
) -> Result<(), PlyError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let column = |wanted: &[&str]| {
        element.properties.iter().position(|p| match p {
            Property::Scalar { name, .. } => wanted.contains(&name.as_str()),
            Property::List { .. } => false,
        })
    };
    let (Some(ix), Some(iy), Some(iz)) = (column(&["x"]), column(&["y"]), column(&["z"])) else {
        return Err(PlyError::Header("vertex element lacks x/y/z".into()));
    };
    let normal_cols = match (column(&["nx"]), column(&["ny"]), column(&["nz"])) {
        (Some(a), Some(b), Some(c)) => Some([a, b, c]),
        _ => None,
    };
    let color_cols = match (
        column(&["red", "r"]),
        column(&["green", "g"]),
        column(&["blue", "b"]),
    ) {
        (Some(a), Some(b), Some(c)) => Some([a, b, c]),
        _ => None,
    };
    let color_is_float = color_cols.is_some_and(|cols| {
        matches!(&element.properties[cols[0]], Property::Scalar { kind, .. } if is_float_kind(kind))
    });

    let mut positions = Vec::with_capacity(element.count);
    let mut normals = normal_cols.map(|_| Vec::with_capacity(element.count));
    let mut colors = color_cols.map(|_| Vec::with_capacity(element.count));

    for _ in 0..element.count {
        let (line, text) = body
            .next()
            .ok_or_else(|| body_error(0, "unexpected end of file in vertex element"))?;
        let values = text
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| body_error(line, format!("bad vertex value: {e}")))?;
        if values.len() < element.properties.len() {
            return Err(body_error(
                line,
                format!(
                    "expected {} vertex values, found {}",
                    element.properties.len(),
                    values.len()
                ),
            ));
        }
        positions.push(Pt3::new(values[ix], values[iy], values[iz]));
        if let (Some(out), Some(cols)) = (normals.as_mut(), normal_cols) {
            out.push(Vec3::new(values[cols[0]], values[cols[1]], values[cols[2]]));
        }
        if let (Some(out), Some(cols)) = (colors.as_mut(), color_cols) {
            let channel = |v: f64| {
                let v = if color_is_float { v * 255.0 } else { v };
                v.round().clamp(0.0, 255.0) as u8
            };
            out.push([
                channel(values[cols[0]]),
                channel(values[cols[1]]),
                channel(values[cols[2]]),
            ]);
        }
    }

    snapshot.positions = positions;
    snapshot.normals = normals;
    snapshot.colors = colors;
    Ok(())
}

fn read_faces<'a, I>(
    element: &Element,
    body: &mut I,
    snapshot: &mut GeometrySnapshot,
) -> Result<(), PlyError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let props = &element.properties;
    let is_list = |p: &Property| matches!(p, Property::List { .. });
    let Some(list_at) = props
        .iter()
        .position(|p| {
            matches!(p, Property::List { name } if FACE_INDEX_LISTS.contains(&name.as_str()))
        })
        .or_else(|| props.iter().position(is_list))
    else {
        return Err(PlyError::Header("face element lacks an index list".into()));
    };
    if props[..list_at].iter().any(is_list) {
        return Err(PlyError::Header(
            "face index list must follow scalar properties only".into(),
        ));
    }
    snapshot.faces.reserve(element.count);
    for _ in 0..element.count {
        let (line, text) = body
            .next()
            .ok_or_else(|| body_error(0, "unexpected end of file in face element"))?;
        let tokens: Vec<&str> = text.split_whitespace().skip(list_at).collect();
        let (count, rest) = tokens
            .split_first()
            .ok_or_else(|| body_error(line, "empty face line"))?;
        let count: usize = count
            .parse()
            .map_err(|_| body_error(line, format!("bad face size '{count}'")))?;
        if rest.len() < count {
            return Err(body_error(line, "face index list is truncated"));
        }
        let face = rest[..count]
            .iter()
            .map(|t| t.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| body_error(line, format!("bad face index: {e}")))?;
        snapshot.faces.push(face);
    }
    Ok(())
}

/// Read an ASCII PLY file.
pub fn read_ply(path: &Path) -> Result<GeometrySnapshot, PlyError> {
    let text = fs::read_to_string(path).map_err(|source| PlyError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_ply(&text)
}

/// Format a snapshot as ASCII PLY text.
pub fn format_ply(snapshot: &GeometrySnapshot) -> Result<String, PlyError> {
    snapshot.validate()?;
    let fmt_err = |e: std::fmt::Error| PlyError::Write(e.to_string());

    let mut out = String::new();
    writeln!(out, "ply").map_err(fmt_err)?;
    writeln!(out, "format ascii 1.0").map_err(fmt_err)?;
    writeln!(out, "element vertex {}", snapshot.positions.len()).map_err(fmt_err)?;
    for axis in ["x", "y", "z"] {
        writeln!(out, "property double {axis}").map_err(fmt_err)?;
    }
    if snapshot.normals.is_some() {
        for axis in ["nx", "ny", "nz"] {
            writeln!(out, "property double {axis}").map_err(fmt_err)?;
        }
    }
    if snapshot.colors.is_some() {
        for channel in ["red", "green", "blue"] {
            writeln!(out, "property uchar {channel}").map_err(fmt_err)?;
        }
    }
    if !snapshot.faces.is_empty() {
        writeln!(out, "element face {}", snapshot.faces.len()).map_err(fmt_err)?;
        writeln!(out, "property list uchar uint vertex_indices").map_err(fmt_err)?;
    }
    writeln!(out, "end_header").map_err(fmt_err)?;

    for (i, p) in snapshot.positions.iter().enumerate() {
        write!(out, "{} {} {}", p.x, p.y, p.z).map_err(fmt_err)?;
        if let Some(normals) = &snapshot.normals {
            let n = normals[i];
            write!(out, " {} {} {}", n.x, n.y, n.z).map_err(fmt_err)?;
        }
        if let Some(colors) = &snapshot.colors {
            let c = colors[i];
            write!(out, " {} {} {}", c[0], c[1], c[2]).map_err(fmt_err)?;
        }
        out.push('\n');
    }
    for face in &snapshot.faces {
        if face.len() > u8::MAX as usize {
            return Err(PlyError::Write(format!(
                "face with {} vertices exceeds the uchar list size",
                face.len()
            )));
        }
        write!(out, "{}", face.len()).map_err(fmt_err)?;
        for idx in face {
            write!(out, " {idx}").map_err(fmt_err)?;
        }
        out.push('\n');
    }
    Ok(out)
}

/// Write a snapshot as an ASCII PLY file (atomically).
pub fn write_ply(path: &Path, snapshot: &GeometrySnapshot) -> Result<(), PlyError> {
    let text = format_ply(snapshot)?;
    write_atomic(path, text.as_bytes()).map_err(|e| PlyError::Write(format!("{e:#}")))
}

/// Rewrite a PLY file in place with points and normals converted to the
/// OpenCV world convention.
pub fn convert_ply_to_opencv(path: &Path) -> Result<GeometrySnapshot, PlyError> {
    let snapshot = read_ply(path)?;
    let converted = snapshot.to_target_convention();
    write_ply(path, &converted)?;
    log::info!(
        "converted {} vertices in {} to the OpenCV convention",
        converted.num_vertices(),
        path.display()
    );
    Ok(converted)
}
