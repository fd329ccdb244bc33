/// STL importer for binary and ASCII formats
use byteorder::{ByteOrder, LittleEndian};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::many0,
    number::complete::{float, le_f32, le_u32},
    sequence::preceded,
    IResult,
};
use tracing::debug;

use crate::error::ImportError;
use crate::geometry::{Mesh, PolygonCorner};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

type Facet = [(f32, f32, f32); 3];

/// Every facet becomes a flat triangle with its own three vertices.
/// Stored facet normals are ignored; face normals come from the geometry.
fn mesh_from_facets(facets: &[Facet]) -> Mesh {
    let mut mesh = Mesh::new();
    for facet in facets {
        let corners = facet.map(|(x, y, z)| PolygonCorner::new(mesh.add_vertex(x, y, z)));
        mesh.add_polygon(&corners, false);
    }
    mesh
}

fn binary_vertex(input: &[u8]) -> IResult<&[u8], (f32, f32, f32)> {
    let (input, x) = le_f32(input)?;
    let (input, y) = le_f32(input)?;
    let (input, z) = le_f32(input)?;
    Ok((input, (x, y, z)))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Facet> {
    // Normal, three vertices, attribute byte count
    let (input, _normal) = binary_vertex(input)?;
    let (input, a) = binary_vertex(input)?;
    let (input, b) = binary_vertex(input)?;
    let (input, c) = binary_vertex(input)?;
    let (input, _attributes) = take(2usize)(input)?;
    Ok((input, [a, b, c]))
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, ImportError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(ImportError::StlTooSmall);
    }

    let (mut input, triangle_count) = le_u32::<_, nom::error::Error<&[u8]>>(&data[HEADER_LEN..])
        .map_err(|_| ImportError::StlTooSmall)?;
    let expected = triangle_count as usize;

    let mut facets = Vec::with_capacity(expected.min(input.len() / FACET_LEN));
    for parsed in 0..expected {
        let (rest, facet) = binary_facet(input)
            .map_err(|_| ImportError::StlTruncated { parsed, expected })?;
        facets.push(facet);
        input = rest;
    }

    debug!("parsed binary STL with {} facets", facets.len());
    Ok(mesh_from_facets(&facets))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, ImportError> {
    match ascii_solid(input) {
        Ok((_, facets)) => {
            debug!("parsed ASCII STL with {} facets", facets.len());
            Ok(mesh_from_facets(&facets))
        }
        Err(e) => Err(ImportError::StlAscii(format!("{:?}", e))),
    }
}

fn ascii_solid(input: &str) -> IResult<&str, Vec<Facet>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, facets) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    Ok((input, facets))
}

fn ascii_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _normal) = ascii_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, a) = ascii_vertex(input)?;
    let (input, b) = ascii_vertex(input)?;
    let (input, c) = ascii_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;
    Ok((input, [a, b, c]))
}

fn ascii_vertex(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    ascii_vector3(input)
}

fn ascii_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

/// True when `data` is exactly as long as the binary facet count claims
fn binary_size_matches(data: &[u8]) -> bool {
    if data.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = LittleEndian::read_u32(&data[HEADER_LEN..]) as usize;
    let expected = count
        .checked_mul(FACET_LEN)
        .and_then(|len| len.checked_add(HEADER_LEN + 4));
    expected == Some(data.len())
}

/// Detect and parse STL data (binary or ASCII).
///
/// Binary files may also start with "solid". A failed ASCII parse falls back
/// to binary only when the file length matches the binary facet count;
/// otherwise the ASCII error is returned.
pub fn parse_stl(data: &[u8]) -> Result<Mesh, ImportError> {
    if data.starts_with(b"solid") {
        let ascii = match std::str::from_utf8(data) {
            Ok(text) => parse_ascii_stl(text),
            Err(_) => Err(ImportError::NotUtf8),
        };
        match ascii {
            Ok(mesh) => return Ok(mesh),
            Err(err) if !binary_size_matches(data) => return Err(err),
            Err(_) => debug!("\"solid\" header on a binary STL"),
        }
    }

    parse_binary_stl(data)
}
