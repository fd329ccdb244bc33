/// Wavefront OBJ importer
use std::collections::HashMap;

use nalgebra::{Point2, Point3, Vector3};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, not_line_ending, space0, space1},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::{many0, separated_list1},
    number::complete::float,
    sequence::{pair, preceded, terminated},
    IResult,
};
use tracing::{debug, warn};

use crate::error::ImportError;
use crate::geometry::{Mesh, PolygonCorner};
use crate::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq)]
struct FaceCorner {
    position: i64,
    texcoord: Option<i64>,
    normal: Option<i64>,
}

#[derive(Debug, PartialEq)]
enum Statement<'a> {
    Position(Point3<f32>),
    TexCoord(Point2<f32>),
    Normal(Vector3<f32>),
    Face(Vec<FaceCorner>),
    Object(&'a str),
    Smooth(bool),
}

fn vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, x) = float(input)?;
    let (input, _) = space1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = space1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

fn vector2(input: &str) -> IResult<&str, (f32, f32)> {
    let (input, u) = float(input)?;
    let (input, v) = opt(preceded(space1, float))(input)?;
    Ok((input, (u, v.unwrap_or(0.0))))
}

fn index(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| s.parse::<i64>())(input)
}

/// `v`, `v/vt`, `v//vn` or `v/vt/vn`
fn face_corner(input: &str) -> IResult<&str, FaceCorner> {
    let (input, position) = index(input)?;
    let (input, rest) = opt(preceded(
        char('/'),
        pair(opt(index), opt(preceded(char('/'), index))),
    ))(input)?;
    let (texcoord, normal) = rest.unwrap_or((None, None));
    Ok((
        input,
        FaceCorner {
            position,
            texcoord,
            normal,
        },
    ))
}

fn object_name(input: &str) -> IResult<&str, Statement<'_>> {
    let (input, _) = pair(tag("o"), space1)(input)?;
    let (input, name) = not_line_ending(input)?;
    Ok((input, Statement::Object(name.trim())))
}

/// Trailing floats after a `v` or `vt` (vertex colours, `w`) are skipped
fn extra_components(input: &str) -> IResult<&str, ()> {
    map(many0(preceded(space1, float)), |_| ())(input)
}

/// One whole line; anything left unparsed is an error
fn statement(input: &str) -> IResult<&str, Statement<'_>> {
    all_consuming(terminated(
        alt((
            map(
                preceded(pair(tag("vt"), space1), terminated(vector2, extra_components)),
                |(u, v): (f32, f32)| Statement::TexCoord(Point2::new(u, v)),
            ),
            map(
                preceded(pair(tag("vn"), space1), vector3),
                |(x, y, z): (f32, f32, f32)| Statement::Normal(Vector3::new(x, y, z)),
            ),
            map(
                preceded(pair(tag("v"), space1), terminated(vector3, extra_components)),
                |(x, y, z): (f32, f32, f32)| Statement::Position(Point3::new(x, y, z)),
            ),
            map(
                preceded(pair(tag("f"), space1), separated_list1(space1, face_corner)),
                Statement::Face,
            ),
            object_name,
            map(preceded(pair(tag("s"), space1), not_line_ending), |s: &str| {
                Statement::Smooth(!matches!(s.trim(), "off" | "0"))
            }),
        )),
        space0,
    ))(input)
}

/// Object being assembled; positions are remapped from the file's global list
struct ObjectBuilder {
    name: String,
    mesh: Mesh,
    vertex_map: HashMap<usize, u32>,
}

impl ObjectBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mesh: Mesh::new(),
            vertex_map: HashMap::new(),
        }
    }

    fn vertex(&mut self, global: usize, positions: &[Point3<f32>]) -> u32 {
        let mesh = &mut self.mesh;
        *self.vertex_map.entry(global).or_insert_with(|| {
            let p = positions[global];
            mesh.add_vertex(p.x, p.y, p.z)
        })
    }

    fn finish(self, scene: &mut Scene) {
        if self.mesh.polygons.is_empty() {
            debug!("dropping OBJ object {:?} without faces", self.name);
            return;
        }
        scene.add_object(self.name, self.mesh);
    }
}

/// Resolve a 1-based (or negative, relative) OBJ index against `len` entries
fn resolve(
    index: i64,
    len: usize,
    line: usize,
    kind: &'static str,
) -> Result<usize, ImportError> {
    let resolved = if index > 0 {
        index - 1
    } else {
        len as i64 + index
    };
    if index == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(ImportError::ObjIndex { line, kind, index });
    }
    Ok(resolved as usize)
}

/// Parse OBJ text into a scene.
///
/// Faces before the first `o` statement belong to an object called
/// `default_name`. Objects without faces are dropped; the first remaining
/// object is made active.
pub fn parse_obj(input: &str, default_name: &str) -> Result<Scene, ImportError> {
    let mut scene = Scene::new();
    let mut positions = Vec::new();
    let mut texcoords = Vec::new();
    let mut normals = Vec::new();
    let mut smooth = false;
    let mut current = ObjectBuilder::new(default_name);

    for (i, raw) in input.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        let keyword = match line.split_whitespace().next() {
            Some(k) if !k.starts_with('#') => k,
            _ => continue,
        };
        if !matches!(keyword, "v" | "vt" | "vn" | "f" | "o" | "s") {
            warn!("line {line_no}: ignoring {keyword:?} statement");
            continue;
        }

        let (_, parsed) = statement(line).map_err(|_| ImportError::ObjSyntax {
            line: line_no,
            text: line.to_string(),
        })?;

        match parsed {
            Statement::Position(p) => positions.push(p),
            Statement::TexCoord(uv) => texcoords.push(uv),
            Statement::Normal(n) => normals.push(n),
            Statement::Smooth(s) => smooth = s,
            Statement::Object(name) => {
                let finished = std::mem::replace(&mut current, ObjectBuilder::new(name));
                finished.finish(&mut scene);
            }
            Statement::Face(face) => {
                let mut corners = Vec::with_capacity(face.len());
                for c in face {
                    let global = resolve(c.position, positions.len(), line_no, "vertex")?;
                    let mut corner = PolygonCorner::new(current.vertex(global, &positions));
                    if let Some(t) = c.texcoord {
                        let t = resolve(t, texcoords.len(), line_no, "texture")?;
                        corner.uv = Some(texcoords[t]);
                    }
                    if let Some(n) = c.normal {
                        let n = resolve(n, normals.len(), line_no, "normal")?;
                        corner.normal = Some(normals[n]);
                    }
                    corners.push(corner);
                }
                current.mesh.add_polygon(&corners, smooth);
            }
        }
    }
    current.finish(&mut scene);

    debug!(
        "parsed OBJ: {} positions, {} texcoords, {} normals, {} objects",
        positions.len(),
        texcoords.len(),
        normals.len(),
        scene.objects.len()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_face_corner_forms() {
        let plain = FaceCorner {
            position: 3,
            texcoord: None,
            normal: None,
        };
        assert_eq!(face_corner("3").unwrap().1, plain);
        assert_eq!(
            face_corner("3/4").unwrap().1,
            FaceCorner {
                texcoord: Some(4),
                ..plain
            }
        );
        assert_eq!(
            face_corner("3//5").unwrap().1,
            FaceCorner {
                normal: Some(5),
                ..plain
            }
        );
        assert_eq!(
            face_corner("-1/-2/-3").unwrap().1,
            FaceCorner {
                position: -1,
                texcoord: Some(-2),
                normal: Some(-3),
            }
        );
    }

    #[test]
    fn test_statements() {
        assert_eq!(
            statement("v 1 2.5 -3").unwrap().1,
            Statement::Position(Point3::new(1.0, 2.5, -3.0))
        );
        assert_eq!(
            statement("vt 0.25 0.75 0").unwrap().1,
            Statement::TexCoord(Point2::new(0.25, 0.75))
        );
        assert_eq!(
            statement("vn 0 0 1").unwrap().1,
            Statement::Normal(Vector3::new(0.0, 0.0, 1.0))
        );
        assert_eq!(statement("o Suzanne").unwrap().1, Statement::Object("Suzanne"));
        assert_eq!(statement("s off").unwrap().1, Statement::Smooth(false));
        assert_eq!(statement("s 1").unwrap().1, Statement::Smooth(true));
        assert_eq!(
            statement("v 1 2 3 0.5 0.5 0.5").unwrap().1,
            Statement::Position(Point3::new(1.0, 2.0, 3.0))
        );
        assert!(statement("vn 0 0 1 1").is_err());
    }

    const QUAD_AND_TRI: &str = "\
# two objects
mtllib scene.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vn 0 0 1
o Quad
usemtl red
f 1 2 3 4
o Tri
s 1
f 2/1/1 3/2/1 4/3/1
";

    #[test]
    fn test_objects_and_remapping() {
        let scene = parse_obj(QUAD_AND_TRI, "untitled").unwrap();
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.active, Some(0));

        let quad = &scene.objects[0];
        assert_eq!(quad.name, "Quad");
        assert_eq!(quad.mesh.vertices.len(), 4);
        assert_eq!(quad.mesh.polygons[0].loop_total, 4);
        assert!(!quad.mesh.polygons[0].use_smooth);
        assert!(quad.mesh.uv_layer.is_none());

        let tri = &scene.objects[1];
        assert_eq!(tri.name, "Tri");
        assert_eq!(tri.mesh.vertices.len(), 3);
        assert_eq!(tri.mesh.vertices[0], Point3::new(1.0, 0.0, 0.0));
        assert!(tri.mesh.polygons[0].use_smooth);
        assert_eq!(
            tri.mesh.uv_layer.as_deref(),
            Some(&[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)][..])
        );
        assert_eq!(tri.mesh.loops[2].normal, Some(Vector3::z()));
    }

    #[test]
    fn test_faces_before_object_use_default_name() {
        let scene = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n", "cube").unwrap();
        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.objects[0].name, "cube");
    }

    #[test]
    fn test_negative_indices() {
        let scene = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n", "neg").unwrap();
        assert_eq!(scene.objects[0].mesh.loops.len(), 3);
        assert_eq!(scene.objects[0].mesh.loops[2].vertex, 2);
    }

    #[test]
    fn test_empty_input_has_no_active_object() {
        let scene = parse_obj("# nothing here\n\n", "empty").unwrap();
        assert!(scene.objects.is_empty());
        assert!(scene.active.is_none());
    }

    #[test]
    fn test_index_out_of_range() {
        let err = parse_obj("v 0 0 0\nf 1 2 3\n", "bad").unwrap_err();
        assert!(matches!(err, ImportError::ObjIndex { line: 2, index: 2, .. }));
    }

    #[test]
    fn test_zero_index_rejected() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n", "bad").unwrap_err();
        assert!(matches!(err, ImportError::ObjIndex { index: 0, .. }));
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let err = parse_obj("v 0 0 0\nv 1 zero 0\n", "bad").unwrap_err();
        assert!(matches!(err, ImportError::ObjSyntax { line: 2, .. }));
    }

    #[test]
    fn test_trailing_slash_face_rejected() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1/ 2/1/ 3/1/\n";
        let err = parse_obj(text, "bad").unwrap_err();
        assert!(matches!(err, ImportError::ObjSyntax { line: 5, .. }));
    }

    #[test]
    fn test_face_with_trailing_junk_rejected() {
        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3 junk\n", "bad").unwrap_err();
        match err {
            ImportError::ObjSyntax { line, text } => {
                assert_eq!(line, 4);
                assert_eq!(text, "f 1 2 3 junk");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[traced_test]
    #[test]
    fn test_unknown_statements_are_warned() {
        let scene = parse_obj("usemtl red\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n", "m").unwrap();
        assert_eq!(scene.objects.len(), 1);
        assert!(logs_contain("WARN"));
        assert!(logs_contain("line 1: ignoring \"usemtl\" statement"));
    }
}
