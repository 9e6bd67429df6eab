use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use chronocloud_algorithms::convexhull::ConvexHull;

/// Writes the hull as Wavefront OBJ: one `v` line per hull vertex and one `f` line per triangle. Hulls
/// without volume have no triangles and are written as bare vertices
pub fn write_hull_obj<W: Write>(writer: &mut W, hull: &ConvexHull) -> Result<()> {
    let vertices = hull.vertices();
    // OBJ indices are 1-based
    let obj_index = vertices
        .iter()
        .enumerate()
        .map(|(obj_idx, point_idx)| (*point_idx, obj_idx + 1))
        .collect::<HashMap<_, _>>();

    for point_idx in vertices.iter() {
        let p = hull.points()[*point_idx];
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for triangle in hull.triangles() {
        writeln!(
            writer,
            "f {} {} {}",
            obj_index[&triangle.x], obj_index[&triangle.y], obj_index[&triangle.z]
        )?;
    }
    Ok(())
}

/// Writes the hull to a new OBJ file at `path`
pub fn write_hull_obj_file<P: AsRef<Path>>(path: P, hull: &ConvexHull) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Could not create OBJ file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_hull_obj(&mut writer, hull)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronocloud_core::nalgebra::Vector3;
    use scopeguard::defer;
    use std::path::PathBuf;

    #[test]
    fn test_tetrahedron_obj() -> Result<()> {
        let points = vec![
            Vector3::new(0.25, 0.25, 0.25),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        let hull = ConvexHull::from_points(&points);
        let mut out = Vec::new();
        write_hull_obj(&mut out, &hull)?;
        let text = String::from_utf8(out)?;

        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.iter().filter(|l| l.starts_with("v ")).count(), 4);
        assert_eq!(lines.iter().filter(|l| l.starts_with("f ")).count(), 4);
        assert_eq!(lines[0], "v 0 0 0");
        for face in lines.iter().filter(|l| l.starts_with("f ")) {
            for index in face[2..].split(' ') {
                let index: usize = index.parse()?;
                assert!((1..=4).contains(&index));
            }
        }
        Ok(())
    }

    #[test]
    fn test_flat_hull_has_no_faces() -> Result<()> {
        let points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let mut out = Vec::new();
        write_hull_obj(&mut out, &ConvexHull::from_points(&points))?;
        let text = String::from_utf8(out)?;
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().all(|l| l.starts_with("v ")));
        Ok(())
    }

    #[test]
    fn test_write_hull_obj_file() -> Result<()> {
        let mut test_file_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_file_path.push("test_write_hull_obj_file.obj");

        defer! {
            std::fs::remove_file(&test_file_path).expect("Removing test file failed!");
        }

        let points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(2.0, 2.0, 2.0),
        ];
        write_hull_obj_file(&test_file_path, &ConvexHull::from_points(&points))?;

        let text = std::fs::read_to_string(&test_file_path)?;
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 5);
        assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 6);
        Ok(())
    }
}
