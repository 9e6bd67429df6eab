use crate::change_events::float_serde;
use chronocloud_core::{
    math::AABB,
    nalgebra::{Vector2, Vector3},
};
use float_ord::FloatOrd;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// Relative tolerance for visibility and degeneracy tests, scaled by the largest extent of the input
const RELATIVE_TOLERANCE: f64 = 1e-10;

#[derive(Clone, Copy, Debug)]
struct Triangle {
    a: usize,
    b: usize,
    c: usize,
    /// Outward facing unit normal
    normal: Vector3<f64>,
}

#[derive(Eq, Clone, Copy, Debug)]
struct Edge {
    a: usize,
    b: usize,
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.a == other.a && self.b == other.b || self.a == other.b && self.b == other.a
    }
}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.a.min(self.b), self.a.max(self.b)).hash(state);
    }
}

/// The convex hull of a point set, classified by the dimension of the points' affine hull
#[derive(Clone, Debug)]
enum HullShape {
    /// All points coincide or lie on a line. Holds the extreme points (none for empty input)
    Linear(Vec<usize>),
    /// All points lie in a plane. Holds the hull polygon in counter-clockwise order
    Planar(Vec<usize>),
    /// Closed triangle mesh with outward facing normals
    Solid(Vec<Triangle>),
}

/// Geometric summary of the convex hull of a change cluster
///
/// Undefined values are NaN, so two records holding one never compare equal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvexHullMetrics {
    #[serde(with = "float_serde")]
    pub surface_area: f64,
    #[serde(with = "float_serde")]
    pub volume: f64,
    /// `surface_area / volume`, `+inf` for hulls without volume
    #[serde(with = "float_serde")]
    pub surface_area_to_volume_ratio: f64,
    /// Positions of the hull vertices
    pub points_building: Vec<[f64; 3]>,
}

impl Default for ConvexHullMetrics {
    fn default() -> Self {
        Self {
            surface_area: f64::NAN,
            volume: f64::NAN,
            surface_area_to_volume_ratio: f64::NAN,
            points_building: vec![],
        }
    }
}

/// Convex hull of a set of 3D points. Construction never fails: coplanar input yields a flat polygon and
/// collinear or coincident input a line segment or single point
///
/// ```
/// # use chronocloud_algorithms::convexhull::ConvexHull;
/// # use chronocloud_core::nalgebra::Vector3;
/// let points = vec![
///     Vector3::new(0.0, 0.0, 0.0),
///     Vector3::new(1.0, 0.0, 0.0),
///     Vector3::new(0.0, 1.0, 0.0),
///     Vector3::new(0.0, 0.0, 1.0),
/// ];
/// let hull = ConvexHull::from_points(&points);
/// assert_eq!(hull.vertices(), vec![0, 1, 2, 3]);
/// assert!((hull.volume() - 1.0 / 6.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct ConvexHull {
    points: Vec<Vector3<f64>>,
    shape: HullShape,
}

impl ConvexHull {
    pub fn from_points(points: &[Vector3<f64>]) -> Self {
        Self {
            points: points.to_vec(),
            shape: create_convex_hull(points),
        }
    }

    /// The input points. Indices returned by [ConvexHull::vertices] and [ConvexHull::triangles] refer to these
    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    /// Indices of the points that lie on the hull, in ascending order
    pub fn vertices(&self) -> Vec<usize> {
        let mut vertices = match &self.shape {
            HullShape::Linear(extremes) => extremes.clone(),
            HullShape::Planar(polygon) => polygon.clone(),
            HullShape::Solid(triangles) => triangles
                .iter()
                .flat_map(|tri| vec![tri.a, tri.b, tri.c])
                .collect::<HashSet<_>>()
                .into_iter()
                .collect(),
        };
        vertices.sort_unstable();
        vertices.dedup();
        vertices
    }

    /// The hull as triangle mesh with counter-clockwise winding seen from outside. Empty if the points do
    /// not span a volume
    pub fn triangles(&self) -> Vec<Vector3<usize>> {
        match &self.shape {
            HullShape::Solid(triangles) => triangles
                .iter()
                .map(|tri| Vector3::new(tri.a, tri.b, tri.c))
                .collect(),
            _ => vec![],
        }
    }

    /// Surface area of the hull. A flat hull counts both sides of its polygon
    pub fn surface_area(&self) -> f64 {
        match &self.shape {
            HullShape::Linear(_) => 0.0,
            HullShape::Planar(polygon) => 2.0 * polygon_area(&self.points, polygon),
            HullShape::Solid(triangles) => triangles
                .iter()
                .map(|tri| {
                    calc_normal(self.points[tri.a], self.points[tri.b], self.points[tri.c])
                        .magnitude()
                        / 2.0
                })
                .sum(),
        }
    }

    pub fn volume(&self) -> f64 {
        match &self.shape {
            HullShape::Solid(triangles) => {
                let center = self.points.iter().sum::<Vector3<f64>>() / self.points.len() as f64;
                triangles
                    .iter()
                    .map(|tri| {
                        let a = self.points[tri.a] - center;
                        let b = self.points[tri.b] - center;
                        let c = self.points[tri.c] - center;
                        a.dot(&b.cross(&c)) / 6.0
                    })
                    .sum::<f64>()
                    .abs()
            }
            _ => 0.0,
        }
    }

    pub fn metrics(&self) -> ConvexHullMetrics {
        let surface_area = self.surface_area();
        let volume = self.volume();
        let surface_area_to_volume_ratio = if volume == 0.0 {
            f64::INFINITY
        } else {
            surface_area / volume
        };
        ConvexHullMetrics {
            surface_area,
            volume,
            surface_area_to_volume_ratio,
            points_building: self
                .vertices()
                .into_iter()
                .map(|idx| {
                    let p = self.points[idx];
                    [p.x, p.y, p.z]
                })
                .collect(),
        }
    }
}

/// Convenience for `ConvexHull::from_points(points).metrics()`
pub fn convex_hull_metrics(points: &[Vector3<f64>]) -> ConvexHullMetrics {
    ConvexHull::from_points(points).metrics()
}

fn create_convex_hull(points: &[Vector3<f64>]) -> HullShape {
    let bounds = match AABB::from_points(points) {
        Some(bounds) => bounds,
        None => return HullShape::Linear(vec![]),
    };
    let tolerance = bounds.extent().amax() * RELATIVE_TOLERANCE;

    // Two extreme points: the point farthest from an arbitrary point is a hull vertex
    let far = farthest(points, |p| (p - points[0]).magnitude(), &points[0], tolerance);
    let i0 = farthest(points, |p| (p - points[far]).magnitude(), &points[far], tolerance);
    let i1 = far;
    let axis = points[i1] - points[i0];
    if axis.magnitude() <= tolerance {
        return HullShape::Linear(vec![i0]);
    }
    let axis = axis.normalize();

    let midpoint = (points[i0] + points[i1]) / 2.0;
    let i2 = farthest(
        points,
        |p| (p - points[i0]).cross(&axis).magnitude(),
        &midpoint,
        tolerance,
    );
    if (points[i2] - points[i0]).cross(&axis).magnitude() <= tolerance {
        return HullShape::Linear(vec![i0, i1]);
    }
    let plane_normal = calc_normal(points[i0], points[i1], points[i2]).normalize();

    let plane_center = (points[i0] + points[i1] + points[i2]) / 3.0;
    let i3 = farthest(
        points,
        |p| (p - points[i0]).dot(&plane_normal).abs(),
        &plane_center,
        tolerance,
    );
    if (points[i3] - points[i0]).dot(&plane_normal).abs() <= tolerance {
        return HullShape::Planar(planar_hull(points, points[i0], axis, plane_normal));
    }

    let corners = [i0, i1, i2, i3];
    let center = corners.iter().map(|idx| points[*idx]).sum::<Vector3<f64>>() / 4.0;
    let mut triangles = initial_tetrahedron(points, &corners, &center);
    let mut outside_sets: Vec<Vec<(usize, f64)>> = vec![vec![]; triangles.len()];
    for pointid in 0..points.len() {
        if corners.contains(&pointid) {
            continue;
        }
        if let Some((face, distance)) =
            farthest_face(points, pointid, &triangles, 0, tolerance)
        {
            outside_sets[face].push((pointid, distance));
        }
    }

    while let Some(eye) = next_eye_point(points, &outside_sets, &center, tolerance) {
        iteration(points, eye, tolerance, &mut triangles, &mut outside_sets);
    }
    HullShape::Solid(triangles)
}

/// Index of the point with the largest `distance`. Among points within `tolerance` of the largest distance the
/// one farthest from `anchor` is taken, which makes the result an extreme point of the input even if many
/// points share the largest distance
fn farthest<F: Fn(&Vector3<f64>) -> f64>(
    points: &[Vector3<f64>],
    distance: F,
    anchor: &Vector3<f64>,
    tolerance: f64,
) -> usize {
    let mut best = 0;
    let mut best_distance = f64::NEG_INFINITY;
    let mut best_spread = f64::NEG_INFINITY;
    for (idx, point) in points.iter().enumerate() {
        let d = distance(point);
        let spread = (point - anchor).magnitude_squared();
        if d > best_distance + tolerance
            || ((d - best_distance).abs() <= tolerance && spread > best_spread)
        {
            best = idx;
            best_distance = d;
            best_spread = spread;
        }
    }
    best
}

/// The outside point farthest from the face it is assigned to, ties broken as in [farthest]. Adding points in
/// this order only ever adds extreme points, so points on the hull surface that are not corners never become
/// hull vertices
fn next_eye_point(
    points: &[Vector3<f64>],
    outside_sets: &[Vec<(usize, f64)>],
    center: &Vector3<f64>,
    tolerance: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64, f64)> = None;
    for &(pointid, d) in outside_sets.iter().flatten() {
        let spread = (points[pointid] - center).magnitude_squared();
        let is_better = match best {
            None => true,
            Some((_, best_distance, best_spread)) => {
                d > best_distance + tolerance
                    || ((d - best_distance).abs() <= tolerance && spread > best_spread)
            }
        };
        if is_better {
            best = Some((pointid, d, spread));
        }
    }
    best.map(|(pointid, _, _)| pointid)
}

/// The face among `triangles[first_face..]` that the point lies farthest outside of, if any
fn farthest_face(
    points: &[Vector3<f64>],
    pointid: usize,
    triangles: &[Triangle],
    first_face: usize,
    tolerance: f64,
) -> Option<(usize, f64)> {
    triangles
        .iter()
        .enumerate()
        .skip(first_face)
        .map(|(face, tri)| (face, tri.normal.dot(&(points[pointid] - points[tri.a]))))
        .filter(|(_, distance)| *distance > tolerance)
        .max_by_key(|(_, distance)| FloatOrd(*distance))
}

fn initial_tetrahedron(
    points: &[Vector3<f64>],
    corners: &[usize; 4],
    center: &Vector3<f64>,
) -> Vec<Triangle> {
    let faces = [
        (corners[0], corners[1], corners[2]),
        (corners[0], corners[1], corners[3]),
        (corners[0], corners[2], corners[3]),
        (corners[1], corners[2], corners[3]),
    ];
    faces
        .iter()
        .map(|&(a, b, c)| {
            let normal = calc_normal(points[a], points[b], points[c]).normalize();
            if normal.dot(&(points[a] - center)) < 0.0 {
                Triangle {
                    a,
                    b: c,
                    c: b,
                    normal: -normal,
                }
            } else {
                Triangle { a, b, c, normal }
            }
        })
        .collect()
}

/// Performs a single iteration of the convex hull algorithm.
/// `eye`: index of the point that extends the hull, it lies outside of at least one triangle
/// `triangles`: the set of triangles forming the convex hull
/// `outside_sets`: per triangle, the points lying farthest outside of that triangle with their distance
/// All triangles visible from the eye point are removed and the hole is closed by connecting its border to the
/// eye point. Points that were outside of removed triangles are either inside the new hull or get assigned to
/// another triangle
fn iteration(
    points: &[Vector3<f64>],
    eye: usize,
    tolerance: f64,
    triangles: &mut Vec<Triangle>,
    outside_sets: &mut Vec<Vec<(usize, f64)>>,
) {
    let eye_point = points[eye];
    let mut horizon_edges = HashSet::new();
    let mut orphans = vec![];

    let mut kept_triangles = Vec::with_capacity(triangles.len());
    let mut kept_outside_sets = Vec::with_capacity(triangles.len());
    for (tri, outside) in triangles.drain(..).zip(outside_sets.drain(..)) {
        if tri.normal.dot(&(eye_point - points[tri.a])) > tolerance {
            for (a, b) in [(tri.a, tri.b), (tri.b, tri.c), (tri.c, tri.a)].iter() {
                toggle_horizon_edge(&mut horizon_edges, *a, *b);
            }
            orphans.extend(
                outside
                    .into_iter()
                    .map(|(pointid, _)| pointid)
                    .filter(|pointid| *pointid != eye),
            );
        } else {
            kept_triangles.push(tri);
            kept_outside_sets.push(outside);
        }
    }
    *triangles = kept_triangles;
    *outside_sets = kept_outside_sets;

    // Horizon edges keep the winding of the removed triangle they belonged to
    let first_new_face = triangles.len();
    let mut horizon = horizon_edges.into_iter().collect::<Vec<_>>();
    horizon.sort_unstable_by_key(|edge| (edge.a, edge.b));
    for edge in horizon {
        let normal = calc_normal(points[edge.a], points[edge.b], eye_point)
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::zeros);
        triangles.push(Triangle {
            a: edge.a,
            b: edge.b,
            c: eye,
            normal,
        });
        outside_sets.push(vec![]);
    }

    // Points stay with the triangle they are farthest outside of
    for face in 0..first_new_face {
        let outside = std::mem::take(&mut outside_sets[face]);
        for (pointid, distance) in outside {
            match farthest_face(points, pointid, triangles, first_new_face, tolerance) {
                Some((new_face, new_distance)) if new_distance > distance => {
                    outside_sets[new_face].push((pointid, new_distance))
                }
                _ => outside_sets[face].push((pointid, distance)),
            }
        }
    }
    for pointid in orphans {
        if let Some((face, distance)) = farthest_face(points, pointid, triangles, 0, tolerance) {
            outside_sets[face].push((pointid, distance));
        }
    }
}

/// Hull polygon of coplanar points (Andrew's monotone chain in a basis of the plane)
fn planar_hull(
    points: &[Vector3<f64>],
    origin: Vector3<f64>,
    axis: Vector3<f64>,
    normal: Vector3<f64>,
) -> Vec<usize> {
    let second_axis = normal.cross(&axis);
    let projected = points
        .iter()
        .map(|p| {
            let d = p - origin;
            Vector2::new(d.dot(&axis), d.dot(&second_axis))
        })
        .collect::<Vec<_>>();

    let mut order = (0..points.len()).collect::<Vec<_>>();
    order.sort_by_key(|idx| (FloatOrd(projected[*idx].x), FloatOrd(projected[*idx].y)));

    let turn = |o: usize, a: usize, b: usize| {
        let oa = projected[a] - projected[o];
        let ob = projected[b] - projected[o];
        oa.x * ob.y - oa.y * ob.x
    };

    let mut lower: Vec<usize> = vec![];
    for &idx in &order {
        while lower.len() >= 2 && turn(lower[lower.len() - 2], lower[lower.len() - 1], idx) <= 0.0 {
            lower.pop();
        }
        lower.push(idx);
    }
    let mut upper: Vec<usize> = vec![];
    for &idx in order.iter().rev() {
        while upper.len() >= 2 && turn(upper[upper.len() - 2], upper[upper.len() - 1], idx) <= 0.0 {
            upper.pop();
        }
        upper.push(idx);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Area of a planar polygon given by its vertex indices in order
fn polygon_area(points: &[Vector3<f64>], polygon: &[usize]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let origin = points[polygon[0]];
    polygon
        .windows(2)
        .skip(1)
        .map(|pair| calc_normal(origin, points[pair[0]], points[pair[1]]))
        .sum::<Vector3<f64>>()
        .magnitude()
        / 2.0
}

/// An edge shared by two visible triangles lies inside the visible region, so seeing it a second time
/// removes it from the horizon
fn toggle_horizon_edge(horizon: &mut HashSet<Edge>, a: usize, b: usize) {
    let edge = Edge { a, b };
    if !horizon.insert(edge) {
        horizon.remove(&edge);
    }
}

/// Unnormalized normal of the triangle `a, b, c`, its length is twice the triangle area
fn calc_normal(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Vector3<f64> {
    (b - a).cross(&(c - a))
}
