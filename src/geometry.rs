//! Shape-specific closed-form geometry kernels (spec §4.2, §9).
//!
//! Every function here is a pure closed-form computation over raw point
//! data; it knows nothing about topology, corners or wedges. The
//! shape-dispatch that picks which of these to call for a given
//! [`crate::topology::CellShape`] lives in `topology.rs`, matching the
//! "tagged variant with data tables, not code" design note of spec §9.


use glam::DVec3;

/// Euclidean length of the segment `a -> b`.
pub fn segment_length(a: DVec3, b: DVec3) -> f64 {
    a.distance(b)
}

/// Midpoint of the segment `a -> b`.
pub fn segment_midpoint(a: DVec3, b: DVec3) -> DVec3 {
    (a + b) * 0.5
}

/// Signed-area-aware centroid and unsigned area of a planar polygon given in
/// the `xy` plane (used for 2D cells, where a face coincides with an edge).
/// The shoelace formula is used directly; orientation only affects an
/// intermediate sign, never the returned (always non-negative) area.
pub fn polygon2d_area_centroid(ring: &[DVec3]) -> (f64, DVec3) {
    let n = ring.len();
    debug_assert!(n >= 3, "a 2D cell needs at least 3 vertices");

    let mut signed_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p0 = ring[i];
        let p1 = ring[(i + 1) % n];
        let cross = p0.x * p1.y - p1.x * p0.y;
        signed_area += cross;
        cx += (p0.x + p1.x) * cross;
        cy += (p0.y + p1.y) * cross;
    }
    signed_area *= 0.5;

    if signed_area.abs() < f64::EPSILON {
        let mut centroid = DVec3::ZERO;
        for &p in ring {
            centroid += p;
        }
        return (0.0, centroid / n as f64);
    }

    let factor = 1.0 / (6.0 * signed_area);
    let centroid = DVec3::new(cx * factor, cy * factor, 0.0);
    (signed_area.abs(), centroid)
}

/// Area, centroid and unit outward normal of the triangle `(a, b, c)`. The
/// normal follows the right-hand rule of the `a -> b -> c` winding.
pub fn triangle3d_area_centroid_normal(a: DVec3, b: DVec3, c: DVec3) -> (f64, DVec3, DVec3) {
    let cross = (b - a).cross(c - a);
    let len = cross.length();
    let area = 0.5 * len;
    let normal = if len > f64::EPSILON { cross / len } else { DVec3::ZERO };
    let centroid = (a + b + c) / 3.0;
    (area, centroid, normal)
}

/// Area, centroid and unit outward normal of a (possibly non-planar)
/// quadrilateral, defined by splitting along the fixed diagonal `v0 -> v2`
/// into triangles `(v0, v1, v2)` and `(v0, v2, v3)`, per spec §4.2.
pub fn quad3d_area_centroid_normal(v: [DVec3; 4]) -> (f64, DVec3, DVec3) {
    let (a1, c1, n1) = triangle3d_area_centroid_normal(v[0], v[1], v[2]);
    let (a2, c2, n2) = triangle3d_area_centroid_normal(v[0], v[2], v[3]);
    let area = a1 + a2;
    let centroid = if area > f64::EPSILON {
        (c1 * a1 + c2 * a2) / area
    } else {
        (c1 + c2) * 0.5
    };
    let normal_sum = n1 * a1 + n2 * a2;
    let normal = if normal_sum.length_squared() > f64::EPSILON {
        normal_sum.normalize()
    } else {
        n1
    };
    (area, centroid, normal)
}

/// Area, centroid and unit outward normal of a general planar polygon face
/// with more than four vertices, via Newell's method for the normal and a
/// centroid-fan triangulation for area/centroid.
pub fn polygon3d_area_centroid_normal(ring: &[DVec3]) -> (f64, DVec3, DVec3) {
    let n = ring.len();
    debug_assert!(n >= 3, "a face needs at least 3 vertices");

    let mut rough_centroid = DVec3::ZERO;
    for &p in ring {
        rough_centroid += p;
    }
    rough_centroid /= n as f64;

    let mut normal_sum = DVec3::ZERO;
    for i in 0..n {
        let p0 = ring[i];
        let p1 = ring[(i + 1) % n];
        normal_sum += (p0 - rough_centroid).cross(p1 - rough_centroid);
    }
    let normal = if normal_sum.length_squared() > f64::EPSILON {
        normal_sum.normalize()
    } else {
        DVec3::ZERO
    };

    let mut area = 0.0;
    let mut centroid = DVec3::ZERO;
    for i in 0..n {
        let p0 = ring[i];
        let p1 = ring[(i + 1) % n];
        let tri_area = 0.5 * (p0 - rough_centroid).cross(p1 - rough_centroid).length();
        let tri_centroid = (rough_centroid + p0 + p1) / 3.0;
        area += tri_area;
        centroid += tri_centroid * tri_area;
    }
    let centroid = if area > f64::EPSILON { centroid / area } else { rough_centroid };
    (area, centroid, normal)
}

/// Volume and centroid of the tetrahedron `(a, b, c, d)`.
pub fn tetra_volume_centroid(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> (f64, DVec3) {
    let volume = (b - a).dot((c - a).cross(d - a)).abs() / 6.0;
    let centroid = (a + b + c + d) * 0.25;
    (volume, centroid)
}

/// Volume and centroid of a polyhedron given its vertices and faces (each
/// face a CCW, outward-oriented local-index ring), by summing signed
/// tetrahedra fanned from each face to the vertex average. Robust for convex
/// cells and star-shaped cells with respect to that average.
pub fn polyhedron_volume_centroid(vertices: &[DVec3], faces: &[Vec<usize>]) -> (f64, DVec3) {
    let reference: DVec3 = vertices.iter().copied().fold(DVec3::ZERO, |a, b| a + b)
        / vertices.len() as f64;

    let mut volume = 0.0;
    let mut moment = DVec3::ZERO;
    for face in faces {
        let n = face.len();
        if n < 3 {
            continue;
        }
        let p0 = vertices[face[0]];
        for i in 1..(n - 1) {
            let p1 = vertices[face[i]];
            let p2 = vertices[face[i + 1]];
            let signed_vol = (p0 - reference).dot((p1 - reference).cross(p2 - reference)) / 6.0;
            let tetra_centroid = (reference + p0 + p1 + p2) * 0.25;
            volume += signed_vol;
            moment += tetra_centroid * signed_vol;
        }
    }
    let centroid = if volume.abs() > f64::EPSILON { moment / volume } else { reference };
    (volume.abs(), centroid)
}

/// Minimum distance over all unordered pairs of `points`, by brute force, per
/// spec §4.2. Used as the characteristic length for CFL control.
pub fn min_pairwise_distance(points: &[DVec3]) -> f64 {
    let mut min = f64::INFINITY;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let d = points[i].distance(points[j]);
            if d < min {
                min = d;
            }
        }
    }
    min
}
