//! Height-field mesh construction.
//!
//! Turns a fetched [`ElevationGrid`] into renderer-local geometry: positions
//! in meters relative to a chosen origin (equirectangular approximation),
//! UVs normalized across the bounding box, two triangles per grid cell with
//! consistent counter-clockwise-from-above winding, and smooth per-vertex
//! normals built in two passes (accumulate face normals, then normalize).
//! Also derives the hypsometric tint texture that ships with the mesh.

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::mesh::{MeshData, MeshVertex};
use crate::data_structures::texture::TexturePixels;
use crate::terrain::grid::{ElevationGrid, GeoPoint};

/// Meters per degree of latitude; longitude shrinks with cos(latitude).
const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Convert a geodetic sample to renderer-local meters relative to `origin`.
/// +x east, +y up, -z north.
pub fn to_local(lat: f64, lon: f64, elevation: f64, origin: &GeoPoint) -> [f32; 3] {
    let meters_per_deg_lon = METERS_PER_DEG_LAT * origin.lat.to_radians().cos();
    [
        ((lon - origin.lon) * meters_per_deg_lon) as f32,
        (elevation - origin.elevation) as f32,
        (-(lat - origin.lat) * METERS_PER_DEG_LAT) as f32,
    ]
}

/// Triangulate the grid into a mesh with smooth normals.
pub fn build_mesh(grid: &ElevationGrid, origin: &GeoPoint) -> MeshData {
    let p = grid.points_per_axis;
    let lat_span = grid.bbox.ur_lat - grid.bbox.ll_lat;
    let lon_span = grid.bbox.ur_lon - grid.bbox.ll_lon;

    let mut vertices: Vec<MeshVertex> = grid
        .cells
        .iter()
        .map(|cell| {
            let u = if lon_span == 0.0 {
                0.0
            } else {
                (cell.lon - grid.bbox.ll_lon) / lon_span
            };
            let v = if lat_span == 0.0 {
                0.0
            } else {
                1.0 - (cell.lat - grid.bbox.ll_lat) / lat_span
            };
            MeshVertex {
                position: to_local(cell.lat, cell.lon, cell.elevation, origin),
                normal: [0.0; 3],
                tex_coords: [u as f32, v as f32],
            }
        })
        .collect();

    // Two triangles per cell, wound counter-clockwise seen from above.
    let mut indices = Vec::with_capacity(6 * (p - 1) * (p - 1));
    for row in 0..p - 1 {
        for col in 0..p - 1 {
            let i00 = (row * p + col) as u32;
            let i01 = i00 + 1;
            let i10 = ((row + 1) * p + col) as u32;
            let i11 = i10 + 1;
            indices.extend_from_slice(&[i00, i01, i10, i10, i01, i11]);
        }
    }

    // First pass: accumulate each triangle's face normal into its vertices.
    let mut accumulated = vec![Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];
    for triangle in indices.chunks(3) {
        let a = Vector3::from(vertices[triangle[0] as usize].position);
        let b = Vector3::from(vertices[triangle[1] as usize].position);
        let c = Vector3::from(vertices[triangle[2] as usize].position);
        let cross = (b - a).cross(c - a);
        if cross.magnitude2() == 0.0 {
            continue;
        }
        let face_normal = cross.normalize();
        for &index in triangle {
            accumulated[index as usize] += face_normal;
        }
    }
    // Second pass: normalize the accumulated normals.
    for (vertex, normal) in vertices.iter_mut().zip(accumulated) {
        vertex.normal = if normal.magnitude2() == 0.0 {
            [0.0, 1.0, 0.0]
        } else {
            normal.normalize().into()
        };
    }

    MeshData { vertices, indices }
}

/// Build the P×P hypsometric tint: green lowlands through brown slopes to
/// pale peaks, flat terrain staying a single green.
pub fn build_tint_texture(grid: &ElevationGrid) -> TexturePixels {
    const LOW: [f32; 3] = [0.24, 0.42, 0.22];
    const MID: [f32; 3] = [0.52, 0.42, 0.28];
    const HIGH: [f32; 3] = [0.88, 0.88, 0.90];

    let p = grid.points_per_axis;
    let (min, max) = grid.elevation_range();
    let span = max - min;

    let mut rgba = vec![0u8; p * p * 4];
    for row in 0..p {
        for col in 0..p {
            let t = if span == 0.0 {
                0.0
            } else {
                ((grid.cell(row, col).elevation - min) / span) as f32
            };
            let color = if t < 0.5 {
                lerp3(LOW, MID, t * 2.0)
            } else {
                lerp3(MID, HIGH, (t - 0.5) * 2.0)
            };
            // Texture row 0 is v=0, which the UV layout maps to the last
            // latitude row.
            let pixel = ((p - 1 - row) * p + col) * 4;
            rgba[pixel] = (color[0] * 255.0) as u8;
            rgba[pixel + 1] = (color[1] * 255.0) as u8;
            rgba[pixel + 2] = (color[2] * 255.0) as u8;
            rgba[pixel + 3] = 255;
        }
    }
    TexturePixels {
        width: p as u32,
        height: p as u32,
        rgba,
    }
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::grid::{ElevationGrid, GeoBoundingBox};

    fn test_grid(points_per_axis: usize) -> ElevationGrid {
        ElevationGrid::generate(
            GeoBoundingBox {
                ll_lat: 0.0,
                ll_lon: 0.0,
                ur_lat: 0.01,
                ur_lon: 0.01,
            },
            points_per_axis,
        )
        .unwrap()
    }

    #[test]
    fn triangulation_yields_two_triangles_per_cell() {
        for p in [2usize, 3, 5, 8] {
            let mesh = build_mesh(&test_grid(p), &GeoPoint::default());
            assert_eq!(mesh.vertices.len(), p * p);
            assert_eq!(mesh.indices.len(), 6 * (p - 1) * (p - 1));
            assert_eq!(mesh.triangle_count(), 2 * (p - 1) * (p - 1));
        }
    }

    #[test]
    fn flat_grid_normals_are_straight_up() {
        let mesh = build_mesh(&test_grid(4), &GeoPoint::default());
        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.normal;
            assert!((x.abs()) < 1e-6 && (z.abs()) < 1e-6, "normal {:?}", vertex.normal);
            assert!((y - 1.0).abs() < 1e-6, "normal {:?}", vertex.normal);
        }
    }

    #[test]
    fn bumped_grid_normals_stay_unit_length() {
        let mut grid = test_grid(5);
        let center = grid.points_per_axis / 2 * grid.points_per_axis + grid.points_per_axis / 2;
        grid.cells[center].elevation = 500.0;
        let mesh = build_mesh(&grid, &GeoPoint::default());
        for vertex in &mesh.vertices {
            let n = Vector3::from(vertex.normal);
            assert!((n.magnitude() - 1.0).abs() < 1e-5);
        }
        // The bumped vertex still points up; its neighbors lean away.
        let tilted = mesh
            .vertices
            .iter()
            .filter(|v| Vector3::from(v.normal).y < 0.999)
            .count();
        assert!(tilted > 0);
    }

    #[test]
    fn uvs_are_normalized_across_the_bounding_box() {
        let p = 3;
        let mesh = build_mesh(&test_grid(p), &GeoPoint::default());
        // Row 0 is the lowest latitude, which maps to v=1.
        assert_eq!(mesh.vertices[0].tex_coords, [0.0, 1.0]);
        assert_eq!(mesh.vertices[p - 1].tex_coords, [1.0, 1.0]);
        assert_eq!(mesh.vertices[p * p - 1].tex_coords, [1.0, 0.0]);
        assert_eq!(mesh.vertices[p * (p - 1)].tex_coords, [0.0, 0.0]);
    }

    #[test]
    fn local_coordinates_are_relative_to_the_origin() {
        let origin = GeoPoint {
            lat: 1.0,
            lon: 2.0,
            elevation: 100.0,
        };
        let at_origin = to_local(1.0, 2.0, 100.0, &origin);
        assert_eq!(at_origin, [0.0, 0.0, 0.0]);

        let north = to_local(1.001, 2.0, 100.0, &origin);
        assert!(north[2] < 0.0, "north must map to -z, got {:?}", north);
        let east = to_local(1.0, 2.001, 100.0, &origin);
        assert!(east[0] > 0.0, "east must map to +x, got {:?}", east);
        let up = to_local(1.0, 2.0, 150.0, &origin);
        assert!((up[1] - 50.0).abs() < 1e-3);
    }

    #[test]
    fn flat_tint_is_a_single_lowland_color() {
        let pixels = build_tint_texture(&test_grid(3));
        assert_eq!(pixels.width, 3);
        assert_eq!(pixels.height, 3);
        let first = &pixels.rgba[0..4];
        for pixel in pixels.rgba.chunks(4) {
            assert_eq!(pixel, first);
        }
    }
}
