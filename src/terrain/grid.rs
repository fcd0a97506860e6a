//! Geodetic sample grids.
//!
//! An [`ElevationGrid`] is a P×P array of (lat, lon, elevation) samples
//! spanning a bounding box, produced once per terrain-load request and
//! consumed to build exactly one mesh. Elevations start at zero and are
//! filled in by the fetch step; a batch that fails simply leaves its zeros
//! behind.

use anyhow::{Result, ensure};

/// A geodetic coordinate. Latitude/longitude in degrees, elevation in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub elevation: f64,
}

/// A lat/lon bounding box: lower-left and upper-right corners in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBoundingBox {
    pub ll_lat: f64,
    pub ll_lon: f64,
    pub ur_lat: f64,
    pub ur_lon: f64,
}

impl GeoBoundingBox {
    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lat: (self.ll_lat + self.ur_lat) / 2.0,
            lon: (self.ll_lon + self.ur_lon) / 2.0,
            elevation: 0.0,
        }
    }
}

/// One grid sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridCell {
    pub lat: f64,
    pub lon: f64,
    pub elevation: f64,
}

/// A P×P grid of evenly spaced samples across a bounding box, stored row by
/// row with latitude varying per row and longitude per column.
#[derive(Debug, Clone)]
pub struct ElevationGrid {
    pub bbox: GeoBoundingBox,
    pub points_per_axis: usize,
    pub cells: Vec<GridCell>,
}

impl ElevationGrid {
    /// Lay out `points_per_axis`² samples by interpolating each axis
    /// independently across the box. Corners land exactly on the box corners.
    pub fn generate(bbox: GeoBoundingBox, points_per_axis: usize) -> Result<Self> {
        ensure!(
            points_per_axis >= 2,
            "a terrain grid needs at least 2 points per axis, got {}",
            points_per_axis
        );
        let steps = (points_per_axis - 1) as f64;
        let mut cells = Vec::with_capacity(points_per_axis * points_per_axis);
        for row in 0..points_per_axis {
            let lat = bbox.ll_lat + (bbox.ur_lat - bbox.ll_lat) * row as f64 / steps;
            for col in 0..points_per_axis {
                let lon = bbox.ll_lon + (bbox.ur_lon - bbox.ll_lon) * col as f64 / steps;
                cells.push(GridCell {
                    lat,
                    lon,
                    elevation: 0.0,
                });
            }
        }
        Ok(Self {
            bbox,
            points_per_axis,
            cells,
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> &GridCell {
        &self.cells[row * self.points_per_axis + col]
    }

    pub fn sample_count(&self) -> usize {
        self.cells.len()
    }

    /// Elevation range over the whole grid, `(min, max)`.
    pub fn elevation_range(&self) -> (f64, f64) {
        self.cells.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(min, max), cell| (min.min(cell.elevation), max.max(cell.elevation)),
        )
    }
}
