//! Uniform spatial hash grid
//!
//! Space is cut into axis-aligned cells of equal size anchored at an origin.
//! Only occupied cells are stored. Cells are kept in the order they were
//! first occupied, so iterating them is deterministic.

use itertools::iproduct;
use meshsample_core::{Bounded, BoundingBox, Error, NearestNeighborSearch, Point3d, Result, Vector3d};
use std::collections::HashMap;
use tracing::warn;

/// Default per-axis cell bound, matching the clustering tool's 100k cell grid
pub const DEFAULT_MAX_CELLS_PER_AXIS: usize = 100_000;

/// Integer cell coordinate
pub type CellCoord = [i64; 3];

/// Origin, cell size and cell counts of a grid, validated but not yet allocated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub origin: Point3d,
    pub cell_size: Vector3d,
    pub dims: [usize; 3],
}

impl GridLayout {
    /// Compute the layout covering `bbox`.
    ///
    /// With an explicit `cell_size`, per-axis counts follow from the box
    /// extents. Without one, `max_cells_per_axis` is read as a total cell
    /// budget spread over the box volume (non-degenerate axes only), then
    /// clamped so no axis exceeds the bound.
    pub fn new(bbox: &BoundingBox, max_cells_per_axis: usize, cell_size: Option<f64>) -> Result<Self> {
        if max_cells_per_axis == 0 {
            return Err(Error::InvalidParameter(
                "max_cells_per_axis must be at least 1".to_string(),
            ));
        }

        let origin = if bbox.is_null() { Point3d::origin() } else { bbox.min };
        let extent = bbox.extent();

        let size = match cell_size {
            Some(size) => {
                if !(size.is_finite() && size > 0.0) {
                    return Err(Error::InvalidParameter(format!(
                        "cell size must be positive and finite, got {}",
                        size
                    )));
                }
                size
            }
            None => derive_cell_size(&extent, max_cells_per_axis),
        };

        let mut dims = [1usize; 3];
        for axis in 0..3 {
            let count = (extent[axis] / size).floor() + 1.0;
            if count > max_cells_per_axis as f64 {
                return Err(Error::InvalidParameter(format!(
                    "cell size {} needs {} cells along axis {}, limit is {}",
                    size, count, axis, max_cells_per_axis
                )));
            }
            dims[axis] = count as usize;
        }

        Ok(Self {
            origin,
            cell_size: Vector3d::repeat(size),
            dims,
        })
    }

    /// Cell containing `p`: `floor((p - origin) / cell_size)` per axis
    pub fn cell_of(&self, p: &Point3d) -> CellCoord {
        let local = p - self.origin;
        [
            (local.x / self.cell_size.x).floor() as i64,
            (local.y / self.cell_size.y).floor() as i64,
            (local.z / self.cell_size.z).floor() as i64,
        ]
    }

    /// Region covered by a cell
    pub fn cell_bounds(&self, coord: CellCoord) -> BoundingBox {
        let min = self.origin
            + Vector3d::new(
                coord[0] as f64 * self.cell_size.x,
                coord[1] as f64 * self.cell_size.y,
                coord[2] as f64 * self.cell_size.z,
            );
        BoundingBox::new(min, min + self.cell_size)
    }

    pub fn cell_count(&self) -> usize {
        self.dims.iter().product()
    }
}

fn derive_cell_size(extent: &Vector3d, max_cells_per_axis: usize) -> f64 {
    let max_extent = extent.max();
    let eps = 1e-12 * max_extent.max(1.0);
    let active: Vec<f64> = extent.iter().copied().filter(|&e| e > eps).collect();
    if active.is_empty() {
        // All points coincide; any size gives a single cell.
        return 1.0;
    }

    let dim = active.len() as f64;
    let volume: f64 = active.iter().product();
    let from_volume = (volume / max_cells_per_axis as f64).powf(1.0 / dim);

    let per_axis_floor = if max_cells_per_axis > 1 {
        max_extent / (max_cells_per_axis - 1) as f64
    } else {
        max_extent * 2.0
    };

    if per_axis_floor > from_volume {
        warn!(
            from_volume,
            per_axis_floor, "derived cell size raised to respect the per-axis cell bound"
        );
    }
    from_volume.max(per_axis_floor)
}

/// An occupied cell and its bucket
#[derive(Debug, Clone)]
pub struct GridCell<T> {
    pub coord: CellCoord,
    pub items: Vec<T>,
}

/// Sparse uniform grid mapping cell coordinates to buckets of payloads
#[derive(Debug, Clone)]
pub struct SpatialGrid<T> {
    layout: GridLayout,
    lookup: HashMap<CellCoord, usize>,
    cells: Vec<GridCell<T>>,
    len: usize,
}

impl<T> SpatialGrid<T> {
    /// Build an empty grid over `bbox`; see [`GridLayout::new`] for the rules
    pub fn build(bbox: &BoundingBox, max_cells_per_axis: usize, cell_size: Option<f64>) -> Result<Self> {
        Ok(Self::from_layout(GridLayout::new(bbox, max_cells_per_axis, cell_size)?))
    }

    pub fn from_layout(layout: GridLayout) -> Self {
        Self {
            layout,
            lookup: HashMap::new(),
            cells: Vec::new(),
            len: 0,
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn cell_of(&self, p: &Point3d) -> CellCoord {
        self.layout.cell_of(p)
    }

    /// Append `payload` to the bucket of the cell containing `point`
    pub fn insert(&mut self, point: &Point3d, payload: T) -> CellCoord {
        let coord = self.layout.cell_of(point);
        let next = self.cells.len();
        let slot = *self.lookup.entry(coord).or_insert(next);
        if slot == next {
            self.cells.push(GridCell {
                coord,
                items: Vec::new(),
            });
        }
        self.cells[slot].items.push(payload);
        self.len += 1;
        coord
    }

    pub fn get(&self, coord: CellCoord) -> Option<&GridCell<T>> {
        self.lookup.get(&coord).map(|&slot| &self.cells[slot])
    }

    /// Occupied cells whose region intersects the sphere of `radius` around `point`
    pub fn query_neighbor_cells(&self, point: &Point3d, radius: f64) -> Vec<&GridCell<T>> {
        let radius = radius.max(0.0);
        let r2 = radius * radius;
        let reach = Vector3d::repeat(radius);
        let lo = self.layout.cell_of(&(point - reach));
        let hi = self.layout.cell_of(&(point + reach));

        let span: f64 = (0..3).map(|i| (hi[i] - lo[i] + 1) as f64).product();
        let touches = |coord: CellCoord| self.layout.cell_bounds(coord).distance_squared(point) <= r2;

        if span > self.cells.len() as f64 {
            // Fewer occupied cells than cells in range: scan the occupied ones.
            self.cells
                .iter()
                .filter(|cell| (0..3).all(|i| cell.coord[i] >= lo[i] && cell.coord[i] <= hi[i]))
                .filter(|cell| touches(cell.coord))
                .collect()
        } else {
            iproduct!(lo[0]..=hi[0], lo[1]..=hi[1], lo[2]..=hi[2])
                .filter_map(|(x, y, z)| self.get([x, y, z]))
                .filter(|cell| touches(cell.coord))
                .collect()
        }
    }

    /// Occupied cells in first-occupied order
    pub fn cells(&self) -> &[GridCell<T>] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<GridCell<T>> {
        self.cells
    }

    pub fn occupied_cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of inserted payloads
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A point set indexed by a [`SpatialGrid`] of point indices
#[derive(Debug, Clone)]
pub struct PointGrid {
    points: Vec<Point3d>,
    grid: SpatialGrid<usize>,
}

impl PointGrid {
    /// Index `points` with cubic cells of side `cell_size`
    pub fn new(points: &[Point3d], cell_size: f64) -> Result<Self> {
        let bbox = BoundingBox::from_points(points);
        let layout = GridLayout::new(&bbox, DEFAULT_MAX_CELLS_PER_AXIS, Some(cell_size))?;
        Ok(Self::from_layout(points, layout))
    }

    /// Index `points` with a precomputed layout
    pub fn from_layout(points: &[Point3d], layout: GridLayout) -> Self {
        let mut grid = SpatialGrid::from_layout(layout);
        for (i, p) in points.iter().enumerate() {
            grid.insert(p, i);
        }
        Self {
            points: points.to_vec(),
            grid,
        }
    }

    pub fn points(&self) -> &[Point3d] {
        &self.points
    }

    pub fn grid(&self) -> &SpatialGrid<usize> {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl NearestNeighborSearch for PointGrid {
    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)> {
        if k == 0 || self.points.is_empty() {
            return Vec::new();
        }

        let bbox = self.points.bounding_box();
        // Past this radius every point is inside the search sphere.
        let full = bbox.distance_squared(query).sqrt() + bbox.diagonal();
        let mut radius = self.grid.layout().cell_size.max();

        loop {
            let mut found = self.find_radius_neighbors(query, radius);
            if found.len() >= k || radius >= full {
                found.sort_by(|a, b| {
                    a.1.partial_cmp(&b.1)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.0.cmp(&b.0))
                });
                found.truncate(k);
                return found;
            }
            radius = (radius * 2.0).min(full);
        }
    }

    fn find_radius_neighbors(&self, query: &Point3d, radius: f64) -> Vec<(usize, f64)> {
        let radius_squared = radius * radius;
        self.grid
            .query_neighbor_cells(query, radius)
            .into_iter()
            .flat_map(|cell| cell.items.iter().copied())
            .filter_map(|idx| {
                let distance_squared = (self.points[idx] - query).norm_squared();
                if distance_squared <= radius_squared {
                    Some((idx, distance_squared.sqrt()))
                } else {
                    None
                }
            })
            .collect()
    }
}
