//! Uniform grid clustering
//!
//! Buckets points into the cells of a uniform grid laid over their bounding
//! box and replaces each occupied cell with a single representative.
//! Representatives come out in the order their cells were first occupied.

use crate::spatial_grid::{SpatialGrid, DEFAULT_MAX_CELLS_PER_AXIS};
use meshsample_core::{Bounded, Mesh, Point3d, Result, Sample, Vector3d};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a cell's members are reduced to one point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepresentativeStrategy {
    /// Arithmetic mean of the member positions.
    #[default]
    Centroid,
    /// Mean weighted by each sample's weight; plain mean if the weights sum to zero.
    WeightedAverage,
    /// The member closest to the mean, earliest on ties.
    NearestToCentroid,
}

/// Grid clustering configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridClustering {
    pub cell_size: f64,
    pub max_cells_per_axis: usize,
    pub representative: RepresentativeStrategy,
}

impl Default for GridClustering {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            max_cells_per_axis: DEFAULT_MAX_CELLS_PER_AXIS,
            representative: RepresentativeStrategy::Centroid,
        }
    }
}

impl GridClustering {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            ..Self::default()
        }
    }

    pub fn with_max_cells_per_axis(mut self, max_cells_per_axis: usize) -> Self {
        self.max_cells_per_axis = max_cells_per_axis;
        self
    }

    pub fn with_representative(mut self, representative: RepresentativeStrategy) -> Self {
        self.representative = representative;
        self
    }

    /// Member indices of every occupied cell, in first-occupied order
    fn cells(&self, positions: &[Point3d]) -> Result<Vec<Vec<usize>>> {
        let bbox = positions.bounding_box();
        let mut grid = SpatialGrid::build(&bbox, self.max_cells_per_axis, Some(self.cell_size))?;
        for (i, p) in positions.iter().enumerate() {
            grid.insert(p, i);
        }
        debug!(
            points = positions.len(),
            occupied_cells = grid.occupied_cell_count(),
            "clustered"
        );
        Ok(grid.into_cells().into_iter().map(|cell| cell.items).collect())
    }

    /// One representative per occupied cell
    #[tracing::instrument(skip_all, fields(points = points.len(), cell_size = self.cell_size))]
    pub fn cluster_points(&self, points: &[Point3d]) -> Result<Vec<Point3d>> {
        let cells = self.cells(points)?;
        Ok(cells
            .par_iter()
            .map(|members| {
                let (position, _) = self.reduce(points, None, members);
                position
            })
            .collect())
    }

    /// One sample per occupied cell.
    ///
    /// Each output carries the summed weight of its cell. Averaged outputs
    /// lose provenance; `NearestToCentroid` keeps the chosen member's.
    #[tracing::instrument(skip_all, fields(samples = samples.len(), cell_size = self.cell_size))]
    pub fn cluster_samples(&self, samples: &[Sample]) -> Result<Vec<Sample>> {
        let positions: Vec<Point3d> = samples.iter().map(|s| s.position).collect();
        let weights: Vec<f64> = samples.iter().map(|s| s.weight).collect();
        let cells = self.cells(&positions)?;
        Ok(cells
            .par_iter()
            .map(|members| {
                let total: f64 = members.iter().map(|&i| weights[i]).sum();
                let (position, chosen) = self.reduce(&positions, Some(weights.as_slice()), members);
                match chosen {
                    Some(i) => samples[i].with_weight(total),
                    None => Sample::new(position).with_weight(total),
                }
            })
            .collect())
    }

    /// Cluster the vertices of `mesh` into a point cloud.
    ///
    /// Vertex normals, when every cell has some, are averaged per cell and
    /// carried over.
    #[tracing::instrument(skip_all, fields(vertices = mesh.vertex_count(), cell_size = self.cell_size))]
    pub fn cluster_mesh(&self, mesh: &Mesh) -> Result<Mesh> {
        let positions = mesh.export_vertices();
        let cells = self.cells(&positions)?;
        let representatives: Vec<Point3d> = cells
            .par_iter()
            .map(|members| self.reduce(&positions, None, members).0)
            .collect();

        let normals: Option<Vec<Vector3d>> = cells
            .iter()
            .map(|members| {
                let sum = members
                    .iter()
                    .filter_map(|&i| mesh.vertices()[i].normal)
                    .fold(Vector3d::zeros(), |acc, n| acc + n);
                sum.try_normalize(f64::EPSILON)
            })
            .collect();

        let cloud = Mesh::from_vertices(&representatives);
        match normals {
            Some(normals) if !normals.is_empty() => cloud.with_vertex_normals(normals),
            _ => Ok(cloud),
        }
    }

    /// Representative of one cell, plus the member index when it is an input point
    fn reduce(&self, positions: &[Point3d], weights: Option<&[f64]>, members: &[usize]) -> (Point3d, Option<usize>) {
        let centroid = mean(positions, members);
        match self.representative {
            RepresentativeStrategy::Centroid => (centroid, None),
            RepresentativeStrategy::WeightedAverage => {
                let Some(weights) = weights else {
                    return (centroid, None);
                };
                let total: f64 = members.iter().map(|&i| weights[i]).sum();
                if total.abs() <= f64::EPSILON {
                    return (centroid, None);
                }
                let sum = members
                    .iter()
                    .fold(Vector3d::zeros(), |acc, &i| acc + positions[i].coords * weights[i]);
                (Point3d::from(sum / total), None)
            }
            RepresentativeStrategy::NearestToCentroid => {
                let mut best = members[0];
                let mut best_d2 = f64::INFINITY;
                for &i in members {
                    let d2 = (positions[i] - centroid).norm_squared();
                    if d2 < best_d2 {
                        best = i;
                        best_d2 = d2;
                    }
                }
                (positions[best], Some(best))
            }
        }
    }
}

fn mean(positions: &[Point3d], members: &[usize]) -> Point3d {
    let sum = members
        .iter()
        .fold(Vector3d::zeros(), |acc, &i| acc + positions[i].coords);
    Point3d::from(sum / members.len() as f64)
}

/// Replace the vertices of `mesh` by one centroid per occupied cell of size `cell_size`
pub fn cluster_vertices(mesh: &Mesh, cell_size: f64) -> Result<Vec<Point3d>> {
    GridClustering::new(cell_size).cluster_points(&mesh.export_vertices())
}
