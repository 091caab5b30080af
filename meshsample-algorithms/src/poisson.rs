//! Poisson-disk sampling by pruning
//!
//! The sampler oversamples the surface uniformly, indexes the candidates in a
//! grid whose cells are one radius wide, and prunes candidates until no two
//! survivors are closer than the radius. Distance is either straight-line or
//! an estimate of the distance along the surface.
//!
//! Two pruning policies exist. The default walks candidates in generation
//! order and keeps a candidate only if no kept one is within the radius. With
//! best-choice pruning the candidate whose acceptance knocks out the fewest
//! remaining candidates is kept first.

use crate::geodesic::FaceGraph;
use crate::sampling::{sample_surface_uniform, sample_vertices};
use crate::spatial_grid::{GridLayout, PointGrid, DEFAULT_MAX_CELLS_PER_AXIS};
use meshsample_core::{Error, Mesh, NearestNeighborSearch, Point3d, Provenance, Result, Sample};
use priority_queue::PriorityQueue;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Fraction of the plane covered by disks of radius `r/2` in a typical
/// Poisson-disk set; converts area into an expected sample count.
pub const PACKING_DENSITY: f64 = 0.7;

/// Default number of candidates drawn per expected survivor
pub const DEFAULT_OVERSAMPLING_FACTOR: f64 = 20.0;

/// Where pruning candidates come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CandidateSource {
    /// Surface oversampling when the mesh has area, the input vertices otherwise.
    #[default]
    Auto,
    /// Uniform random points over the faces.
    Surface,
    /// The mesh vertices themselves, in input order.
    Vertices,
}

/// Parameters for Poisson-disk sampling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoissonDiskParams {
    /// Minimum separation between output points
    pub radius: f64,
    /// Measure separation along the surface instead of straight-line
    pub use_geodesic_distance: bool,
    /// Keep the candidate that removes the fewest others first
    pub best_choice_sampling: bool,
    /// Candidates drawn per expected survivor, must exceed 1
    pub oversampling_factor: f64,
    pub candidate_source: CandidateSource,
    /// Safety bound on the candidate grid
    pub max_cells_per_axis: usize,
}

impl PoissonDiskParams {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            use_geodesic_distance: false,
            best_choice_sampling: false,
            oversampling_factor: DEFAULT_OVERSAMPLING_FACTOR,
            candidate_source: CandidateSource::Auto,
            max_cells_per_axis: DEFAULT_MAX_CELLS_PER_AXIS,
        }
    }

    /// Pick the radius that yields roughly `count` samples over the mesh surface
    pub fn from_sample_count(mesh: &Mesh, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(Error::InvalidParameter(
                "sample count must be positive".to_string(),
            ));
        }
        let area = mesh.total_area();
        if !(area > 0.0) {
            return Err(Error::InvalidParameter(
                "cannot derive a radius from a mesh without surface area".to_string(),
            ));
        }
        Ok(Self::new(radius_for_sample_count(area, count)))
    }

    pub fn with_geodesic_distance(mut self, enabled: bool) -> Self {
        self.use_geodesic_distance = enabled;
        self
    }

    pub fn with_best_choice(mut self, enabled: bool) -> Self {
        self.best_choice_sampling = enabled;
        self
    }

    pub fn with_oversampling_factor(mut self, factor: f64) -> Self {
        self.oversampling_factor = factor;
        self
    }

    pub fn with_candidate_source(mut self, source: CandidateSource) -> Self {
        self.candidate_source = source;
        self
    }

    pub fn with_max_cells_per_axis(mut self, max_cells_per_axis: usize) -> Self {
        self.max_cells_per_axis = max_cells_per_axis;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "radius must be positive and finite, got {}",
                self.radius
            )));
        }
        if !(self.oversampling_factor.is_finite() && self.oversampling_factor > 1.0) {
            return Err(Error::InvalidParameter(format!(
                "oversampling factor must be greater than 1, got {}",
                self.oversampling_factor
            )));
        }
        Ok(())
    }
}

/// Expected number of Poisson-disk samples of `radius` over `area`
pub fn expected_sample_count(area: f64, radius: f64) -> f64 {
    area / (PI * radius * radius * PACKING_DENSITY)
}

/// Radius giving roughly `count` Poisson-disk samples over `area`
pub fn radius_for_sample_count(area: f64, count: usize) -> f64 {
    (area / (count as f64 * PI * PACKING_DENSITY)).sqrt()
}

/// Counters collected during one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoissonDiskStats {
    /// Survivors predicted from the surface area (0 for vertex candidates)
    pub expected_count: f64,
    pub candidate_count: usize,
    /// Unordered candidate pairs closer than the radius
    pub conflict_pairs: usize,
    pub accepted_count: usize,
    pub removed_count: usize,
}

/// Result of a Poisson-disk run
#[derive(Debug, Clone, PartialEq)]
pub struct PoissonDiskOutput {
    /// Survivors in generation order
    pub samples: Vec<Sample>,
    pub stats: PoissonDiskStats,
}

impl PoissonDiskOutput {
    pub fn positions(&self) -> Vec<Point3d> {
        self.samples.iter().map(|s| s.position).collect()
    }
}

/// Poisson-disk sampler for meshes and point clouds
#[derive(Debug, Clone)]
pub struct PoissonDiskSampler {
    params: PoissonDiskParams,
}

impl PoissonDiskSampler {
    pub fn new(params: PoissonDiskParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PoissonDiskParams {
        &self.params
    }

    /// Draw candidates from `mesh` and prune them
    #[tracing::instrument(skip_all, fields(radius = self.params.radius))]
    pub fn run<R: Rng + ?Sized>(&self, mesh: &Mesh, rng: &mut R) -> Result<PoissonDiskOutput> {
        self.params.validate()?;
        let layout = self.layout(mesh)?;

        let area = mesh.total_area();
        let source = match self.params.candidate_source {
            CandidateSource::Auto if area > 0.0 => CandidateSource::Surface,
            CandidateSource::Auto => CandidateSource::Vertices,
            explicit => explicit,
        };

        let (candidates, expected) = match source {
            CandidateSource::Vertices => (sample_vertices(mesh, mesh.vertex_count(), rng), 0.0),
            _ => {
                if !(area > 0.0) {
                    warn!("surface has zero area, returning no samples");
                    return Ok(PoissonDiskOutput {
                        samples: Vec::new(),
                        stats: PoissonDiskStats::default(),
                    });
                }
                let expected = expected_sample_count(area, self.params.radius);
                let count = (expected * self.params.oversampling_factor).ceil() as usize;
                (sample_surface_uniform(mesh, count, rng), expected)
            }
        };
        debug!(?source, candidates = candidates.len(), expected, "oversampled");

        let mut output = self.prune_with_layout(mesh, candidates, layout);
        output.stats.expected_count = expected;
        Ok(output)
    }

    /// Prune a fixed candidate set drawn from `mesh`
    pub fn prune(&self, mesh: &Mesh, candidates: Vec<Sample>) -> Result<PoissonDiskOutput> {
        self.params.validate()?;
        let layout = self.layout(mesh)?;
        for (i, candidate) in candidates.iter().enumerate() {
            let in_range = match candidate.provenance {
                Provenance::Vertex(v) => v < mesh.vertex_count(),
                Provenance::Face { face, .. } => face < mesh.face_count(),
                Provenance::None => true,
            };
            if !in_range {
                return Err(Error::InvalidParameter(format!(
                    "candidate {} refers to {:?}, outside the mesh",
                    i, candidate.provenance
                )));
            }
        }
        Ok(self.prune_with_layout(mesh, candidates, layout))
    }

    fn layout(&self, mesh: &Mesh) -> Result<GridLayout> {
        GridLayout::new(
            mesh.bounding_box(),
            self.params.max_cells_per_axis,
            Some(self.params.radius),
        )
    }

    fn prune_with_layout(&self, mesh: &Mesh, candidates: Vec<Sample>, layout: GridLayout) -> PoissonDiskOutput {
        let positions: Vec<Point3d> = candidates.iter().map(|s| s.position).collect();
        let index = PointGrid::from_layout(&positions, layout);
        debug!(
            occupied_cells = index.grid().occupied_cell_count(),
            "candidates indexed"
        );

        let graph = (self.params.use_geodesic_distance && !mesh.is_point_cloud())
            .then(|| FaceGraph::from_mesh(mesh));
        let conflicts = conflict_lists(&candidates, &index, self.params.radius, graph.as_ref());
        let conflict_pairs = conflicts.iter().map(Vec::len).sum::<usize>() / 2;

        let keep = if self.params.best_choice_sampling {
            prune_best_choice(&conflicts)
        } else {
            prune_in_order(&conflicts)
        };

        let samples: Vec<Sample> = candidates
            .into_iter()
            .zip(&keep)
            .filter_map(|(s, &k)| k.then_some(s))
            .collect();

        let stats = PoissonDiskStats {
            expected_count: 0.0,
            candidate_count: keep.len(),
            conflict_pairs,
            accepted_count: samples.len(),
            removed_count: keep.len() - samples.len(),
        };
        debug!(
            accepted = stats.accepted_count,
            removed = stats.removed_count,
            conflict_pairs,
            "pruned"
        );

        PoissonDiskOutput { samples, stats }
    }
}

/// Sample `mesh` so that no two output points are closer than `radius`
pub fn poisson_disk_sample<R: Rng + ?Sized>(
    mesh: &Mesh,
    radius: f64,
    use_geodesic_distance: bool,
    best_choice_sampling: bool,
    rng: &mut R,
) -> Result<Vec<Point3d>> {
    let params = PoissonDiskParams::new(radius)
        .with_geodesic_distance(use_geodesic_distance)
        .with_best_choice(best_choice_sampling);
    Ok(PoissonDiskSampler::new(params).run(mesh, rng)?.positions())
}

/// For every candidate, the sorted indices of candidates closer than `radius`.
///
/// Straight-line neighbours come from the grid. With a face graph they are
/// filtered again by surface distance, which is never shorter. Candidates
/// without surface provenance fall back to straight-line distance.
fn conflict_lists(
    candidates: &[Sample],
    index: &PointGrid,
    radius: f64,
    graph: Option<&FaceGraph>,
) -> Vec<Vec<usize>> {
    let upper: Vec<Vec<usize>> = (0..candidates.len())
        .into_par_iter()
        .map(|i| {
            let p = &candidates[i].position;
            let mut near: Vec<usize> = index
                .find_radius_neighbors(p, radius)
                .into_iter()
                .filter(|&(j, d)| j > i && d < radius)
                .map(|(j, _)| j)
                .collect();
            near.sort_unstable();

            let Some(graph) = graph else {
                return near;
            };
            let anchors = graph.anchors(&candidates[i]);
            if anchors.is_empty() {
                return near;
            }
            let field = graph.distances_from(p, &anchors, radius);
            near.retain(|&j| {
                let other = &candidates[j];
                let other_anchors = graph.anchors(other);
                if other_anchors.is_empty() {
                    return true;
                }
                graph
                    .distance_to(p, &anchors, &field, &other.position, &other_anchors)
                    .is_some_and(|d| d < radius)
            });
            near
        })
        .collect();

    let mut conflicts: Vec<Vec<usize>> = upper.clone();
    for (i, list) in upper.iter().enumerate() {
        for &j in list {
            conflicts[j].push(i);
        }
    }
    for list in &mut conflicts {
        list.sort_unstable();
    }
    conflicts
}

/// Dart-throwing acceptance: keep a candidate unless a kept earlier one conflicts
fn prune_in_order(conflicts: &[Vec<usize>]) -> Vec<bool> {
    let mut removed = vec![false; conflicts.len()];
    for i in 0..conflicts.len() {
        if removed[i] {
            continue;
        }
        for &j in conflicts[i].iter().filter(|&&j| j > i) {
            removed[j] = true;
        }
    }
    removed.into_iter().map(|r| !r).collect()
}

/// Keep the live candidate with the fewest live conflicts (earliest on ties)
/// and remove its conflicting neighbours, until no conflicts remain
fn prune_best_choice(conflicts: &[Vec<usize>]) -> Vec<bool> {
    let mut counts: Vec<usize> = conflicts.iter().map(Vec::len).collect();
    let mut removed = vec![false; conflicts.len()];

    // Max-queue on `Reverse`: fewest conflicts first, then lowest index.
    let mut queue: PriorityQueue<usize, Reverse<(usize, usize)>> = counts
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c > 0)
        .map(|(i, &c)| (i, Reverse((c, i))))
        .collect();

    while let Some((kept, _)) = queue.pop() {
        for &j in &conflicts[kept] {
            if removed[j] {
                continue;
            }
            removed[j] = true;
            queue.remove(&j);

            for &k in &conflicts[j] {
                if k == kept || removed[k] {
                    continue;
                }
                counts[k] -= 1;
                if counts[k] == 0 {
                    // No conflicts left: it survives without being picked
                    queue.remove(&k);
                } else {
                    queue.change_priority(&k, Reverse((counts[k], k)));
                }
            }
        }
    }

    removed.into_iter().map(|r| !r).collect()
}
