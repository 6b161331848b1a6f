//! Module for generating, parsing and representing TSP instances.
//!
//! An instance is a set of points in the plane together with the integer
//! cost matrix the search works on. Instances are either drawn uniformly at
//! random from the deterministic generator or read from TSPLIB files with
//! `EUC_2D` distances.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};
use crate::rng::ParkMiller;

/// A vertex location in the plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Symmetric integer cost matrix.
///
/// Stored row-major in a single vector. `cost(i, i)` holds a sentinel that
/// is strictly larger than every real edge so that a self-loop can never
/// win a 2-opt comparison. Bounds are validated once, at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostMatrix {
    n: usize,
    costs: Vec<i64>,
}

impl CostMatrix {
    /// Build from explicit rows, diagonal sentinel included.
    pub fn new(rows: Vec<Vec<i64>>) -> SolverResult<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(SolverError::matrix("instance must have at least one vertex"));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n) {
            return Err(SolverError::matrix(format!(
                "row {} has {} entries, expected {}",
                i,
                row.len(),
                n
            )));
        }

        let mut max_edge = 0;
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                if rows[i][j] < 0 {
                    return Err(SolverError::matrix(format!("negative cost at ({}, {})", i, j)));
                }
                if rows[i][j] != rows[j][i] {
                    return Err(SolverError::matrix(format!(
                        "cost({}, {}) = {} differs from cost({}, {}) = {}",
                        i, j, rows[i][j], j, i, rows[j][i]
                    )));
                }
                max_edge = max_edge.max(rows[i][j]);
            }
        }
        if let Some(i) = (0..n).find(|&i| n > 1 && rows[i][i] <= max_edge) {
            return Err(SolverError::matrix(format!(
                "diagonal entry {} = {} must exceed the largest edge cost {}",
                i, rows[i][i], max_edge
            )));
        }

        Ok(CostMatrix { n, costs: rows.into_iter().flatten().collect() })
    }

    /// Build from an edge cost function evaluated for every `i < j`.
    ///
    /// The diagonal is set to `n * max_edge + 1`, which exceeds the length
    /// of any tour.
    pub fn from_fn<F>(n: usize, edge: F) -> SolverResult<Self>
    where
        F: Fn(usize, usize) -> i64,
    {
        if n == 0 {
            return Err(SolverError::matrix("instance must have at least one vertex"));
        }
        let mut costs = vec![0i64; n * n];
        let mut max_edge = 0;
        for i in 0..n {
            for j in i + 1..n {
                let c = edge(i, j);
                if c < 0 {
                    return Err(SolverError::matrix(format!("negative cost at ({}, {})", i, j)));
                }
                costs[i * n + j] = c;
                costs[j * n + i] = c;
                max_edge = max_edge.max(c);
            }
        }
        let sentinel = max_edge
            .checked_mul(n as i64)
            .and_then(|v| v.checked_add(1))
            .ok_or_else(|| SolverError::matrix("edge costs too large for a 64-bit tour length"))?;
        for i in 0..n {
            costs[i * n + i] = sentinel;
        }
        Ok(CostMatrix { n, costs })
    }

    /// Number of vertices
    #[inline]
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Cost of edge (i, j)
    #[inline]
    pub fn cost(&self, i: usize, j: usize) -> i64 {
        self.costs[i * self.n + j]
    }

    /// Largest off-diagonal entry
    pub fn max_edge(&self) -> i64 {
        self.edges().max().unwrap_or(0)
    }

    /// Iterate over the costs of all edges `i < j`
    pub fn edges(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.n).flat_map(move |i| (i + 1..self.n).map(move |j| self.cost(i, j)))
    }

    /// Length of a cyclic tour, wrap-around edge included
    pub fn tour_length(&self, order: &[usize]) -> i64 {
        if order.is_empty() {
            return 0;
        }
        let mut total = 0;
        for pair in order.windows(2) {
            total += self.cost(pair[0], pair[1]);
        }
        total + self.cost(order[order.len() - 1], order[0])
    }
}

/// A complete TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// Vertex coordinates
    pub points: Vec<Point>,
    /// Integer cost matrix the search works on
    pub matrix: CostMatrix,
}

impl Instance {
    /// Place `n` points uniformly at random on a `max_coord` x `max_coord`
    /// integer grid.
    ///
    /// Coordinates are drawn vertex by vertex, `x` before `y`, from the
    /// same generator the search uses afterwards. Edge costs are truncated
    /// Euclidean distances.
    pub fn random(n: usize, max_coord: usize, gen: &mut ParkMiller) -> SolverResult<Self> {
        if n == 0 {
            return Err(SolverError::parameter("n", "at least one vertex is required"));
        }
        if max_coord == 0 {
            return Err(SolverError::parameter("max_coord", "must be at least 1"));
        }

        let points: Vec<Point> = (0..n)
            .map(|_| {
                let x = gen.next(max_coord) as f64;
                let y = gen.next(max_coord) as f64;
                Point::new(x, y)
            })
            .collect();

        let matrix = CostMatrix::from_fn(n, |i, j| points[i].distance(&points[j]).floor() as i64)?;

        Ok(Instance {
            name: format!("random-{}", n),
            comment: format!("{} uniform points on a {}x{} grid", n, max_coord, max_coord),
            points,
            matrix,
        })
    }

    /// Parse a TSPLIB file with `EUC_2D` coordinates
    pub fn from_file<P: AsRef<Path>>(path: P) -> SolverResult<Self> {
        let file = File::open(&path)?;
        let mut instance = Self::from_reader(BufReader::new(file))?;
        if instance.name.is_empty() {
            instance.name = path
                .as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(instance)
    }

    /// Parse TSPLIB content from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> SolverResult<Self> {
        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension: Option<usize> = None;
        let mut coords: Vec<(usize, f64, f64, usize)> = Vec::new();
        let mut in_coords = false;
        let mut last_line = 0;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            last_line = line_no;
            let line = line?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if line == "EOF" {
                break;
            }

            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "NAME" => name = value.to_string(),
                    "COMMENT" => comment = value.to_string(),
                    "TYPE" => {
                        if value != "TSP" {
                            return Err(SolverError::parse(line_no, format!("unsupported TYPE {}", value)));
                        }
                    }
                    "DIMENSION" => {
                        let d = value
                            .parse()
                            .map_err(|_| SolverError::parse(line_no, "invalid dimension"))?;
                        dimension = Some(d);
                    }
                    "EDGE_WEIGHT_TYPE" => {
                        if value != "EUC_2D" {
                            return Err(SolverError::parse(
                                line_no,
                                format!("unsupported EDGE_WEIGHT_TYPE {}", value),
                            ));
                        }
                    }
                    _ => {}
                }
                in_coords = false;
                continue;
            }

            if line.starts_with("NODE_COORD_SECTION") {
                in_coords = true;
                continue;
            }
            if line.ends_with("_SECTION") {
                in_coords = false;
                continue;
            }

            if in_coords {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 3 {
                    return Err(SolverError::parse(line_no, "expected `id x y`"));
                }
                let id: usize = parts[0]
                    .parse()
                    .map_err(|_| SolverError::parse(line_no, "invalid node id"))?;
                let x: f64 = parts[1]
                    .parse()
                    .map_err(|_| SolverError::parse(line_no, "invalid x coordinate"))?;
                let y: f64 = parts[2]
                    .parse()
                    .map_err(|_| SolverError::parse(line_no, "invalid y coordinate"))?;
                coords.push((id, x, y, line_no));
            }
        }

        let dimension = dimension.unwrap_or(coords.len());
        if coords.len() != dimension {
            return Err(SolverError::parse(
                last_line,
                format!("DIMENSION is {} but {} coordinates were read", dimension, coords.len()),
            ));
        }

        // ids must be exactly 1..=dimension
        coords.sort_by_key(|&(id, _, _, line_no)| (id, line_no));
        for (expected, &(id, _, _, line_no)) in (1..).zip(&coords) {
            if id != expected {
                let message = if id < expected {
                    format!("duplicate node id {}", id)
                } else {
                    format!("node id {} is missing", expected)
                };
                return Err(SolverError::parse(line_no, message));
            }
        }
        let points: Vec<Point> = coords.iter().map(|&(_, x, y, _)| Point::new(x, y)).collect();

        // TSPLIB nint rounding
        let matrix = CostMatrix::from_fn(points.len(), |i, j| {
            (points[i].distance(&points[j]) + 0.5).floor() as i64
        })?;

        Ok(Instance { name, comment, points, matrix })
    }

    /// Number of vertices
    pub fn dimension(&self) -> usize {
        self.matrix.dimension()
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let costs: Vec<i64> = self.matrix.edges().collect();
        let avg_cost = if costs.is_empty() {
            0.0
        } else {
            costs.iter().sum::<i64>() as f64 / costs.len() as f64
        };

        InstanceStatistics {
            name: self.name.clone(),
            dimension: self.dimension(),
            avg_cost,
            min_cost: costs.iter().copied().min().unwrap_or(0),
            max_cost: costs.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Statistics about a TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub avg_cost: f64,
    pub min_cost: i64,
    pub max_cost: i64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Vertices: {}", self.dimension)?;
        writeln!(f, "  Avg edge cost: {:.2}", self.avg_cost)?;
        writeln!(f, "  Min edge cost: {}", self.min_cost)?;
        writeln!(f, "  Max edge cost: {}", self.max_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_calculation() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_matrix_validation() {
        assert!(CostMatrix::new(vec![]).is_err());
        assert!(CostMatrix::new(vec![vec![9, 1], vec![1]]).is_err());
        // asymmetric
        assert!(CostMatrix::new(vec![vec![9, 1], vec![2, 9]]).is_err());
        // negative edge
        assert!(CostMatrix::new(vec![vec![9, -1], vec![-1, 9]]).is_err());
        // diagonal not larger than the edges
        assert!(CostMatrix::new(vec![vec![1, 1], vec![1, 9]]).is_err());

        let m = CostMatrix::new(vec![vec![9, 2], vec![2, 9]]).unwrap();
        assert_eq!(m.dimension(), 2);
        assert_eq!(m.cost(0, 1), 2);
        assert_eq!(m.cost(1, 1), 9);
    }

    #[test]
    fn test_from_fn_sentinel() {
        let m = CostMatrix::from_fn(3, |i, j| (i + j) as i64).unwrap();
        assert_eq!(m.cost(1, 2), 3);
        assert_eq!(m.cost(2, 1), 3);
        assert_eq!(m.max_edge(), 3);
        for i in 0..3 {
            assert_eq!(m.cost(i, i), 10);
        }
        assert!(CostMatrix::from_fn(0, |_, _| 0).is_err());
        assert!(CostMatrix::from_fn(2, |_, _| -3).is_err());
    }

    #[test]
    fn test_tour_length_includes_wrap_around() {
        let m = CostMatrix::from_fn(4, |i, j| (j - i) as i64).unwrap();
        // 0-1 (1) + 1-2 (1) + 2-3 (1) + 3-0 (3)
        assert_eq!(m.tour_length(&[0, 1, 2, 3]), 6);
        assert_eq!(m.tour_length(&[]), 0);
    }

    #[test]
    fn test_random_instance_is_reproducible() {
        let mut a = ParkMiller::new(1).unwrap();
        let mut b = ParkMiller::new(1).unwrap();
        let first = Instance::random(20, 1000, &mut a).unwrap();
        let second = Instance::random(20, 1000, &mut b).unwrap();
        assert_eq!(first.matrix, second.matrix);
        assert_eq!(a, b);

        // First vertex uses the first two draws of the sequence
        assert_eq!(first.points[0], Point::new(807.0, 249.0));
        assert!(first.points.iter().all(|p| p.x < 1000.0 && p.y < 1000.0));
    }

    #[test]
    fn test_random_instance_rejects_empty() {
        let mut gen = ParkMiller::default();
        assert!(Instance::random(0, 1000, &mut gen).is_err());
        assert!(Instance::random(5, 0, &mut gen).is_err());
    }

    #[test]
    fn test_parse_tsplib() {
        let content = "NAME: square\n\
                       COMMENT: unit square\n\
                       TYPE: TSP\n\
                       DIMENSION: 4\n\
                       EDGE_WEIGHT_TYPE: EUC_2D\n\
                       NODE_COORD_SECTION\n\
                       1 0 0\n\
                       2 10 0\n\
                       3 10 10\n\
                       4 0 10\n\
                       EOF\n";
        let instance = Instance::from_reader(content.as_bytes()).unwrap();
        assert_eq!(instance.name, "square");
        assert_eq!(instance.dimension(), 4);
        assert_eq!(instance.matrix.cost(0, 1), 10);
        // sqrt(200) = 14.14 rounds to 14
        assert_eq!(instance.matrix.cost(0, 2), 14);
    }

    #[test]
    fn test_parse_errors() {
        let bad_type = "NAME: x\nEDGE_WEIGHT_TYPE: GEO\n";
        assert!(matches!(
            Instance::from_reader(bad_type.as_bytes()),
            Err(SolverError::Parse { line: 2, .. })
        ));

        let bad_coord = "DIMENSION: 1\nNODE_COORD_SECTION\n1 abc 0\n";
        assert!(Instance::from_reader(bad_coord.as_bytes()).is_err());

        let short = "DIMENSION: 3\nNODE_COORD_SECTION\n1 0 0\n2 1 1\nEOF\n";
        assert!(matches!(
            Instance::from_reader(short.as_bytes()),
            Err(SolverError::Parse { line: 5, .. })
        ));
    }

    #[test]
    fn test_node_ids_must_cover_dimension() {
        let duplicate = "DIMENSION: 3\nNODE_COORD_SECTION\n1 0 0\n2 1 1\n2 5 5\nEOF\n";
        match Instance::from_reader(duplicate.as_bytes()) {
            Err(SolverError::Parse { line, message }) => {
                assert_eq!(line, 5);
                assert!(message.contains("duplicate node id 2"));
            }
            other => panic!("unexpected result {:?}", other),
        }

        let gap = "DIMENSION: 3\nNODE_COORD_SECTION\n1 0 0\n3 1 1\n4 5 5\nEOF\n";
        match Instance::from_reader(gap.as_bytes()) {
            Err(SolverError::Parse { line, message }) => {
                assert_eq!(line, 4);
                assert!(message.contains("node id 2 is missing"));
            }
            other => panic!("unexpected result {:?}", other),
        }

        // ids may come in any order
        let shuffled = "DIMENSION: 3\nNODE_COORD_SECTION\n3 0 8\n1 0 0\n2 3 4\nEOF\n";
        let instance = Instance::from_reader(shuffled.as_bytes()).unwrap();
        assert_eq!(instance.points[2], Point::new(0.0, 8.0));
    }

    #[test]
    fn test_statistics() {
        let content = "DIMENSION: 3\nNODE_COORD_SECTION\n1 0 0\n2 3 4\n3 0 8\nEOF\n";
        let instance = Instance::from_reader(content.as_bytes()).unwrap();
        let stats = instance.statistics();
        assert_eq!(stats.dimension, 3);
        assert_eq!(stats.min_cost, 5);
        assert_eq!(stats.max_cost, 8);
        assert!((stats.avg_cost - 6.0).abs() < 1e-10);
    }
}
