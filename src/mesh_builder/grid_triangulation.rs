use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::database::{DiagonalMode, GridIndex, PointMap, SurfaceMesh};
use crate::error::MeshError;

pub struct GridTriangulator;  // Turns a sparse (i, j) point map into a triangle surface

impl GridTriangulator {
    /// Build the vertex and triangle lists of a sparse structured grid.
    ///
    /// Vertices are numbered from 1 sweeping j (outer) then i (inner) over the sorted
    /// distinct index values, skipping holes. A cell is triangulated only when all four
    /// corners on consecutive grid lines exist; `diagonal` picks the split for every cell.
    pub fn build(points: &PointMap, diagonal: DiagonalMode) -> Result<SurfaceMesh, MeshError> {
        if points.is_empty() {
            return Err(MeshError::EmptyPointMap);
        }

        // Sorted distinct grid lines in each direction
        let iset: Vec<i64> = points.keys().map(|&(i, _)| i).collect::<BTreeSet<_>>().into_iter().collect();
        let jset: Vec<i64> = points.keys().map(|&(_, j)| j).collect::<BTreeSet<_>>().into_iter().collect();

        // 1. Number the vertices in canonical (j outer, i inner) order
        let mut index: HashMap<GridIndex, usize> = HashMap::with_capacity(points.len());
        let mut vertices = Vec::with_capacity(points.len());
        for &j in &jset {
            for &i in &iset {
                if let Some(&coords) = points.get(&(i, j)) {
                    vertices.push(coords);
                    index.insert((i, j), vertices.len());               // 1-based
                }
            }
        }

        // 2. Triangulate every complete cell in the same sweep order
        let mut triangles = Vec::new();
        for rows in jset.windows(2) {
            let (j0, j1) = (rows[0], rows[1]);
            for cols in iset.windows(2) {
                let (i0, i1) = (cols[0], cols[1]);

                let corners = (
                    index.get(&(i0, j0)),
                    index.get(&(i1, j0)),
                    index.get(&(i0, j1)),
                    index.get(&(i1, j1)),
                );
                let (Some(&bl), Some(&br), Some(&tl), Some(&tr)) = corners else {
                    continue;                                           // Incomplete cell, no partial triangles
                };

                triangles.extend(Self::split_quad(bl, br, tl, tr, diagonal));
            }
        }

        if triangles.is_empty() {
            return Err(MeshError::NoQuads { points: points.len() });
        }

        debug!(
            "Triangulated {} x {} grid lines: {} vertices, {} triangles ({} diagonal)",
            iset.len(),
            jset.len(),
            vertices.len(),
            triangles.len(),
            diagonal
        );

        Ok(SurfaceMesh { vertices, triangles })
    }

    // Split one cell into two triangles along the requested diagonal
    fn split_quad(bl: usize, br: usize, tl: usize, tr: usize, diagonal: DiagonalMode) -> [[usize; 3]; 2] {
        match diagonal {
            DiagonalMode::Forward => [[bl, br, tr], [bl, tr, tl]],
            DiagonalMode::Backward => [[bl, br, tl], [br, tr, tl]],
        }
    }
}
