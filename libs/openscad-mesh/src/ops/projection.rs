//! # Projection
//!
//! Shadow of a solid on the XY plane, or its cross-section at z = 0.
//!
//! The shadow of a closed mesh is the union of its upward-facing
//! triangles dropped onto the plane. Neighbouring up-facing triangles are
//! grouped into patches first; each patch projects without overlap, so
//! its boundary loops describe a valid region and only the patches need
//! the (slab based) union.

use std::collections::{BTreeMap, HashMap, HashSet};

use config::constants::EPSILON;
use glam::DVec2;

use crate::mesh::Mesh;
use crate::ops::planar::union_regions;
use crate::ops::slice::slice;
use crate::region::Region;

/// `projection(cut)`.
pub fn projection(mesh: &Mesh, cut: bool) -> Region {
    if cut {
        return slice(mesh, 0.0);
    }
    let patches = up_facing_patches(mesh);
    tracing::debug!(patches = patches.len(), "projecting mesh");
    let regions = patches
        .iter()
        .map(|patch| Region::new(boundary_loops(mesh, patch)))
        .collect();
    let mut region = union_regions(regions);
    region.set_color(mesh.color());
    region
}

/// Up-facing triangles grouped by shared edges.
fn up_facing_patches(mesh: &Mesh) -> Vec<Vec<[u32; 3]>> {
    let up: Vec<[u32; 3]> = mesh
        .triangles()
        .iter()
        .zip(mesh.triangle_positions())
        .filter(|(_, [a, b, c])| (*b - *a).cross(*c - *a).z > EPSILON)
        .map(|(tri, _)| *tri)
        .collect();

    let mut sets = DisjointSet::new(up.len());
    let mut owners: HashMap<(u32, u32), usize> = HashMap::new();
    for (index, tri) in up.iter().enumerate() {
        for (a, b) in edges(tri) {
            let key = (a.min(b), a.max(b));
            match owners.get(&key) {
                Some(&other) => sets.join(index, other),
                None => {
                    owners.insert(key, index);
                }
            }
        }
    }

    let mut patches: BTreeMap<usize, Vec<[u32; 3]>> = BTreeMap::new();
    for (index, tri) in up.into_iter().enumerate() {
        patches.entry(sets.find(index)).or_default().push(tri);
    }
    patches.into_values().collect()
}

fn edges(tri: &[u32; 3]) -> [(u32, u32); 3] {
    [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])]
}

/// Chain the edges without a reversed twin into closed loops.
fn boundary_loops(mesh: &Mesh, patch: &[[u32; 3]]) -> Vec<Vec<DVec2>> {
    let directed: Vec<(u32, u32)> = patch.iter().flat_map(edges).collect();
    let interior: HashSet<(u32, u32)> = directed.iter().copied().collect();
    let mut outgoing: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for &(a, b) in &directed {
        if !interior.contains(&(b, a)) {
            outgoing.entry(a).or_default().push(b);
        }
    }

    let position = |v: u32| mesh.vertices()[v as usize].truncate();
    let mut loops = Vec::new();
    while let Some(&start) = outgoing.keys().next() {
        let mut contour = Vec::new();
        let mut current = start;
        while let Some(next) = outgoing.get_mut(&current).and_then(Vec::pop) {
            if outgoing.get(&current).is_some_and(Vec::is_empty) {
                outgoing.remove(&current);
            }
            contour.push(position(current));
            current = next;
            if current == start {
                break;
            }
        }
        if current == start && contour.len() >= 3 {
            loops.push(contour);
        }
    }
    loops
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parent[index] != index {
            self.parent[index] = self.parent[self.parent[index]];
            index = self.parent[index];
        }
        index
    }

    fn join(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}
