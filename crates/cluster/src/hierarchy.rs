//! Hierarchical greedy clustering.
//!
//! Level `raw_level` holds the input points. Each lower level is produced from
//! the one above by visiting its nodes in order and absorbing every unvisited
//! neighbor within the grouping radius (converted to projected units at that
//! zoom). A seed with enough neighbors becomes a new cluster at their weighted
//! centroid; anything else is copied down unchanged, keeping its identity.

use foundation::bounds::Aabb2;
use foundation::ids::PointId;
use foundation::math::{lat_to_unit_y, lng_to_unit_x, pixels_to_unit, project, unproject};

use crate::index::KdIndex;
use crate::node::{ClusterId, ClusterNode, Node, PointNode};
use crate::options::ClusterOptions;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    /// Index into the input snapshot.
    Point(usize),
    Cluster { id: ClusterId, representative: usize },
}

#[derive(Debug, Clone)]
struct LevelNode {
    pos: [f64; 2],
    count: usize,
    kind: Kind,
    /// Cluster this node was absorbed into one level down.
    parent: Option<ClusterId>,
}

impl LevelNode {
    fn representative(&self) -> usize {
        match self.kind {
            Kind::Point(i) => i,
            Kind::Cluster { representative, .. } => representative,
        }
    }

    fn copied(&self) -> LevelNode {
        LevelNode {
            parent: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Level {
    nodes: Vec<LevelNode>,
    tree: KdIndex,
}

impl Level {
    fn new(nodes: Vec<LevelNode>) -> Self {
        let coords: Vec<[f64; 2]> = nodes.iter().map(|n| n.pos).collect();
        Self {
            tree: KdIndex::build(&coords),
            nodes,
        }
    }
}

/// Cluster hierarchy over one point snapshot, queryable at any zoom.
#[derive(Debug, Clone)]
pub struct ClusterIndex {
    options: ClusterOptions,
    ids: Vec<PointId>,
    /// `levels[z]` is the partition at zoom `z`, for `z` in `min_zoom..=raw_level`.
    levels: Vec<Level>,
}

impl ClusterIndex {
    pub fn build<'a, I>(points: I, options: ClusterOptions) -> Self
    where
        I: IntoIterator<Item = (&'a PointId, foundation::math::Coordinate)>,
    {
        let mut ids = Vec::new();
        let mut raw = Vec::new();
        for (i, (id, coordinate)) in points.into_iter().enumerate() {
            ids.push(id.clone());
            raw.push(LevelNode {
                pos: project(coordinate),
                count: 1,
                kind: Kind::Point(i),
                parent: None,
            });
        }

        let raw_level = options.raw_level() as usize;
        let mut levels = vec![Level::default(); raw_level + 1];
        levels[raw_level] = Level::new(raw);

        for z in (options.min_zoom as usize..raw_level).rev() {
            let next = cluster_level(&mut levels[z + 1], z as u8, &options);
            levels[z] = Level::new(next);
        }

        Self {
            options,
            ids,
            levels,
        }
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    pub fn point_count(&self) -> usize {
        self.ids.len()
    }

    /// Clamp a zoom to the levels this index holds.
    pub fn clamp_zoom(&self, zoom: i32) -> u8 {
        zoom.clamp(self.options.min_zoom as i32, self.options.raw_level() as i32) as u8
    }

    /// Every node at `zoom`: a partition of the input points.
    pub fn level(&self, zoom: i32) -> Vec<Node> {
        let z = self.clamp_zoom(zoom) as usize;
        self.levels[z].nodes.iter().map(|n| self.to_node(n)).collect()
    }

    /// Nodes at `zoom` whose position lies inside `bounds`.
    ///
    /// A box with `west > east` crosses the antimeridian and is queried in two
    /// halves; a longitude span of 360° or more covers every longitude.
    pub fn query(&self, bounds: &Aabb2, zoom: i32) -> Vec<Node> {
        let z = self.clamp_zoom(zoom) as usize;
        let level = &self.levels[z];

        let south = bounds.south().clamp(-90.0, 90.0);
        let north = bounds.north().clamp(-90.0, 90.0);
        let (west, east) = if bounds.lon_span() >= 360.0 {
            (-180.0, 180.0)
        } else {
            let west = (bounds.west() + 180.0).rem_euclid(360.0) - 180.0;
            let east = if bounds.east() == 180.0 {
                180.0
            } else {
                (bounds.east() + 180.0).rem_euclid(360.0) - 180.0
            };
            (west, east)
        };

        let mut hits = if west > east {
            let mut a = range_deg(level, west, south, 180.0, north);
            a.extend(range_deg(level, -180.0, south, east, north));
            a
        } else {
            range_deg(level, west, south, east, north)
        };
        hits.sort_unstable();
        hits.dedup();

        hits.into_iter()
            .map(|i| self.to_node(&level.nodes[i as usize]))
            .collect()
    }

    /// Nodes one level above the one where `id` was formed that were absorbed into it.
    pub fn children(&self, id: ClusterId) -> Vec<Node> {
        let Some(level) = self.levels.get(id.zoom as usize + 1) else {
            return Vec::new();
        };
        level
            .nodes
            .iter()
            .filter(|n| n.parent == Some(id))
            .map(|n| self.to_node(n))
            .collect()
    }

    /// All input points under `id`.
    pub fn leaves(&self, id: ClusterId) -> Vec<PointId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cid) = stack.pop() {
            for child in self.children(cid) {
                match child {
                    Node::Cluster(c) => stack.push(c.id),
                    Node::Point(p) => out.push(p.point_id),
                }
            }
        }
        out
    }

    /// Lowest zoom at which the members of `id` no longer form a single node.
    ///
    /// May exceed `max_zoom` by one when members coincide; callers cap it.
    /// Returns `None` for ids this index did not produce.
    pub fn expansion_zoom(&self, id: ClusterId) -> Option<u8> {
        if !self.contains_cluster(id) {
            return None;
        }

        let mut id = id;
        let mut zoom = id.zoom;
        while zoom <= self.options.max_zoom {
            let children = self.children(id);
            zoom += 1;
            if children.len() != 1 {
                break;
            }
            match &children[0] {
                Node::Cluster(c) => id = c.id,
                Node::Point(_) => break,
            }
        }
        Some(zoom)
    }

    fn contains_cluster(&self, id: ClusterId) -> bool {
        self.levels.get(id.zoom as usize).is_some_and(|level| {
            level
                .nodes
                .iter()
                .any(|n| matches!(n.kind, Kind::Cluster { id: cid, .. } if cid == id))
        })
    }

    fn to_node(&self, n: &LevelNode) -> Node {
        let position = unproject(n.pos);
        match n.kind {
            Kind::Point(i) => Node::Point(PointNode {
                position,
                point_id: self.ids[i].clone(),
            }),
            Kind::Cluster { id, representative } => Node::Cluster(ClusterNode {
                id,
                position,
                member_count: n.count,
                representative_id: self.ids[representative].clone(),
            }),
        }
    }
}

fn range_deg(level: &Level, west: f64, south: f64, east: f64, north: f64) -> Vec<u32> {
    // Projected y grows southward.
    level.tree.range(
        [lng_to_unit_x(west), lat_to_unit_y(north)],
        [lng_to_unit_x(east), lat_to_unit_y(south)],
    )
}

/// Produce the level at `zoom` from the level above it, recording parents on `above`.
fn cluster_level(above: &mut Level, zoom: u8, options: &ClusterOptions) -> Vec<LevelNode> {
    let r = pixels_to_unit(options.radius_px, options.extent, zoom as f64);
    let n = above.nodes.len();
    let mut visited = vec![false; n];
    let mut out = Vec::with_capacity(n);
    let mut seq: u32 = 0;

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let seed_pos = above.nodes[i].pos;
        let seed_count = above.nodes[i].count;
        let neighbors = above.tree.within(seed_pos, r);

        let mut count = seed_count;
        for &j in &neighbors {
            if !visited[j as usize] {
                count += above.nodes[j as usize].count;
            }
        }

        if count > seed_count && count >= options.min_points {
            let id = ClusterId { zoom, seq };
            seq += 1;

            let mut wx = seed_pos[0] * seed_count as f64;
            let mut wy = seed_pos[1] * seed_count as f64;
            for &j in &neighbors {
                let j = j as usize;
                if visited[j] {
                    continue;
                }
                visited[j] = true;
                let nb = &mut above.nodes[j];
                wx += nb.pos[0] * nb.count as f64;
                wy += nb.pos[1] * nb.count as f64;
                nb.parent = Some(id);
            }
            above.nodes[i].parent = Some(id);

            out.push(LevelNode {
                pos: [wx / count as f64, wy / count as f64],
                count,
                kind: Kind::Cluster {
                    id,
                    representative: above.nodes[i].representative(),
                },
                parent: None,
            });
        } else {
            out.push(above.nodes[i].copied());
            if count > seed_count {
                // Too few to cluster: neighbors keep their own identity.
                for &j in &neighbors {
                    let j = j as usize;
                    if visited[j] {
                        continue;
                    }
                    visited[j] = true;
                    out.push(above.nodes[j].copied());
                }
            }
        }
    }

    out
}
