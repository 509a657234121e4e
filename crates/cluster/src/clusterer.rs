use foundation::bounds::Aabb2;
use foundation::math::Coordinate;
use foundation::points::GeoPoint;

use crate::hierarchy::ClusterIndex;
use crate::node::{ClusterId, Node};
use crate::options::ClusterOptions;

/// At or below this floored zoom the whole world is queried.
pub const GLOBAL_QUERY_MAX_ZOOM: i32 = 3;

/// Padding (degrees) around the viewport center is `max(MIN_PADDING_DEG, PADDING_ZOOM_BASE - zoom)`.
pub const MIN_PADDING_DEG: f64 = 0.5;
pub const PADDING_ZOOM_BASE: f64 = 15.0;

/// Zoom level used for index queries: the floor of the camera zoom.
pub fn query_zoom(zoom: f64) -> i32 {
    zoom.floor() as i32
}

/// Bounding box queried for a viewport centered at `center`.
///
/// Low zooms use the whole world; local padding around the center breaks down
/// near the poles and the antimeridian when zoomed out.
pub fn query_bounds(center: Coordinate, zoom: f64) -> Aabb2 {
    let z = query_zoom(zoom);
    if z <= GLOBAL_QUERY_MAX_ZOOM {
        return Aabb2::WORLD;
    }
    let padding = MIN_PADDING_DEG.max(PADDING_ZOOM_BASE - z as f64);
    Aabb2::around(center, padding)
}

/// Content hash of a snapshot: ids and exact coordinate bits, in order.
///
/// Categories are excluded; they never affect grouping.
pub fn snapshot_key(points: &[GeoPoint]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(points.len() as u64).to_le_bytes());
    for p in points {
        let id = p.id.as_str().as_bytes();
        hasher.update(&(id.len() as u64).to_le_bytes());
        hasher.update(id);
        hasher.update(&p.coordinate.latitude.to_bits().to_le_bytes());
        hasher.update(&p.coordinate.longitude.to_bits().to_le_bytes());
    }
    hasher.finalize()
}

#[derive(Debug)]
struct CachedIndex {
    key: blake3::Hash,
    index: ClusterIndex,
}

/// Viewport-driven clustering over successive point snapshots.
///
/// Recomputes on every call. The hierarchy is only rebuilt when the snapshot's
/// content changes; viewport-only changes reuse it.
#[derive(Debug, Default)]
pub struct Clusterer {
    options: ClusterOptions,
    cache: Option<CachedIndex>,
    rebuilds: u64,
}

impl Clusterer {
    pub fn new(options: ClusterOptions) -> Self {
        Self {
            options,
            cache: None,
            rebuilds: 0,
        }
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Number of hierarchy builds so far.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Index for the most recent snapshot, if any has been seen.
    pub fn index(&self) -> Option<&ClusterIndex> {
        self.cache.as_ref().map(|c| &c.index)
    }

    /// Make sure the cached hierarchy matches `points`, rebuilding if needed.
    pub fn sync(&mut self, points: &[GeoPoint]) -> &ClusterIndex {
        let key = snapshot_key(points);
        let cached = match self.cache.take() {
            Some(c) if c.key == key => c,
            _ => {
                let index = ClusterIndex::build(
                    points.iter().map(|p| (&p.id, p.coordinate)),
                    self.options,
                );
                self.rebuilds += 1;
                tracing::debug!(
                    points = points.len(),
                    rebuilds = self.rebuilds,
                    "cluster index rebuilt"
                );
                CachedIndex { key, index }
            }
        };
        &self.cache.insert(cached).index
    }

    /// Cluster/point nodes to render for a viewport.
    pub fn cluster(&mut self, points: &[GeoPoint], center: Coordinate, zoom: f64) -> Vec<Node> {
        if points.is_empty() {
            // Still sync so a later expansion lookup can't hit a stale index.
            self.sync(points);
            return Vec::new();
        }
        let bounds = query_bounds(center, zoom);
        self.sync(points).query(&bounds, query_zoom(zoom))
    }

    /// Expansion zoom for a cluster of the current index, capped at `ceiling`.
    pub fn expansion_zoom(&self, id: ClusterId, ceiling: u8) -> Option<u8> {
        self.index()?.expansion_zoom(id).map(|z| z.min(ceiling))
    }
}

#[cfg(test)]
mod tests {
    use super::{Clusterer, query_bounds, snapshot_key};
    use crate::node::Node;
    use crate::options::ClusterOptions;
    use foundation::bounds::Aabb2;
    use foundation::math::Coordinate;
    use foundation::points::{Category, GeoPoint};
    use pretty_assertions::assert_eq;

    fn tight_five(center: Coordinate) -> Vec<GeoPoint> {
        // Ten meters apart along a line: all within 50 m of each other.
        (0..5)
            .map(|i| {
                GeoPoint::new(
                    format!("f{i}"),
                    center.offset_m(i as f64 * 10.0, 0.0),
                    Category::Chanterelle,
                )
            })
            .collect()
    }

    fn sorted_positions(nodes: &[Node]) -> Vec<(i64, i64, usize)> {
        let mut v: Vec<(i64, i64, usize)> = nodes
            .iter()
            .map(|n| {
                let p = n.position();
                (
                    (p.latitude * 1e9).round() as i64,
                    (p.longitude * 1e9).round() as i64,
                    n.member_count(),
                )
            })
            .collect();
        v.sort();
        v
    }

    #[test]
    fn low_zoom_uses_world_bounds() {
        assert_eq!(query_bounds(Coordinate::new(56.0, 10.0), 3.9), Aabb2::WORLD);
        assert_eq!(query_bounds(Coordinate::new(-70.0, 170.0), 0.0), Aabb2::WORLD);
    }

    #[test]
    fn padding_shrinks_with_zoom_to_a_floor() {
        let c = Coordinate::new(56.0, 10.0);
        assert_eq!(query_bounds(c, 4.0), Aabb2::around(c, 11.0));
        assert_eq!(query_bounds(c, 12.7), Aabb2::around(c, 3.0));
        assert_eq!(query_bounds(c, 18.0), Aabb2::around(c, 0.5));
    }

    #[test]
    fn five_tight_points_form_one_cluster_at_zoom_10() {
        let points = tight_five(Coordinate::new(56.0, 10.0));
        let mut clusterer = Clusterer::new(ClusterOptions::default());
        let nodes = clusterer.cluster(&points, Coordinate::new(56.0, 10.0), 10.0);
        assert_eq!(nodes.len(), 1);
        let cluster = nodes[0].as_cluster().expect("cluster node");
        assert_eq!(cluster.member_count, 5);
    }

    #[test]
    fn five_tight_points_separate_at_zoom_20() {
        let points = tight_five(Coordinate::new(56.0, 10.0));
        let mut clusterer = Clusterer::new(ClusterOptions::default());
        let nodes = clusterer.cluster(&points, Coordinate::new(56.0, 10.0002), 20.0);
        assert_eq!(nodes.len(), 5);
        assert!(nodes.iter().all(|n| matches!(n, Node::Point(_))));
    }

    #[test]
    fn low_zoom_result_ignores_center() {
        let mut points = tight_five(Coordinate::new(56.0, 10.0));
        points.push(GeoPoint::new("nz", Coordinate::new(-41.3, 174.8), Category::Blueberry));
        points.push(GeoPoint::new("ca", Coordinate::new(49.2, -123.1), Category::Porcini));

        let mut clusterer = Clusterer::new(ClusterOptions::default());
        for zoom in [0.0, 1.5, 2.0, 3.99] {
            let reference = sorted_positions(&clusterer.cluster(&points, Coordinate::new(0.0, 0.0), zoom));
            for center in [
                Coordinate::new(56.0, 10.0),
                Coordinate::new(-80.0, 179.0),
                Coordinate::new(70.0, -150.0),
            ] {
                let got = sorted_positions(&clusterer.cluster(&points, center, zoom));
                assert_eq!(got, reference, "zoom {zoom}");
            }
        }
    }

    #[test]
    fn viewport_changes_reuse_the_index() {
        let points = tight_five(Coordinate::new(56.0, 10.0));
        let mut clusterer = Clusterer::new(ClusterOptions::default());
        clusterer.cluster(&points, Coordinate::new(56.0, 10.0), 10.0);
        clusterer.cluster(&points, Coordinate::new(55.0, 11.0), 14.0);
        clusterer.cluster(&points.clone(), Coordinate::new(55.0, 11.0), 4.0);
        assert_eq!(clusterer.rebuilds(), 1);

        let mut moved = points.clone();
        moved[2].coordinate = moved[2].coordinate.offset_m(5.0, 0.0);
        clusterer.cluster(&moved, Coordinate::new(56.0, 10.0), 10.0);
        assert_eq!(clusterer.rebuilds(), 2);
    }

    #[test]
    fn category_does_not_change_snapshot_key() {
        let mut points = tight_five(Coordinate::new(56.0, 10.0));
        let a = snapshot_key(&points);
        points[0].category = Category::Sloe;
        assert_eq!(snapshot_key(&points), a);
        points[0].id = "renamed".into();
        assert_ne!(snapshot_key(&points), a);
    }

    #[test]
    fn empty_snapshot_clears_stale_index() {
        let mut clusterer = Clusterer::new(ClusterOptions::default());
        let nodes = clusterer.cluster(&tight_five(Coordinate::new(56.0, 10.0)), Coordinate::new(56.0, 10.0), 10.0);
        let id = nodes[0].as_cluster().expect("cluster").id;

        assert!(clusterer.cluster(&[], Coordinate::new(56.0, 10.0), 10.0).is_empty());
        assert_eq!(clusterer.expansion_zoom(id, 20), None);
    }

    #[test]
    fn expansion_zoom_is_capped() {
        let c = Coordinate::new(56.0, 10.0);
        let points = vec![
            GeoPoint::new("a", c, Category::Other),
            GeoPoint::new("b", c, Category::Other),
        ];
        let mut clusterer = Clusterer::new(ClusterOptions::default());
        let nodes = clusterer.cluster(&points, c, 12.0);
        let id = nodes[0].as_cluster().expect("cluster").id;
        assert_eq!(clusterer.expansion_zoom(id, 20), Some(20));
    }
}
