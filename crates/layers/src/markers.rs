use std::collections::HashMap;

use cluster::{ClusterId, Node};
use foundation::ids::PointId;
use foundation::math::Coordinate;
use foundation::points::{Category, GeoPoint};
use serde::Serialize;

use crate::symbology::{ClusterStyle, PinStyle, pin_style};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterMarker {
    pub key: String,
    pub cluster: ClusterId,
    pub position: Coordinate,
    pub count: usize,
    pub badge: String,
    pub caption: String,
    pub style: ClusterStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinMarker {
    pub key: String,
    pub point_id: PointId,
    pub position: Coordinate,
    pub category: Category,
    pub style: PinStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Marker {
    Cluster(ClusterMarker),
    Pin(PinMarker),
}

impl Marker {
    pub fn key(&self) -> &str {
        match self {
            Marker::Cluster(c) => &c.key,
            Marker::Pin(p) => &p.key,
        }
    }

    pub fn position(&self) -> Coordinate {
        match self {
            Marker::Cluster(c) => c.position,
            Marker::Pin(p) => p.position,
        }
    }
}

/// Receives marker activations (taps/clicks).
pub trait MarkerHandler {
    fn on_cluster_activated(&mut self, cluster: ClusterId, position: Coordinate);
    fn on_point_selected(&mut self, point: &PointId);
}

/// Markers for one clustering result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerLayer {
    pub markers: Vec<Marker>,
}

impl MarkerLayer {
    /// Builds markers for `nodes`. `points` supplies pin categories; ids not
    /// found there are styled as `Other`.
    pub fn from_nodes(nodes: &[Node], points: &[GeoPoint]) -> Self {
        let categories: HashMap<&PointId, Category> =
            points.iter().map(|p| (&p.id, p.category)).collect();

        let markers = nodes
            .iter()
            .map(|node| match node {
                Node::Cluster(c) => Marker::Cluster(ClusterMarker {
                    key: format!("cluster-{}", c.id),
                    cluster: c.id,
                    position: c.position,
                    count: c.member_count,
                    badge: c.member_count.to_string(),
                    caption: format!("{} spots", c.member_count),
                    style: ClusterStyle::default(),
                }),
                Node::Point(p) => {
                    let category = categories.get(&p.point_id).copied().unwrap_or_default();
                    Marker::Pin(PinMarker {
                        key: p.point_id.to_string(),
                        point_id: p.point_id.clone(),
                        position: p.position,
                        category,
                        style: pin_style(category),
                    })
                }
            })
            .collect();
        Self { markers }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.key() == key)
    }

    pub fn clusters(&self) -> impl Iterator<Item = &ClusterMarker> {
        self.markers.iter().filter_map(|m| match m {
            Marker::Cluster(c) => Some(c),
            Marker::Pin(_) => None,
        })
    }

    pub fn pins(&self) -> impl Iterator<Item = &PinMarker> {
        self.markers.iter().filter_map(|m| match m {
            Marker::Pin(p) => Some(p),
            Marker::Cluster(_) => None,
        })
    }

    /// Dispatches an activation of the marker with `key`. Returns false for
    /// unknown keys.
    pub fn activate(&self, key: &str, handler: &mut dyn MarkerHandler) -> bool {
        match self.get(key) {
            Some(Marker::Cluster(c)) => {
                handler.on_cluster_activated(c.cluster, c.position);
                true
            }
            Some(Marker::Pin(p)) => {
                handler.on_point_selected(&p.point_id);
                true
            }
            None => false,
        }
    }
}
