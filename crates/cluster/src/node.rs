use std::fmt;

use foundation::ids::PointId;
use foundation::math::Coordinate;
use serde::{Deserialize, Serialize};

/// Identifier of a cluster within one index build.
///
/// Ids are not stable across rebuilds: a new point snapshot may reuse an id for
/// a different group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterId {
    /// Zoom level at which the cluster was formed.
    pub zoom: u8,
    pub seq: u32,
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.zoom, self.seq)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterNode {
    pub id: ClusterId,
    /// Weighted centroid of the members in projected space.
    pub position: Coordinate,
    pub member_count: usize,
    pub representative_id: PointId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointNode {
    pub position: Coordinate,
    pub point_id: PointId,
}

/// One renderable result of a clustering query.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Cluster(ClusterNode),
    Point(PointNode),
}

impl Node {
    pub fn position(&self) -> Coordinate {
        match self {
            Node::Cluster(c) => c.position,
            Node::Point(p) => p.position,
        }
    }

    pub fn member_count(&self) -> usize {
        match self {
            Node::Cluster(c) => c.member_count,
            Node::Point(_) => 1,
        }
    }

    pub fn as_cluster(&self) -> Option<&ClusterNode> {
        match self {
            Node::Cluster(c) => Some(c),
            Node::Point(_) => None,
        }
    }
}
