pub mod clusterer;
pub mod hierarchy;
pub mod index;
pub mod node;
pub mod options;

pub use clusterer::*;
pub use hierarchy::ClusterIndex;
pub use node::*;
pub use options::*;
