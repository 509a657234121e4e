pub mod filter;
pub mod location;
pub mod markers;
pub mod symbology;

pub use filter::*;
pub use location::*;
pub use markers::*;
pub use symbology::*;
