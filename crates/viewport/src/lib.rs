pub mod camera;
pub mod controller;
pub mod follow;
pub mod positioning;
pub mod viewport;

pub use camera::*;
pub use controller::*;
pub use follow::*;
pub use positioning::*;
pub use viewport::*;
