pub mod config;
pub mod host;
pub mod session;
pub mod view;

pub use config::*;
pub use host::*;
pub use session::*;
pub use view::*;
