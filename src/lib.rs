pub mod marker;
pub mod options;
pub mod state;
pub mod stream;
pub mod types;

#[cfg(feature = "pulldown")]
pub mod adapters;

pub use marker::*;
pub use options::*;
pub use state::*;
pub use stream::*;
pub use types::*;
