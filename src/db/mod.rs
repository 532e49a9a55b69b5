pub mod entities;
pub mod pool;

pub use entities::prelude;
pub use pool::*;
