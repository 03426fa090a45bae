pub mod common;
pub mod error;
pub mod exchange;
pub mod pool;

pub use common::*;
pub use error::*;
pub use exchange::*;
pub use pool::*;
