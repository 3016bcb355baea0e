pub mod check;
pub mod start;

pub use check::*;
pub use start::*;
