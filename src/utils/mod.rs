pub mod date_format;
pub mod js_literal;
pub mod process_killer;
pub mod size;
pub mod user_path;

pub use date_format::*;
pub use js_literal::*;
pub use process_killer::*;
pub use size::*;
pub use user_path::*;
