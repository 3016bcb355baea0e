pub mod descriptor;
pub mod process_info;
pub mod settings;

pub use descriptor::*;
pub use process_info::*;
pub use settings::*;
