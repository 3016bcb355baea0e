pub mod config_parser;
pub mod process_manager;
pub mod settings_store;

pub use config_parser::*;
pub use process_manager::*;
pub use settings_store::*;
