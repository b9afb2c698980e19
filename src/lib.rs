pub mod config;
pub mod editor;
pub mod errors;
pub mod util;
