pub mod import;
pub mod resources;
