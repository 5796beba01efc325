pub mod config;
pub mod helpers;
pub mod kubernetes;
pub mod resources;
