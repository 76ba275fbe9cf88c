pub mod config;
pub mod coverage;
pub mod info;
pub mod pipeline;
pub mod scenes;
pub mod select;
