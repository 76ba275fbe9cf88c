pub mod compute;
pub mod consts;
pub mod coverage;
pub mod error;
pub mod grid;
pub mod io;
pub mod mask;
pub mod pipeline;
pub mod scene;
pub mod select;
pub mod stack;
