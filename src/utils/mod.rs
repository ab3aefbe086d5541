//! Output post-processing helpers.

pub mod minify;
