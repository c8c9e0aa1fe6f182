//! Report renderers for the scan command

pub mod json;
pub mod sarif;
pub mod text;
