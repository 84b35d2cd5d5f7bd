//! Core data model shared by the parser, converter and renderer.

pub mod ast;
pub mod bibliography;

pub use ast::{FormatNode, NativeRun, RawProperty, RunContent, RunProps};
pub use bibliography::{Bibliographies, Bibliography, Citation};
