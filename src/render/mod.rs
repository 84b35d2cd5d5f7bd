mod escape;
mod wordml;

pub use escape::{escape_xml_attr, escape_xml_text};
pub use wordml::{render_run, render_run_props, render_runs, DEFAULT_RUN_OPEN};
