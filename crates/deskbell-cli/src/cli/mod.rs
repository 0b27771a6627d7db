pub mod commands;
pub mod render;

pub use commands::{build_sound, execute, resolve_config, run, watch, CliCommand};
pub use render::{render_record, render_snapshot, to_json, OutputFormat};
