//! The `nubes` command-line tool.
//!
//! ```text
//! nubes routes --manifest controllers.yaml [--config app.yaml]
//! nubes check  --manifest controllers.yaml
//! ```
//!
//! `check` exits non-zero on the first configuration error. Parameter kinds
//! and processor annotations that only the application registers can be
//! declared with `--kind` and `--annotation`.

mod commands;


pub use commands::{apply_log_overrides, plan_manifest, run, run_cli, Cli, Commands};
