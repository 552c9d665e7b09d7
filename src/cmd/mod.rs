/*!
Command modules.

  src/cmd/
    mod.rs     (this file)
    query.rs   (FocusQuery + MatchMode + escaping)
    focus.rs   (FocusArgs + execute_focus)

Conventions:
  - The command exposes one public `execute_*` function returning
    `anyhow::Result<()>`.
  - Argument structs derive `clap::Args` and are kept minimal.
*/

pub mod focus;
pub mod query;

pub use focus::{FocusArgs, execute_focus};
