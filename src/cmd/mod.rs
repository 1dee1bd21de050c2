//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled              |
//! |------------|-------------------------------|
//! | `pipeline` | `Plan`, `Render`, `Publish`, `Reject` |
//! | `state`    | `Status`, `ResetState`        |
//! | `serve`    | `Serve`, `Auth`               |

pub mod pipeline;
pub mod serve;
pub mod state;

pub use pipeline::{cmd_plan, cmd_publish, cmd_reject, cmd_render};
pub use serve::{cmd_auth, cmd_serve};
pub use state::{cmd_reset_state, cmd_status};
