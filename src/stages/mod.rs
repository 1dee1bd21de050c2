//! Pipeline stages.
//!
//! Each stage is a self-contained run: read the store, do the work through
//! collaborators, write the store, return a report. Collaborator failures are
//! caught at the smallest enclosing unit (one idea for plan, one item for
//! render and publish) and never abort the batch or corrupt the store.

pub mod plan;
pub mod publish;
pub mod render;

pub use plan::{PlanReport, run_plan};
pub use publish::{PublishOutcome, publish_item, publish_ready, reject_item};
pub use render::{RenderReport, run_render};
