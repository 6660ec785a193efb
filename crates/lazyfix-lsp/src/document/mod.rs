//! Open documents and the snapshots built from them.

pub mod state;
pub mod sync;

pub use state::{ServerState, WORKSPACE_PROJECT};
pub use sync::apply_content_changes;
