//! Purpose: Define the stable public Rust API boundary for tfinv.
//! Exports: State model, record types, and extraction entry points.
//! Role: Public, additive-only surface; hides internal traversal plumbing.
//! Invariants: This module is the only public path to extraction primitives.
//! Invariants: Entry points never fail on a single bad entry; skips are counted.

mod output;
mod resource;

use std::collections::HashMap;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::state::{
    InstanceState, ModuleState, OutputShape, ResourceState, State, WalkStats, OUTPUT_ERROR_VALUE,
};
pub use output::Output;
pub use resource::Resource;

/// Extract every output record. Entries the builder rejects are dropped,
/// logged at debug level, and counted in the returned stats.
pub fn outputs(state: &State) -> (Vec<Output>, WalkStats) {
    state.outputs_with(
        |name, value| Output::new(name, value),
        |name, err| {
            tracing::debug!(output = name, error = %err, "skipped output entry");
        },
    )
}

/// Extract every supported resource record in deterministic order. Entries
/// the builder rejects are dropped, logged at debug level, and counted.
pub fn resources(state: &State) -> (Vec<Resource>, WalkStats) {
    state.resources_with(
        Resource::new,
        Resource::is_supported,
        |key, err| {
            tracing::debug!(resource = key, error = %err, "skipped resource entry");
        },
    )
}

/// Lookup from lower-cased primary id to `name` attribute.
pub fn resource_id_names(state: &State) -> HashMap<String, String> {
    state.resource_id_names()
}
