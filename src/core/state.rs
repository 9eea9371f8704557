//! Purpose: Decode Terraform state documents and walk them deterministically.
//! Exports: `State`, `ModuleState`, `ResourceState`, `InstanceState`, `OutputShape`, `WalkStats`.
//! Role: Parser core behind the API layer; isolates document-shape tolerance.
//! Invariants: The decoded tree is never mutated; every walker is read-only.
//! Invariants: Resource traversal uses sorted keys, never native map order.
//! Invariants: A failed entry skips that entry only, never the whole walk.

use std::collections::HashMap;
use std::io::Read;

use bstr::ByteSlice;
use serde::Deserialize;
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

/// Value emitted for an output whose raw shape is neither a string nor an
/// object carrying a `value` field. Stays visible in rendered inventories
/// rather than dropping the entry.
pub const OUTPUT_ERROR_VALUE: &str = "<error>";

#[derive(Debug, Default, Deserialize)]
pub struct State {
    pub modules: Vec<ModuleState>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModuleState {
    #[serde(default)]
    pub resources: HashMap<String, ResourceState>,
    #[serde(default)]
    pub outputs: HashMap<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResourceState {
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub primary: InstanceState,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InstanceState {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// Raw output value classified once at the decode boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum OutputShape {
    Plain(String),
    Wrapped(Value),
    Other,
}

pub fn classify_output(raw: &Value) -> OutputShape {
    match raw {
        Value::String(text) => OutputShape::Plain(text.clone()),
        // Terraform wraps typed outputs as {"value": ..., ...}; a wrapper
        // without the field degrades to null rather than failing.
        Value::Object(fields) => {
            OutputShape::Wrapped(fields.get("value").cloned().unwrap_or(Value::Null))
        }
        _ => OutputShape::Other,
    }
}

/// Walk counters returned alongside extraction results. `visited` counts
/// every entry seen; entries that are neither kept nor skipped were
/// well-formed but classified as unsupported.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WalkStats {
    pub visited: u64,
    pub kept: u64,
    pub skipped: u64,
}

impl State {
    /// Buffer the whole stream, drop any bytes before the first `{`, and
    /// decode. Some invocation paths prefix the JSON payload with an
    /// out-of-band marker (`o:` and friends); the strip keeps the decoder
    /// whole-document. Without any `{` the buffer passes through unchanged
    /// and decoding reports the malformed payload.
    pub fn read<R: Read>(mut reader: R) -> Result<Self, Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read state document")
                .with_source(err)
        })?;

        let start = buf.find_byte(b'{').unwrap_or(0);
        serde_json::from_slice(&buf[start..]).map_err(|err| {
            Error::new(ErrorKind::Corrupt)
                .with_message("state document is not a valid terraform state")
                .with_source(err)
        })
    }

    /// Visit every output of every module, normalize the raw value, and hand
    /// `(name, value)` to `build`. Build failures drop the entry and report
    /// it through `on_skip`; the walk always completes.
    pub fn outputs_with<T, F, N>(&self, mut build: F, mut on_skip: N) -> (Vec<T>, WalkStats)
    where
        F: FnMut(&str, Value) -> Result<T, Error>,
        N: FnMut(&str, &Error),
    {
        let mut records = Vec::new();
        let mut stats = WalkStats::default();

        for module in &self.modules {
            for (name, raw) in &module.outputs {
                stats.visited += 1;
                let value = match classify_output(raw) {
                    OutputShape::Plain(text) => Value::String(text),
                    OutputShape::Wrapped(inner) => inner,
                    OutputShape::Other => Value::String(OUTPUT_ERROR_VALUE.to_string()),
                };
                match build(name, value) {
                    Ok(record) => {
                        stats.kept += 1;
                        records.push(record);
                    }
                    Err(err) => {
                        stats.skipped += 1;
                        on_skip(name, &err);
                    }
                }
            }
        }

        (records, stats)
    }

    /// Visit every resource of every module in sorted key order, hand
    /// `(key, state)` to `build`, and keep records `supported` accepts.
    /// Build failures drop the entry and report it through `on_skip`.
    pub fn resources_with<T, F, S, N>(
        &self,
        mut build: F,
        supported: S,
        mut on_skip: N,
    ) -> (Vec<T>, WalkStats)
    where
        F: FnMut(&str, &ResourceState) -> Result<T, Error>,
        S: Fn(&T) -> bool,
        N: FnMut(&str, &Error),
    {
        let mut records = Vec::new();
        let mut stats = WalkStats::default();

        for module in &self.modules {
            for key in module.resource_keys() {
                stats.visited += 1;
                match build(key, &module.resources[key]) {
                    Ok(record) => {
                        if supported(&record) {
                            stats.kept += 1;
                            records.push(record);
                        }
                    }
                    Err(err) => {
                        stats.skipped += 1;
                        on_skip(key, &err);
                    }
                }
            }
        }

        (records, stats)
    }

    /// Map lower-cased primary ids to the `name` attribute, for resources
    /// carrying both. Traversal uses sorted keys so duplicate normalized ids
    /// resolve last-write-wins identically on every run.
    pub fn resource_id_names(&self) -> HashMap<String, String> {
        let mut names = HashMap::new();

        for module in &self.modules {
            for key in module.resource_keys() {
                let primary = &module.resources[key].primary;
                let name = primary.attributes.get("name").map(String::as_str).unwrap_or("");
                if primary.id.is_empty() || name.is_empty() {
                    continue;
                }
                names.insert(primary.id.to_lowercase(), name.to_string());
            }
        }

        names
    }
}

impl ModuleState {
    /// Resource keys in ascending lexicographic order. The underlying map
    /// iterates in unspecified order; every externally observable traversal
    /// goes through this instead.
    pub fn resource_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
