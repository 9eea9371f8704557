//! Purpose: Build Ansible inventory views from extracted state records.
//! Exports: `Inventory`.
//! Role: CLI-side rendering; keeps `main.rs` focused on parse and dispatch.
//! Invariants: Groups and vars render in sorted order with deduped hosts.
//! Invariants: Building an inventory never mutates the extraction results.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value, json};
use tfinv::api::{Output, Resource};

pub(crate) struct Inventory {
    groups: BTreeMap<String, Vec<String>>,
    vars: BTreeMap<String, Value>,
    hostvars: BTreeMap<String, Value>,
}

impl Inventory {
    pub(crate) fn build(
        resources: &[Resource],
        outputs: &[Output],
        id_names: &HashMap<String, String>,
    ) -> Self {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        groups.insert("all".to_string(), Vec::new());
        let mut hostvars = BTreeMap::new();

        for resource in resources {
            let address = resource.address();
            if address.is_empty() {
                continue;
            }

            push_host(&mut groups, "all", address);
            for group in resource.group_names() {
                push_host(&mut groups, &group, address);
            }

            let mut vars = Map::new();
            for (key, value) in resource.attributes() {
                vars.insert(key.clone(), json!(value));
            }
            if let Some(name) = id_names.get(&resource.primary_id().to_lowercase()) {
                vars.insert("tfinv_name".to_string(), json!(name));
            }
            hostvars.insert(address.to_string(), Value::Object(vars));
        }

        let mut vars = BTreeMap::new();
        for output in outputs {
            vars.insert(output.name.clone(), output.value.clone());
        }

        Self {
            groups,
            vars,
            hostvars,
        }
    }

    /// Full dynamic-inventory document: one object per group, outputs as
    /// `all` vars, per-host attributes under `_meta.hostvars`.
    pub(crate) fn list_json(&self) -> Value {
        let mut root = Map::new();

        for (group, hosts) in &self.groups {
            let mut entry = Map::new();
            entry.insert("hosts".to_string(), json!(hosts));
            if group == "all" {
                entry.insert(
                    "vars".to_string(),
                    Value::Object(
                        self.vars
                            .iter()
                            .map(|(name, value)| (name.clone(), value.clone()))
                            .collect(),
                    ),
                );
            }
            root.insert(group.clone(), Value::Object(entry));
        }

        let mut meta = Map::new();
        meta.insert(
            "hostvars".to_string(),
            Value::Object(
                self.hostvars
                    .iter()
                    .map(|(host, vars)| (host.clone(), vars.clone()))
                    .collect(),
            ),
        );
        root.insert("_meta".to_string(), Value::Object(meta));

        Value::Object(root)
    }

    /// Hostvars for one address. Unknown hosts yield an empty object; the
    /// caller is Ansible asking about hosts it learned elsewhere, so an
    /// error would abort whole plays.
    pub(crate) fn host_json(&self, host: &str) -> Value {
        self.hostvars
            .get(host)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Static INI rendition: `[group]` sections in sorted order, then
    /// `[all:vars]` carrying the outputs.
    pub(crate) fn render_ini(&self) -> String {
        let mut sections = Vec::new();

        for (group, hosts) in &self.groups {
            let mut lines = vec![format!("[{group}]")];
            lines.extend(hosts.iter().cloned());
            sections.push(lines.join("\n"));
        }

        if !self.vars.is_empty() {
            let mut lines = vec!["[all:vars]".to_string()];
            for (name, value) in &self.vars {
                lines.push(format!("{name}={}", ini_value(value)));
            }
            sections.push(lines.join("\n"));
        }

        let mut text = sections.join("\n\n");
        text.push('\n');
        text
    }
}

fn push_host(groups: &mut BTreeMap<String, Vec<String>>, group: &str, address: &str) {
    let hosts = groups.entry(group.to_string()).or_default();
    if !hosts.iter().any(|existing| existing == address) {
        hosts.push(address.to_string());
    }
}

fn ini_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
