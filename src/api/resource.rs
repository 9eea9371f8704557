//! Purpose: Managed-resource record parsed from a state resource entry.
//! Exports: `Resource`.
//! Role: Record collaborator for the resource walk; owns kind classification.
//! Invariants: The resource key is authoritative for type/name/counter.
//! Invariants: Only kinds in the compute table are reported as supported.

use std::collections::HashMap;

use crate::core::error::{Error, ErrorKind};
use crate::core::state::ResourceState;

// Provisionable compute kinds, each with its address attributes in
// preference order. An empty candidate list falls back to the primary id.
const COMPUTE_KINDS: &[(&str, &[&str])] = &[
    ("aws_instance", &["public_ip", "private_ip"]),
    ("azure_instance", &["vip_address", "ip_address"]),
    ("digitalocean_droplet", &["ipv4_address"]),
    ("exoscale_compute", &["ip_address"]),
    (
        "google_compute_instance",
        &[
            "network_interface.0.access_config.0.assigned_nat_ip",
            "network_interface.0.access_config.0.nat_ip",
            "network_interface.0.address",
        ],
    ),
    ("linode", &["ip_address"]),
    ("openstack_compute_instance_v2", &["access_ip_v4", "access_ip_v6"]),
    ("scaleway_server", &["public_ip", "private_ip"]),
    ("softlayer_virtual_guest", &["ipv4_address_private"]),
    ("triton_machine", &["primaryip"]),
    ("vsphere_virtual_machine", &["network_interface.0.ipv4_address"]),
];

fn address_candidates(resource_type: &str) -> Option<&'static [&'static str]> {
    COMPUTE_KINDS
        .iter()
        .find(|(kind, _)| *kind == resource_type)
        .map(|(_, candidates)| *candidates)
}

/// One resource from the state, re-keyed with the parsed pieces of its map
/// key. The state stores resources in a name-to-record map, but grouping
/// needs the name parts, so the record carries both.
#[derive(Clone, Debug)]
pub struct Resource {
    key: String,
    resource_type: String,
    base_name: String,
    counter: u32,
    state: ResourceState,
}

impl Resource {
    /// Parse `type.name` or `type.name.N` and wrap the state record. Keys
    /// with any other segment shape, or whose leading segment disagrees with
    /// the state's `type` tag, fail construction and get skipped upstream.
    pub fn new(key: &str, state: &ResourceState) -> Result<Self, Error> {
        let segments: Vec<&str> = key.split('.').collect();
        let (resource_type, base_name, counter) = match segments.as_slice() {
            [resource_type, base_name] => (*resource_type, *base_name, 0),
            [resource_type, base_name, counter] => {
                let counter = counter.parse::<u32>().map_err(|_| {
                    Error::new(ErrorKind::Corrupt)
                        .with_message(format!("resource key has non-numeric counter: {key}"))
                })?;
                (*resource_type, *base_name, counter)
            }
            _ => {
                return Err(Error::new(ErrorKind::Corrupt)
                    .with_message(format!("resource key is not type.name[.counter]: {key}")));
            }
        };

        if resource_type.is_empty() || base_name.is_empty() {
            return Err(Error::new(ErrorKind::Corrupt)
                .with_message(format!("resource key has empty segments: {key}")));
        }
        if !state.resource_type.is_empty() && state.resource_type != resource_type {
            return Err(Error::new(ErrorKind::Corrupt).with_message(format!(
                "resource key {key} disagrees with type tag {}",
                state.resource_type
            )));
        }

        Ok(Self {
            key: key.to_string(),
            resource_type: resource_type.to_string(),
            base_name: base_name.to_string(),
            counter,
            state: state.clone(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn primary_id(&self) -> &str {
        &self.state.primary.id
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.state.primary.attributes
    }

    pub fn name_attribute(&self) -> Option<&str> {
        self.state
            .primary
            .attributes
            .get("name")
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub fn is_supported(&self) -> bool {
        address_candidates(&self.resource_type).is_some()
    }

    /// Best reachable address: first non-empty candidate attribute for the
    /// kind, else the primary id. Empty when nothing is provisioned yet.
    pub fn address(&self) -> &str {
        if let Some(candidates) = address_candidates(&self.resource_type) {
            for candidate in candidates {
                if let Some(address) = self.state.primary.attributes.get(*candidate) {
                    if !address.is_empty() {
                        return address;
                    }
                }
            }
        }
        &self.state.primary.id
    }

    /// Inventory groups this resource belongs to: its kind, its bare name,
    /// and its counted name.
    pub fn group_names(&self) -> Vec<String> {
        vec![
            self.resource_type.clone(),
            self.base_name.clone(),
            format!("{}.{}", self.base_name, self.counter),
        ]
    }
}
