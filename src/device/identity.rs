use std::net::IpAddr;

use indexmap::IndexMap;

/// Static mapping from a sender's address to the device name it publishes under.
#[derive(Debug, Clone)]
pub struct AddressBook {
    names: IndexMap<IpAddr, String>,
    default_name: String,
}

impl AddressBook {
    pub fn new(names: IndexMap<IpAddr, String>, default_name: impl Into<String>) -> Self {
        Self {
            names,
            default_name: default_name.into(),
        }
    }

    /// Unknown senders all share the default name.
    pub fn resolve(&self, addr: IpAddr) -> &str {
        self.names
            .get(&addr)
            .map(String::as_str)
            .unwrap_or(&self.default_name)
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IpAddr, &String)> {
        self.names.iter()
    }
}
