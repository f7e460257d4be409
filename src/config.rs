use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result, bail, ensure};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::device::AddressBook;
use crate::mqtt::{MqttSettings, TopicScheme};

/// Add-on options file.
#[derive(Debug, Clone, Deserialize)]
pub struct Options {
    pub mqtt_host: String,

    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,

    #[serde(default)]
    pub mqtt_user: Option<String>,

    #[serde(default)]
    pub mqtt_password: Option<String>,

    pub udp_port: u16,

    #[serde(default = "default_online_timeout_s")]
    pub online_timeout_s: u64,

    #[serde(default = "default_meta_publish_every_s")]
    pub meta_publish_every_s: u64,

    #[serde(default)]
    pub addr_to_name: IndexMap<IpAddr, String>,

    #[serde(default = "default_name")]
    pub default_name: String,

    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_online_timeout_s() -> u64 {
    10
}

fn default_meta_publish_every_s() -> u64 {
    2
}

fn default_name() -> String {
    "am7p".to_string()
}

fn default_discovery_prefix() -> String {
    "homeassistant".to_string()
}

impl Options {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read options file: {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("invalid options file: {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(raw).context("failed to parse options JSON")?;
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.mqtt_host.is_empty(), "mqtt_host must not be empty");
        ensure!(self.udp_port != 0, "udp_port must not be 0");
        ensure!(
            !self.discovery_prefix.is_empty(),
            "discovery_prefix must not be empty"
        );
        validate_device_name(&self.default_name).context("invalid default_name")?;
        for (addr, name) in &self.addr_to_name {
            validate_device_name(name)
                .with_context(|| format!("invalid device name for {addr}"))?;
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.meta_publish_every_s)
    }

    pub fn address_book(&self) -> AddressBook {
        AddressBook::new(self.addr_to_name.clone(), self.default_name.clone())
    }

    pub fn topic_scheme(&self) -> TopicScheme {
        TopicScheme::new(self.discovery_prefix.clone())
    }

    pub fn mqtt_settings(&self, client_id: &str) -> MqttSettings {
        MqttSettings {
            client_id: client_id.to_string(),
            host: self.mqtt_host.clone(),
            port: self.mqtt_port,
            user: self.mqtt_user.clone(),
            password: self.mqtt_password.clone(),
        }
    }
}

// Names are spliced into topics and unique ids.
fn validate_device_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("device name must not be empty");
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '/' | '+' | '#')) {
        bail!("device name {name:?} contains reserved MQTT character {c:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn applies_defaults() {
        let options = Options::from_json(
            r#"{
                "mqtt_host": "core-mosquitto",
                "mqtt_user": "addons",
                "mqtt_password": "secret",
                "udp_port": 12414
            }"#,
        )
        .unwrap();

        assert_eq!(options.mqtt_port, 1883);
        assert_eq!(options.online_timeout_s, 10);
        assert_eq!(options.meta_publish_every_s, 2);
        assert_eq!(options.sweep_interval(), Duration::from_secs(2));
        assert!(options.addr_to_name.is_empty());
        assert_eq!(options.default_name, "am7p");
        assert_eq!(options.discovery_prefix, "homeassistant");

        let mqtt = options.mqtt_settings("am7p-bridge");
        assert_eq!(mqtt.user.as_deref(), Some("addons"));
        assert_eq!(mqtt.password.as_deref(), Some("secret"));
    }

    #[test]
    fn parses_address_table_in_order() {
        let options = Options::from_json(
            r#"{
                "mqtt_host": "broker",
                "udp_port": 12414,
                "online_timeout_s": 30,
                "addr_to_name": {"192.168.1.50": "office", "192.168.1.20": "bedroom"}
            }"#,
        )
        .unwrap();

        assert_eq!(options.online_timeout_s, 30);
        let book = options.address_book();
        let names: Vec<&str> = book.iter().map(|(_, name)| name.as_str()).collect();
        assert_eq!(names, vec!["office", "bedroom"]);
        assert_eq!(book.resolve("192.168.1.20".parse().unwrap()), "bedroom");
        assert_eq!(book.resolve("192.168.1.99".parse().unwrap()), "am7p");
        assert_eq!(options.mqtt_settings("x").user, None);
    }

    #[test]
    fn rejects_invalid_options() {
        assert!(Options::from_json(r#"{"udp_port": 12414}"#).is_err());
        assert!(Options::from_json(r#"{"mqtt_host": "", "udp_port": 12414}"#).is_err());
        assert!(Options::from_json(r#"{"mqtt_host": "b", "udp_port": 0}"#).is_err());

        let bad_address = r#"{"mqtt_host": "b", "udp_port": 1, "addr_to_name": {"x": "y"}}"#;
        assert!(Options::from_json(bad_address).is_err());

        let bad_name = r#"{"mqtt_host": "b", "udp_port": 1, "addr_to_name": {"10.0.0.1": "a/b"}}"#;
        let err = Options::from_json(bad_name).unwrap_err();
        assert!(
            format!("{err:#}").contains("reserved MQTT character"),
            "{err:#}"
        );

        let bad_default = r##"{"mqtt_host": "b", "udp_port": 1, "default_name": "#"}"##;
        assert!(Options::from_json(bad_default).is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mqtt_host": "broker", "udp_port": 12414}}"#).unwrap();

        let options = Options::load(file.path()).unwrap();
        assert_eq!(options.udp_port, 12414);

        let missing = file.path().with_extension("missing");
        let err = Options::load(&missing).unwrap_err();
        assert!(err.to_string().contains("failed to read options file"));
    }
}
