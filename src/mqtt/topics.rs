/// Topic layout for Home Assistant MQTT discovery.
#[derive(Debug, Clone)]
pub struct TopicScheme {
    prefix: String,
}

impl TopicScheme {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn sensor_config(&self, unique_id: &str) -> String {
        format!("{}/sensor/{unique_id}/config", self.prefix)
    }

    pub fn binary_sensor_config(&self, unique_id: &str) -> String {
        format!("{}/binary_sensor/{unique_id}/config", self.prefix)
    }

    /// JSON measurements.
    pub fn state(&self, name: &str) -> String {
        format!("{}/sensor/{name}/state", self.prefix)
    }

    /// Seconds since the last packet.
    pub fn age(&self, name: &str) -> String {
        format!("{}/sensor/{name}/last_packet_s", self.prefix)
    }

    /// `ON` / `OFF`.
    pub fn online(&self, name: &str) -> String {
        format!("{}/binary_sensor/{name}/online", self.prefix)
    }
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self::new("homeassistant")
    }
}
