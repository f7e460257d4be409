use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::mqtt::TopicScheme;

#[derive(Debug, Clone, Copy)]
pub struct SensorChannel {
    /// Field name in the state JSON; also the unique_id suffix.
    pub key: &'static str,
    pub name: &'static str,
    pub device_class: &'static str,
    pub unit: &'static str,
}

pub const SENSOR_CHANNELS: [SensorChannel; 7] = [
    SensorChannel {
        key: "pm25",
        name: "PM2.5",
        device_class: "pm25",
        unit: "µg/m³",
    },
    SensorChannel {
        key: "pm10",
        name: "PM10",
        device_class: "pm10",
        unit: "µg/m³",
    },
    SensorChannel {
        key: "hcho",
        name: "HCHO",
        device_class: "volatile_organic_compounds",
        unit: "mg/m³",
    },
    SensorChannel {
        key: "tvoc",
        name: "TVOC",
        device_class: "volatile_organic_compounds",
        unit: "mg/m³",
    },
    SensorChannel {
        key: "co2",
        name: "CO2",
        device_class: "carbon_dioxide",
        unit: "ppm",
    },
    SensorChannel {
        key: "temperature",
        name: "Temperature",
        device_class: "temperature",
        unit: "°C",
    },
    SensorChannel {
        key: "humidity",
        name: "Humidity",
        device_class: "humidity",
        unit: "%",
    },
];

pub const PAYLOAD_ON: &str = "ON";
pub const PAYLOAD_OFF: &str = "OFF";

/// A retained config message announcing one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryMessage {
    pub topic: String,
    pub payload: String,
}

#[derive(Debug, Serialize)]
struct DeviceBlock<'a> {
    identifiers: [String; 1],
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct SensorConfig<'a> {
    name: &'a str,
    unique_id: &'a str,
    device_class: &'a str,
    unit_of_measurement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_template: Option<String>,
    state_topic: String,
    device: &'a DeviceBlock<'a>,
}

#[derive(Debug, Serialize)]
struct BinarySensorConfig<'a> {
    name: &'a str,
    unique_id: &'a str,
    device_class: &'a str,
    state_topic: String,
    payload_on: &'a str,
    payload_off: &'a str,
    device: &'a DeviceBlock<'a>,
}

/// Builds every discovery config for one device: the measurement channels,
/// the online flag and the seconds-since-last-packet sensor.
pub fn discovery_messages(topics: &TopicScheme, name: &str) -> Result<Vec<DiscoveryMessage>> {
    let device = DeviceBlock {
        identifiers: [format!("airmaster_{name}")],
        name,
    };

    let mut messages = Vec::with_capacity(SENSOR_CHANNELS.len() + 2);

    for channel in SENSOR_CHANNELS {
        let unique_id = format!("{name}_{}", channel.key);
        let config = SensorConfig {
            name: channel.name,
            unique_id: &unique_id,
            device_class: channel.device_class,
            unit_of_measurement: channel.unit,
            value_template: Some(format!("{{{{ value_json.{} }}}}", channel.key)),
            state_topic: topics.state(name),
            device: &device,
        };
        messages.push(DiscoveryMessage {
            topic: topics.sensor_config(&unique_id),
            payload: serde_json::to_string(&config)
                .with_context(|| format!("failed to serialize {unique_id} config"))?,
        });
    }

    let unique_id = format!("{name}_online");
    let config = BinarySensorConfig {
        name: "Online",
        unique_id: &unique_id,
        device_class: "connectivity",
        state_topic: topics.online(name),
        payload_on: PAYLOAD_ON,
        payload_off: PAYLOAD_OFF,
        device: &device,
    };
    messages.push(DiscoveryMessage {
        topic: topics.binary_sensor_config(&unique_id),
        payload: serde_json::to_string(&config)
            .with_context(|| format!("failed to serialize {unique_id} config"))?,
    });

    let unique_id = format!("{name}_last_packet_s");
    let config = SensorConfig {
        name: "Seconds since last packet",
        unique_id: &unique_id,
        device_class: "duration",
        unit_of_measurement: "s",
        value_template: None,
        state_topic: topics.age(name),
        device: &device,
    };
    messages.push(DiscoveryMessage {
        topic: topics.sensor_config(&unique_id),
        payload: serde_json::to_string(&config)
            .with_context(|| format!("failed to serialize {unique_id} config"))?,
    });

    Ok(messages)
}
