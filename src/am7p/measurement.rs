use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    /// µg/m³
    pub pm25: u16,

    /// µg/m³
    pub pm10: u16,

    /// mg/m³
    pub hcho: f64,

    /// mg/m³
    pub tvoc: f64,

    /// ppm
    pub co2: u16,

    /// °C
    pub temperature: f64,

    /// %
    pub humidity: f64,
}
