use anyhow::{Result, bail};

use crate::am7p::Measurement;

/// Bytes preceding the measurement block. Nothing in this region is interpreted.
pub const HEADER_LEN: usize = 23;

/// Seven big-endian u16 values.
pub const PAYLOAD_LEN: usize = 14;

pub const MIN_PACKET_LEN: usize = HEADER_LEN + PAYLOAD_LEN;

// Temperature is sent in centidegrees shifted by +35.00 °C.
const TEMPERATURE_OFFSET: i32 = 3500;

/// Decodes an AM7P broadcast datagram.
///
/// Trailing bytes after the measurement block are ignored.
pub fn decode_packet(data: &[u8]) -> Result<Measurement> {
    if data.len() < MIN_PACKET_LEN {
        bail!(
            "AM7P packet too short: expected at least {MIN_PACKET_LEN} bytes, got {}",
            data.len()
        )
    }

    let payload = &data[HEADER_LEN..MIN_PACKET_LEN];
    let word = |i: usize| u16::from_be_bytes([payload[i * 2], payload[i * 2 + 1]]);

    Ok(Measurement {
        pm25: word(0),
        pm10: word(1),
        hcho: decode_centi(word(2)),
        tvoc: decode_centi(word(3)),
        co2: word(4),
        temperature: decode_temperature(word(5)),
        humidity: decode_centi(word(6)),
    })
}

fn decode_centi(v: u16) -> f64 {
    f64::from(v) / 100f64
}

fn decode_temperature(v: u16) -> f64 {
    f64::from(i32::from(v) - TEMPERATURE_OFFSET) / 100f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(words: [u16; 7], trailing: &[u8]) -> Vec<u8> {
        let mut data = vec![0xaa; HEADER_LEN];
        for w in words {
            data.extend_from_slice(&w.to_be_bytes());
        }
        data.extend_from_slice(trailing);
        data
    }

    #[test]
    fn decodes_reference_packet() {
        let data = packet([10, 20, 150, 250, 800, 3800, 6000], &[]);
        assert_eq!(data.len(), 37);

        let m = decode_packet(&data).unwrap();
        assert_eq!(
            m,
            Measurement {
                pm25: 10,
                pm10: 20,
                hcho: 1.5,
                tvoc: 2.5,
                co2: 800,
                temperature: 3.0,
                humidity: 60.0,
            }
        );
    }

    #[test]
    fn temperature_below_offset_is_negative() {
        let m = decode_packet(&packet([0, 0, 0, 0, 0, 2950, 0], &[])).unwrap();
        assert_eq!(m.temperature, -5.5);
    }

    #[test]
    fn extreme_words() {
        let m = decode_packet(&packet([u16::MAX; 7], &[])).unwrap();
        assert_eq!(m.pm25, u16::MAX);
        assert_eq!(m.co2, u16::MAX);
        assert_eq!(m.hcho, 655.35);
        assert_eq!(m.temperature, f64::from(65535 - 3500) / 100.0);

        let m = decode_packet(&packet([0; 7], &[])).unwrap();
        assert_eq!(m.temperature, -35.0);
        assert_eq!(m.humidity, 0.0);
    }

    #[test]
    fn header_bytes_are_not_interpreted() {
        let mut a = packet([1, 2, 3, 4, 5, 6, 7], &[]);
        let b = a.clone();
        a[..HEADER_LEN].fill(0x00);
        assert_eq!(decode_packet(&a).unwrap(), decode_packet(&b).unwrap());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let short = packet([10, 20, 150, 250, 800, 3800, 6000], &[]);
        let long = packet([10, 20, 150, 250, 800, 3800, 6000], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(
            decode_packet(&short).unwrap(),
            decode_packet(&long).unwrap()
        );
    }

    #[test]
    fn rejects_every_short_length() {
        let full = packet([10, 20, 150, 250, 800, 3800, 6000], &[]);
        for len in 0..MIN_PACKET_LEN {
            let err = decode_packet(&full[..len]).unwrap_err();
            assert!(err.to_string().contains("too short"), "{err}");
        }
    }
}
