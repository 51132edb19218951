use std::collections::HashMap;

use super::error::CatalogError;
use super::types::{Category, SatelliteStatus, Transmitter};

pub type TransmitterIndex = HashMap<u32, Vec<Transmitter>>;

/// Keep live records and group them by catalog number, preserving feed order.
pub fn parse_transmitters(body: &str) -> Result<TransmitterIndex, CatalogError> {
    let records: Vec<Transmitter> = serde_json::from_str(body)?;
    let mut index = TransmitterIndex::new();
    for record in records.into_iter().filter(|t| t.alive) {
        if let Some(norad_id) = record.norad_cat_id {
            index.entry(norad_id).or_default().push(record);
        }
    }
    Ok(index)
}

/// First transmitter with a downlink, else the first one.
pub fn primary(transmitters: &[Transmitter]) -> Option<&Transmitter> {
    transmitters
        .iter()
        .find(|t| t.downlink_low.is_some())
        .or_else(|| transmitters.first())
}

/// `145800000` -> `"145.800 MHz"`, `(145935000, 145995000)` -> `"145.935-145.995 MHz"`.
pub fn format_frequency(low: Option<u64>, high: Option<u64>) -> Option<String> {
    let mhz = |hz: u64| format!("{:.3}", hz as f64 / 1e6);
    match (low, high) {
        (Some(low), Some(high)) if high != low => Some(format!("{}-{} MHz", mhz(low), mhz(high))),
        (Some(low), _) => Some(format!("{} MHz", mhz(low))),
        _ => None,
    }
}

impl Transmitter {
    pub fn uplink(&self) -> Option<String> {
        format_frequency(self.uplink_low, self.uplink_high)
    }

    pub fn downlink(&self) -> Option<String> {
        format_frequency(self.downlink_low, self.downlink_high)
    }

    pub fn category(&self) -> Category {
        let Some(mode) = self.mode.as_deref() else {
            return Category::Other;
        };
        match mode.to_ascii_uppercase().as_str() {
            "FM" | "FMN" => Category::FmVoice,
            "SSB" | "USB" | "LSB" | "CW" => Category::Linear,
            "APT" | "LRPT" | "HRPT" => Category::Weather,
            m if ["BPSK", "QPSK", "GMSK", "FSK", "GFSK", "AFSK", "MSK", "LORA", "DUV", "AX.25"]
                .iter()
                .any(|d| m.starts_with(d)) =>
            {
                Category::Digital
            }
            _ => Category::Other,
        }
    }

    pub fn satellite_status(&self) -> SatelliteStatus {
        match self.status.as_deref() {
            Some("active") => SatelliteStatus::Active,
            Some("inactive") | Some("invalid") => SatelliteStatus::Inactive,
            _ => SatelliteStatus::Unknown,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const REGISTRY: &str = r#"[
        {"uuid": "a1", "description": "Mode V/U beacon", "alive": true, "type": "Transmitter",
         "uplink_low": null, "uplink_high": null, "downlink_low": 437800000, "downlink_high": null,
         "mode": "BPSK", "norad_cat_id": 25544, "status": "active", "baud": 1200},
        {"uuid": "a2", "description": "Dead packet", "alive": false,
         "uplink_low": null, "uplink_high": null, "downlink_low": 145825000, "downlink_high": null,
         "mode": "AFSK", "norad_cat_id": 25544, "status": "inactive"},
        {"uuid": "b1", "description": "Telemetry", "alive": true,
         "uplink_low": null, "uplink_high": null, "downlink_low": null, "downlink_high": null,
         "mode": "CW", "norad_cat_id": 40001, "status": "active"},
        {"uuid": "b2", "description": "Mode U/V FM", "alive": true,
         "uplink_low": 435300000, "uplink_high": null, "downlink_low": 145900000, "downlink_high": null,
         "mode": "FM", "norad_cat_id": 40001, "status": "active"},
        {"uuid": "c1", "description": "Orphan", "alive": true,
         "uplink_low": null, "uplink_high": null, "downlink_low": 2400000000, "downlink_high": null,
         "mode": "GMSK", "norad_cat_id": null, "status": "active"}
    ]"#;
}
