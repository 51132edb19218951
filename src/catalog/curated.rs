use super::types::Category;

/// Hand-maintained metadata that overrides anything derived from the registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuratedSatellite {
    pub norad_id: u32,
    pub slug: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub uplink: Option<&'static str>,
    pub downlink: Option<&'static str>,
    pub mode: Option<&'static str>,
    pub description: Option<&'static str>,
}

pub const CURATED: &[CuratedSatellite] = &[
    CuratedSatellite {
        norad_id: 25544,
        slug: "iss",
        name: "ISS",
        category: Category::FmVoice,
        uplink: Some("145.990 MHz"),
        downlink: Some("145.800 MHz"),
        mode: Some("FM (PL 67.0 Hz)"),
        description: Some("International Space Station crossband voice repeater and ARISS contacts"),
    },
    CuratedSatellite {
        norad_id: 27607,
        slug: "so-50",
        name: "SO-50",
        category: Category::FmVoice,
        uplink: Some("145.850 MHz"),
        downlink: Some("436.795 MHz"),
        mode: Some("FM (PL 67.0 Hz)"),
        description: Some("SaudiSat-1C FM repeater"),
    },
    CuratedSatellite {
        norad_id: 43017,
        slug: "ao-91",
        name: "AO-91",
        category: Category::FmVoice,
        uplink: Some("435.250 MHz"),
        downlink: Some("145.960 MHz"),
        mode: Some("FM (PL 67.0 Hz)"),
        description: Some("Fox-1B FM repeater, daylight passes only"),
    },
    CuratedSatellite {
        norad_id: 43678,
        slug: "po-101",
        name: "PO-101",
        category: Category::FmVoice,
        uplink: Some("437.500 MHz"),
        downlink: Some("145.900 MHz"),
        mode: Some("FM (PL 141.3 Hz)"),
        description: Some("Diwata-2 FM repeater, scheduled activations"),
    },
    CuratedSatellite {
        norad_id: 7530,
        slug: "ao-7",
        name: "AO-7",
        category: Category::Linear,
        uplink: Some("432.125-432.175 MHz"),
        downlink: Some("145.925-145.975 MHz"),
        mode: Some("SSB/CW"),
        description: Some("OSCAR 7 mode B linear transponder, works only in sunlight"),
    },
    CuratedSatellite {
        norad_id: 24278,
        slug: "fo-29",
        name: "FO-29",
        category: Category::Linear,
        uplink: Some("145.900-146.000 MHz"),
        downlink: Some("435.800-435.900 MHz"),
        mode: Some("SSB/CW"),
        description: Some("JAS-2 inverting linear transponder"),
    },
    CuratedSatellite {
        norad_id: 44909,
        slug: "rs-44",
        name: "RS-44",
        category: Category::Linear,
        uplink: Some("145.935-145.995 MHz"),
        downlink: Some("435.610-435.670 MHz"),
        mode: Some("SSB/CW"),
        description: Some("DOSAAF-85 inverting linear transponder with long high passes"),
    },
    CuratedSatellite {
        norad_id: 25338,
        slug: "noaa-15",
        name: "NOAA 15",
        category: Category::Weather,
        uplink: None,
        downlink: Some("137.620 MHz"),
        mode: Some("APT"),
        description: Some("Analog weather imagery"),
    },
    CuratedSatellite {
        norad_id: 33591,
        slug: "noaa-19",
        name: "NOAA 19",
        category: Category::Weather,
        uplink: None,
        downlink: Some("137.100 MHz"),
        mode: Some("APT"),
        description: Some("Analog weather imagery"),
    },
    CuratedSatellite {
        norad_id: 57166,
        slug: "meteor-m2-3",
        name: "Meteor-M2 3",
        category: Category::Weather,
        uplink: None,
        downlink: Some("137.900 MHz"),
        mode: Some("LRPT"),
        description: Some("Digital weather imagery"),
    },
];

/// Shown ahead of everything else, in this order.
pub const FEATURED: &[u32] = &[25544, 27607, 43017, 44909, 24278, 7530];

pub fn curated(norad_id: u32) -> Option<&'static CuratedSatellite> {
    CURATED.iter().find(|c| c.norad_id == norad_id)
}

pub fn featured_rank(norad_id: u32) -> Option<usize> {
    FEATURED.iter().position(|&id| id == norad_id)
}
