use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAIN_LAYER: &str = "main";
pub const HEIGHT_LAYER: &str = "height";
pub const DEFORM_LAYER: &str = "deform";
pub const CLOUD_LAYER_PREFIX: &str = "cloud-";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StarId(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyId(pub u32);

impl fmt::Display for StarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Commodity {
    pub name: String,
    /// Icon key, served from `/icons/{image}.png`.
    pub image: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResourceDeposit {
    pub commodity: Commodity,
    /// Tenths of a percent, typically 1..=1000.
    pub density: u32,
}

/// A star, planet or moon as served by the system API.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CelestialBody {
    pub id: BodyId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Orbital distance, km.
    pub distance: u64,
    /// Orbital period, seconds.
    pub period: u64,
    /// km.
    pub radius: u64,
    /// Seconds; zero when tidally locked or unknown.
    pub day_length: u64,
    pub atmosphere: String,
    /// Pascals.
    pub pressure: u64,
    /// Kelvin.
    pub temperature: i32,
    pub population: u64,
    pub government: String,
    pub law: i32,
    pub port: String,
    pub tech_level: u32,
    pub description: String,
    pub resources: Vec<ResourceDeposit>,
    pub moon_of: BodyId,
}

impl CelestialBody {
    pub fn is_moon(&self) -> bool {
        self.moon_of != BodyId(0)
    }

    pub fn is_inhabited(&self) -> bool {
        self.population > 0
    }
}

/// Raster layers a body exposes through the map endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapLayers {
    names: Vec<String>,
}

impl MapLayers {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn has_main(&self) -> bool {
        self.contains(MAIN_LAYER)
    }

    pub fn cloud_layers(&self) -> Vec<&str> {
        self.names
            .iter()
            .filter(|n| n.starts_with(CLOUD_LAYER_PREFIX))
            .map(String::as_str)
            .collect()
    }

    pub fn cloud_layer_count(&self) -> usize {
        self.cloud_layers().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_record_decodes_camel_case_fields() {
        let json = r#"{
            "id": 12, "name": "Tellus", "type": "EuGaian",
            "distance": 149600000, "period": 31557600, "radius": 6371,
            "dayLength": 86164, "atmosphere": "Standard", "pressure": 101325,
            "temperature": 288, "population": 7000000000, "government": "Corporation",
            "law": 3, "port": "A", "techLevel": 12, "description": "Blue.",
            "resources": [{"commodity": {"name": "Water", "image": "water"}, "density": 650}],
            "moonOf": 0
        }"#;
        let body: CelestialBody = serde_json::from_str(json).expect("decodes");

        assert_eq!(body.id, BodyId(12));
        assert_eq!(body.kind, "EuGaian");
        assert_eq!(body.day_length, 86_164);
        assert_eq!(body.tech_level, 12);
        assert_eq!(body.resources[0].commodity.image, "water");
        assert_eq!(body.resources[0].density, 650);
        assert!(!body.is_moon());
        assert!(body.is_inhabited());
    }

    #[test]
    fn abbreviated_record_fills_defaults() {
        let body: CelestialBody =
            serde_json::from_str(r#"{"id": 4, "name": "Luna", "moonOf": 3}"#).expect("decodes");

        assert_eq!(body.moon_of, BodyId(3));
        assert!(body.is_moon());
        assert!(!body.is_inhabited());
        assert!(body.resources.is_empty());
        assert_eq!(body.day_length, 0);
    }

    #[test]
    fn layer_set_reports_main_and_clouds() {
        let layers = MapLayers::new(
            ["main", "height", "deform", "cloud-0", "cloud-1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        assert!(layers.has_main());
        assert!(layers.contains(HEIGHT_LAYER));
        assert_eq!(layers.cloud_layer_count(), 2);
        assert_eq!(layers.cloud_layers(), vec!["cloud-0", "cloud-1"]);

        let bare = MapLayers::new(vec!["height".to_string()]);
        assert!(!bare.has_main());
        assert_eq!(bare.cloud_layer_count(), 0);
    }
}
