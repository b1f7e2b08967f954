use foundation::math::GeoPoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One stop of the tour.
///
/// Change detection compares values (see [`Location::same_value`]), never
/// identity: providers may hand back freshly allocated but equal
/// locations on every poll. `PartialEq` is plain structural equality over
/// every field, including `id` and `contact`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        let name = name.into();
        let id = derive_location_id(&name, lat, lng);
        Self {
            id,
            name,
            lat,
            lng,
            contact: None,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    /// Value equality on `(name, lat, lng)`, coordinates compared in
    /// micro-degrees.
    pub fn same_value(&self, other: &Location) -> bool {
        self.name == other.name && self.point().fixed() == other.point().fixed()
    }

    /// Coordinate-only equality, used by lookups that ignore the name.
    pub fn same_point(&self, other: &Location) -> bool {
        self.point().fixed() == other.point().fixed()
    }

    /// Fills `id` from name and coordinates when the provider left it empty.
    pub fn ensure_id(&mut self) {
        if self.id.trim().is_empty() {
            self.id = derive_location_id(&self.name, self.lat, self.lng);
        }
    }
}

/// A port or other point of interest attached to a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterest {
    pub name: String,
    #[serde(default)]
    pub city: String,
    pub parent_location_id: String,
    pub lat: f64,
    pub lng: f64,
}

impl PointOfInterest {
    pub fn belongs_to(&self, location: &Location) -> bool {
        self.parent_location_id == location.id
    }
}

/// Everything a data provider supplies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourData {
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default, alias = "pois")]
    pub ports: Vec<PointOfInterest>,
}

impl TourData {
    pub fn new(locations: Vec<Location>, ports: Vec<PointOfInterest>) -> Self {
        let mut data = Self { locations, ports };
        data.normalize();
        data
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Derives missing ids and drops entries with non-finite coordinates.
    pub fn normalize(&mut self) {
        self.locations.retain(|l| l.point().is_finite());
        for location in &mut self.locations {
            location.ensure_id();
        }
        self.ports
            .retain(|p| GeoPoint::new(p.lat, p.lng).is_finite());
    }
}

/// Stable id built from a slug of the name and the rounded coordinates.
pub fn derive_location_id(name: &str, lat: f64, lng: f64) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("location");
    }
    format!("{slug}@{lat:.4},{lng:.4}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn derives_id_from_name_and_coords() {
        assert_eq!(
            derive_location_id("Port of Rotterdam ", 51.9225, 4.47917),
            "port-of-rotterdam@51.9225,4.4792"
        );
        assert_eq!(derive_location_id("!!", 0.0, 0.0), "location@0.0000,0.0000");
    }

    #[test]
    fn value_equality_ignores_id_and_allocation() {
        let a = Location::new("Lagos", 6.5244, 3.3792);
        let mut b = a.clone();
        b.id = "other".into();
        b.contact = Some(Contact::default());
        assert!(a.same_value(&b));
        assert_ne!(a, b);

        let renamed = Location::new("Lagos HQ", 6.5244, 3.3792);
        assert!(!a.same_value(&renamed));
        assert!(a.same_point(&renamed));
    }

    #[test]
    fn parses_provider_json_and_fills_ids() {
        let json = r#"{
            "locations": [
                { "name": "Mombasa", "lat": -4.0435, "lng": 39.6682 },
                { "id": "dxb", "name": "Dubai", "lat": 25.2048, "lng": 55.2708,
                  "contact": { "phone": "+971" } }
            ],
            "ports": [
                { "name": "Kilindini", "city": "Mombasa", "parentLocationId": "dxb",
                  "lat": -4.06, "lng": 39.65 }
            ]
        }"#;
        let mut data: TourData = serde_json::from_str(json).unwrap();
        data.normalize();

        assert_eq!(data.locations[0].id, "mombasa@-4.0435,39.6682");
        assert_eq!(data.locations[1].id, "dxb");
        assert_eq!(
            data.locations[1].contact.as_ref().and_then(|c| c.phone.as_deref()),
            Some("+971")
        );
        assert!(data.ports[0].belongs_to(&data.locations[1]));
        assert!(!data.ports[0].belongs_to(&data.locations[0]));
    }

    #[test]
    fn normalize_drops_non_finite_coordinates() {
        let data = TourData::new(
            vec![
                Location::new("ok", 1.0, 2.0),
                Location::new("bad", f64::NAN, 2.0),
            ],
            Vec::new(),
        );
        assert_eq!(data.locations.len(), 1);
    }
}
