use std::collections::HashMap;

use serde::Serialize;

use crate::location::{Location, PointOfInterest};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Top,
    Bottom,
    Left,
    Right,
}

impl Orientation {
    /// Next slot around a cell, or `None` once all four are taken.
    fn next_free(self) -> Option<Orientation> {
        match self {
            Orientation::Bottom => Some(Orientation::Top),
            Orientation::Top => Some(Orientation::Right),
            Orientation::Right => Some(Orientation::Left),
            Orientation::Left => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub lat: f64,
    pub lng: f64,
    pub text: String,
    pub size: f64,
    pub dot_radius: f64,
    pub orientation: Orientation,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelStyle {
    pub size: f64,
    pub dot_radius: f64,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            size: 1.0,
            dot_radius: 0.4,
        }
    }
}

/// Builds the candidate labels for the points of interest of `location`.
///
/// Output follows the order of `ports`.
pub fn labels_for(location: &Location, ports: &[PointOfInterest], style: LabelStyle) -> Vec<Label> {
    ports
        .iter()
        .filter(|p| p.belongs_to(location))
        .filter_map(|p| {
            let text = label_text(p)?;
            Some(Label {
                lat: p.lat,
                lng: p.lng,
                text,
                size: style.size,
                dot_radius: style.dot_radius,
                orientation: Orientation::Bottom,
            })
        })
        .collect()
}

fn label_text(port: &PointOfInterest) -> Option<String> {
    let name = port.name.trim();
    let city = port.city.trim();
    if name.is_empty() {
        return (!city.is_empty()).then(|| city.to_string());
    }
    if city.is_empty() || city.eq_ignore_ascii_case(name) {
        return Some(name.to_string());
    }
    Some(format!("{name}, {city}"))
}

pub const DEFAULT_CELL_SIZE_DEG: f64 = 5.0;
pub const DEFAULT_MAX_NUDGES: u32 = 32;

/// Fraction of a cell a fully surrounded label moves north.
const NUDGE_FRACTION: f64 = 0.2;

/// Grid-based label declutter.
///
/// Each collision cell offers four orientations around its anchor. Labels
/// claim them in input order (`bottom`, `top`, `right`, `left`); a label that
/// finds all four taken moves north and tries again. This is best effort: a
/// dense cluster can still overlap once the nudge budget runs out.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelCollisionResolver {
    pub cell_size_deg: f64,
    pub max_nudges: u32,
}

impl Default for LabelCollisionResolver {
    fn default() -> Self {
        Self {
            cell_size_deg: DEFAULT_CELL_SIZE_DEG,
            max_nudges: DEFAULT_MAX_NUDGES,
        }
    }
}

impl LabelCollisionResolver {
    pub fn new(cell_size_deg: f64, max_nudges: u32) -> Self {
        Self {
            cell_size_deg,
            max_nudges,
        }
    }

    pub fn grid_key(&self, lat: f64, lng: f64) -> (i64, i64) {
        grid_key(lat, lng, self.cell_size_deg)
    }

    /// Returns adjusted copies of `labels`; inputs are left untouched.
    pub fn resolve(&self, labels: &[Label]) -> Vec<Label> {
        let mut occupied: HashMap<(i64, i64), Orientation> = HashMap::new();
        labels
            .iter()
            .map(|label| self.place(label, &mut occupied))
            .collect()
    }

    fn place(&self, label: &Label, occupied: &mut HashMap<(i64, i64), Orientation>) -> Label {
        let mut out = label.clone();
        let mut nudges = 0u32;

        loop {
            let key = self.grid_key(out.lat, out.lng);
            let orientation = match occupied.get(&key) {
                None => Some(Orientation::Bottom),
                Some(taken) => taken.next_free(),
            };

            if let Some(orientation) = orientation {
                out.orientation = orientation;
                occupied.insert(key, orientation);
                return out;
            }

            if nudges >= self.max_nudges {
                // Out of budget: keep the last position without claiming.
                out.orientation = Orientation::Bottom;
                return out;
            }
            nudges += 1;
            out.lat = (out.lat + NUDGE_FRACTION * self.cell_size_deg).min(90.0);
        }
    }
}

pub fn grid_key(lat: f64, lng: f64, cell_size_deg: f64) -> (i64, i64) {
    let cell = if cell_size_deg > 0.0 {
        cell_size_deg
    } else {
        DEFAULT_CELL_SIZE_DEG
    };
    ((lat / cell).floor() as i64, (lng / cell).floor() as i64)
}
