use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Round a float to N decimal places.
pub fn round_f64(v: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (v * factor).round() / factor
}

/// Coordinates round to 6 places (~0.1 m) on the wire. NaN goes out as `null`.
fn serialize_coord<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    if v.is_finite() {
        s.serialize_some(&round_f64(*v, 6))
    } else {
        s.serialize_none()
    }
}

/// `null` or a missing field reads back as NaN so the record survives decoding
/// and is only dropped from rendering.
fn deserialize_coord<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
}

/// Heights and grid offsets read `null` as zero, matching an empty CSV cell.
fn deserialize_measure<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or_default())
}

fn nan() -> f64 {
    f64::NAN
}

// ─── Summit record ───────────────────────────────────────────────────

/// One row of the hill table. Identity is `running_no`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Munro {
    pub running_no: u32,
    #[serde(default)]
    pub dobih_number: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub smc_section: String,
    #[serde(default)]
    pub rhb_section: String,
    #[serde(default, deserialize_with = "deserialize_measure")]
    pub height_m: f64,
    #[serde(default)]
    pub height_ft: u32,
    #[serde(default)]
    pub map_1_50k: String,
    #[serde(default)]
    pub map_1_25k: String,
    #[serde(default)]
    pub grid_ref: String,
    #[serde(default)]
    pub grid_ref_xy: String,
    #[serde(default, deserialize_with = "deserialize_measure")]
    pub x_coord: f64,
    #[serde(default, deserialize_with = "deserialize_measure")]
    pub y_coord: f64,
    #[serde(
        default = "nan",
        serialize_with = "serialize_coord",
        deserialize_with = "deserialize_coord"
    )]
    pub latitude: f64,
    #[serde(
        default = "nan",
        serialize_with = "serialize_coord",
        deserialize_with = "deserialize_coord"
    )]
    pub longitude: f64,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub streetmap_url: String,
    #[serde(default)]
    pub geograph_url: String,
    #[serde(default)]
    pub hill_bagging_url: String,
}

impl Munro {
    /// Position of the summit, or `None` when either coordinate is missing,
    /// NaN, or outside the WGS84 range.
    pub fn position(&self) -> Option<LatLng> {
        let p = LatLng::new(self.latitude, self.longitude);
        p.is_valid().then_some(p)
    }

    pub fn has_valid_position(&self) -> bool {
        self.position().is_some()
    }
}

impl Default for Munro {
    fn default() -> Self {
        Self {
            running_no: 0,
            dobih_number: 0,
            name: String::new(),
            smc_section: String::new(),
            rhb_section: String::new(),
            height_m: 0.0,
            height_ft: 0,
            map_1_50k: String::new(),
            map_1_25k: String::new(),
            grid_ref: String::new(),
            grid_ref_xy: String::new(),
            x_coord: 0.0,
            y_coord: 0.0,
            latitude: f64::NAN,
            longitude: f64::NAN,
            classification: String::new(),
            comments: String::new(),
            streetmap_url: String::new(),
            geograph_url: String::new(),
            hill_bagging_url: String::new(),
        }
    }
}

// ─── Geographic primitives ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Axis-aligned lat/long rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south: south_west.lat,
            west: south_west.lng,
            north: north_east.lat,
            east: north_east.lng,
        }
    }

    pub fn empty() -> Self {
        Self {
            south: f64::INFINITY,
            west: f64::INFINITY,
            north: f64::NEG_INFINITY,
            east: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.south > self.north || self.west > self.east
    }

    pub fn expand_point(&mut self, p: LatLng) {
        self.south = self.south.min(p.lat);
        self.west = self.west.min(p.lng);
        self.north = self.north.max(p.lat);
        self.east = self.east.max(p.lng);
    }

    pub fn south_west(&self) -> LatLng {
        LatLng::new(self.south, self.west)
    }

    pub fn north_east(&self) -> LatLng {
        LatLng::new(self.north, self.east)
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Closed containment.
    pub fn contains(&self, p: LatLng) -> bool {
        self.south <= p.lat && p.lat <= self.north && self.west <= p.lng && p.lng <= self.east
    }

    /// Open containment: the point is not on the edge.
    pub fn strictly_contains(&self, p: LatLng) -> bool {
        self.south < p.lat && p.lat < self.north && self.west < p.lng && p.lng < self.east
    }

    pub fn contains_bounds(&self, other: &LatLngBounds) -> bool {
        self.contains(other.south_west()) && self.contains(other.north_east())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_coordinates_decode_as_nan() {
        let m: Munro =
            serde_json::from_str(r#"{"running_no": 7, "name": "Ben Macdui"}"#).unwrap();
        assert_eq!(m.running_no, 7);
        assert!(m.latitude.is_nan());
        assert!(m.position().is_none());
        assert_eq!(m.comments, "");
    }

    #[test]
    fn test_nan_serializes_as_null() {
        let m = Munro {
            running_no: 1,
            ..Munro::default()
        };
        let v = serde_json::to_value(&m).unwrap();
        assert!(v["latitude"].is_null());
        let back: Munro = serde_json::from_value(v).unwrap();
        assert!(back.longitude.is_nan());
    }

    #[test]
    fn test_null_measures_decode_as_zero() {
        let m: Munro = serde_json::from_str(
            r#"{"running_no": 2, "height_m": null, "x_coord": null, "y_coord": null}"#,
        )
        .unwrap();
        assert_eq!(m.height_m, 0.0);
        assert_eq!(m.x_coord, 0.0);
        assert_eq!(m.y_coord, 0.0);
    }

    #[test]
    fn test_coordinates_rounded_on_wire() {
        let m = Munro {
            running_no: 1,
            latitude: 56.796_851_234_5,
            longitude: -5.003_535_987,
            ..Munro::default()
        };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["latitude"].as_f64(), Some(56.796851));
        assert_eq!(v["longitude"].as_f64(), Some(-5.003536));
    }

    #[test]
    fn test_out_of_range_position_is_invalid() {
        let m = Munro {
            latitude: 91.0,
            longitude: 0.0,
            ..Munro::default()
        };
        assert!(!m.has_valid_position());
    }

    #[test]
    fn test_bounds_expand() {
        let mut b = LatLngBounds::empty();
        assert!(b.is_empty());
        b.expand_point(LatLng::new(56.0, -5.0));
        b.expand_point(LatLng::new(57.0, -4.0));
        assert!(!b.is_empty());
        assert_eq!(b.south_west(), LatLng::new(56.0, -5.0));
        assert_eq!(b.north_east(), LatLng::new(57.0, -4.0));
        assert!(b.contains(LatLng::new(56.0, -4.5)));
        assert!(!b.strictly_contains(LatLng::new(56.0, -4.5)));
    }
}
