pub mod browser;
pub mod config;
pub mod error;
pub mod filter;
pub mod marker;
pub mod osgrid;
#[cfg(feature = "extract")]
pub mod parsers;
pub mod popup;
pub mod projection;
pub mod tiles;
pub mod types;
pub mod viewport;

use error::MunroError;
#[cfg(feature = "extract")]
use std::path::Path;
use types::Munro;

/// Read and parse a munrotab CSV file.
#[cfg(feature = "extract")]
pub fn load_csv(path: &Path) -> Result<Vec<Munro>, MunroError> {
    let data = std::fs::read(path)?;
    parse_csv(&data)
}

/// Parse munrotab CSV bytes.
#[cfg(feature = "extract")]
pub fn parse_csv(data: &[u8]) -> Result<Vec<Munro>, MunroError> {
    parsers::munrotab::parse(data)
}

/// Decode a JSON array of records, as served by the API.
pub fn parse_json(data: &[u8]) -> Result<Vec<Munro>, MunroError> {
    Ok(serde_json::from_slice(data)?)
}

/// Look up a record by running number.
pub fn find(munros: &[Munro], running_no: u32) -> Result<&Munro, MunroError> {
    munros
        .iter()
        .find(|m| m.running_no == running_no)
        .ok_or(MunroError::NotFound(running_no))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_tolerates_null_coordinates() {
        let json = br#"[
            {"running_no": 1, "name": "Ben Nevis", "latitude": 56.796891, "longitude": -5.003675},
            {"running_no": 2, "name": "Lost Hill", "latitude": null, "longitude": null}
        ]"#;
        let munros = parse_json(json).unwrap();
        assert_eq!(munros.len(), 2);
        assert!(munros[0].has_valid_position());
        assert!(!munros[1].has_valid_position());
        assert_eq!(munros[1].height_ft, 0);
    }

    #[test]
    fn test_json_writes_null_for_missing_coordinates() {
        let m = Munro {
            running_no: 7,
            ..Munro::default()
        };
        let v = serde_json::to_value(&m).unwrap();
        assert!(v["latitude"].is_null());
        let back: Munro = serde_json::from_value(v).unwrap();
        assert!(back.latitude.is_nan());
    }

    #[test]
    fn test_find() {
        let munros = vec![
            Munro {
                running_no: 3,
                name: "Schiehallion".into(),
                ..Munro::default()
            },
        ];
        assert_eq!(find(&munros, 3).unwrap().name, "Schiehallion");
        assert!(matches!(find(&munros, 4), Err(MunroError::NotFound(4))));
    }
}
