//! Reader for the DoBIH "munrotab" CSV.
//!
//! Columns are located by header name, not position: the published table has
//! gained and lost classification-year columns between releases. Header
//! matching is case-insensitive and treats any run of whitespace (the height
//! header spans two lines) as a single space.

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::MunroError;
use crate::osgrid::grid_to_wgs84;
use crate::types::Munro;

/// Column holding the current (2021) classification code.
const CLASSIFICATION_COLUMN: &str = "2021";

fn normalize_header(h: &str) -> String {
    h.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Header lookup built once per file.
struct Columns {
    names: Vec<String>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Self {
            names: headers.iter().map(normalize_header).collect(),
        }
    }

    fn index(&self, name: &str) -> Option<usize> {
        let wanted = normalize_header(name);
        self.names.iter().position(|n| *n == wanted)
    }

    fn require(&self, name: &str) -> Result<usize, MunroError> {
        self.index(name)
            .ok_or_else(|| MunroError::MissingColumn(name.to_string()))
    }
}

/// Positions of every field the record type carries. Optional columns may be absent.
struct Layout {
    running_no: usize,
    name: usize,
    dobih_number: Option<usize>,
    smc_section: Option<usize>,
    rhb_section: Option<usize>,
    height_m: Option<usize>,
    height_ft: Option<usize>,
    map_1_50k: Option<usize>,
    map_1_25k: Option<usize>,
    grid_ref: Option<usize>,
    grid_ref_xy: Option<usize>,
    xcoord: Option<usize>,
    ycoord: Option<usize>,
    streetmap: Option<usize>,
    geograph: Option<usize>,
    hill_bagging: Option<usize>,
    comments: Option<usize>,
    classification: Option<usize>,
}

impl Layout {
    fn from_headers(headers: &StringRecord) -> Result<Self, MunroError> {
        let c = Columns::new(headers);
        Ok(Self {
            running_no: c.require("Running No")?,
            name: c.require("Name")?,
            dobih_number: c.index("DoBIH Number"),
            smc_section: c.index("SMC Section"),
            rhb_section: c.index("RHB Section"),
            height_m: c.index("Height (m)"),
            height_ft: c.index("Height (ft)"),
            map_1_50k: c.index("Map 1:50k"),
            map_1_25k: c.index("Map 1:25k"),
            grid_ref: c.index("Grid Ref"),
            grid_ref_xy: c.index("GridRefXY"),
            xcoord: c.index("xcoord"),
            ycoord: c.index("ycoord"),
            streetmap: c.index("Streetmap"),
            geograph: c.index("Geograph"),
            hill_bagging: c.index("Hill-bagging"),
            comments: c.index("Comments"),
            classification: c.index(CLASSIFICATION_COLUMN),
        })
    }
}

fn text(record: &StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| record.get(i))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn number<T: std::str::FromStr + Default>(record: &StringRecord, idx: Option<usize>) -> T {
    idx.and_then(|i| record.get(i))
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or_default()
}

/// Heights and grid offsets: anything non-finite or negative reads as 0.
fn measure(record: &StringRecord, idx: Option<usize>) -> f64 {
    let v: f64 = number(record, idx);
    if v.is_finite() && v >= 0.0 {
        v
    } else {
        0.0
    }
}

/// Map the table's classification code to the label the map shows.
pub fn classification_label(code: &str) -> &'static str {
    match code.trim().to_uppercase().as_str() {
        "MUN" => "Munro",
        "TOP" => "Top",
        _ => "Other",
    }
}

fn parse_record(record: &StringRecord, layout: &Layout) -> Option<Munro> {
    let running_no: u32 = record.get(layout.running_no)?.trim().parse().ok()?;

    let x_coord = measure(record, layout.xcoord);
    let y_coord = measure(record, layout.ycoord);
    let (latitude, longitude) = match grid_to_wgs84(x_coord, y_coord) {
        Some(p) => (p.lat, p.lng),
        None => (f64::NAN, f64::NAN),
    };

    Some(Munro {
        running_no,
        dobih_number: number(record, layout.dobih_number),
        name: text(record, Some(layout.name)),
        smc_section: text(record, layout.smc_section),
        rhb_section: text(record, layout.rhb_section),
        height_m: measure(record, layout.height_m),
        height_ft: number(record, layout.height_ft),
        map_1_50k: text(record, layout.map_1_50k),
        map_1_25k: text(record, layout.map_1_25k),
        grid_ref: text(record, layout.grid_ref),
        grid_ref_xy: text(record, layout.grid_ref_xy),
        x_coord,
        y_coord,
        latitude,
        longitude,
        classification: classification_label(&text(record, layout.classification)).to_string(),
        comments: text(record, layout.comments),
        streetmap_url: text(record, layout.streetmap),
        geograph_url: text(record, layout.geograph),
        hill_bagging_url: text(record, layout.hill_bagging),
    })
}

/// Parse the whole table. Rows without a numeric running number (footers,
/// blank lines) are skipped; everything else is kept, including rows whose
/// coordinates are missing.
pub fn parse(data: &[u8]) -> Result<Vec<Munro>, MunroError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(data);

    let layout = Layout::from_headers(reader.headers()?)?;

    let mut munros = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping unreadable row {}: {e}", line + 2);
                continue;
            }
        };
        match parse_record(&record, &layout) {
            Some(m) => munros.push(m),
            None => log::debug!("skipping row {} without running number", line + 2),
        }
    }

    log::info!(
        "parsed {} hills ({} without coordinates)",
        munros.len(),
        munros.iter().filter(|m| !m.has_valid_position()).count()
    );
    Ok(munros)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Running No,DoBIH Number,Name,SMC Section,RHB Section,Height (m),\"Height\n(ft)\",Map 1:50k,Map 1:25k,Grid Ref,GridRefXY,xcoord,ycoord,Streetmap,Geograph,Hill-bagging,Comments,2021\n\
1,1,Ben Nevis,04: Loch Linnhe to Loch Ericht,04A,1344.5,4411,41,392N,NN166712,NN1667371253,216666,771271,http://streetmap.example/1,http://geograph.example/1,http://hills.example/1,,MUN\n\
2,2,Carn Dearg SW Top,04: Loch Linnhe to Loch Ericht,04A,1020,3346,41,392N,NN155701,NN1557370190,215573,770190,,,,steep scramble,TOP\n\
3,3,Lost Hill,01: Loch Lomond to Loch Tay,01A,900,2953,50,,,,0,0,,,,,\n\
Total,,,,,,,,,,,,,,,,,\n";

    #[test]
    fn test_parse_sample() {
        let munros = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(munros.len(), 3);

        let nevis = &munros[0];
        assert_eq!(nevis.running_no, 1);
        assert_eq!(nevis.name, "Ben Nevis");
        assert_eq!(nevis.height_ft, 4411);
        assert!((nevis.height_m - 1344.5).abs() < 1e-9);
        assert_eq!(nevis.classification, "Munro");
        assert_eq!(nevis.comments, "");
        assert!(nevis.has_valid_position());
        assert_eq!(nevis.hill_bagging_url, "http://hills.example/1");

        assert_eq!(munros[1].classification, "Top");
        assert_eq!(munros[1].comments, "steep scramble");
    }

    #[test]
    fn test_missing_coordinates_kept_but_invalid() {
        let munros = parse(SAMPLE.as_bytes()).unwrap();
        let lost = &munros[2];
        assert_eq!(lost.classification, "Other");
        assert!(lost.latitude.is_nan());
        assert!(!lost.has_valid_position());
    }

    #[test]
    fn test_missing_required_column() {
        let err = parse(b"Name,Height (m)\nBen Nevis,1344\n").unwrap_err();
        assert!(matches!(err, MunroError::MissingColumn(ref c) if c == "Running No"));
    }

    #[test]
    fn test_header_matching_is_loose() {
        let data = b"running no ,NAME,height  (FT)\n5,Schiehallion,3553\n";
        let munros = parse(data).unwrap();
        assert_eq!(munros[0].height_ft, 3553);
        assert_eq!(munros[0].name, "Schiehallion");
    }

    #[test]
    fn test_non_finite_cells_read_as_zero() {
        let data = b"Running No,Name,Height (m),xcoord,ycoord\n\
1,Ben Nevis,NaN,216666,771271\n\
2,Odd,1000,nan,inf\n\
3,Sunk,-5,-216666,771271\n";
        let munros = parse(data).unwrap();
        assert_eq!(munros.len(), 3);
        assert_eq!(munros[0].height_m, 0.0);
        assert!(munros[0].has_valid_position());
        assert_eq!(munros[1].x_coord, 0.0);
        assert_eq!(munros[1].y_coord, 0.0);
        assert!(!munros[1].has_valid_position());
        assert_eq!(munros[2].height_m, 0.0);
        assert_eq!(munros[2].x_coord, 0.0);

        let json = serde_json::to_vec(&munros).unwrap();
        let decoded = crate::parse_json(&json).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].name, "Ben Nevis");
        assert_eq!(decoded[1].height_m, 1000.0);
    }

    #[test]
    fn test_classification_label() {
        assert_eq!(classification_label("MUN"), "Munro");
        assert_eq!(classification_label(" top "), "Top");
        assert_eq!(classification_label(""), "Other");
        assert_eq!(classification_label("DEL"), "Other");
    }
}
