//! Ordnance Survey National Grid → WGS84 latitude/longitude.
//!
//! The hill table carries OSGB36 eastings/northings. Projection inverse
//! follows the OS transverse Mercator series on the Airy 1830 ellipsoid,
//! then a seven-parameter Helmert shift moves the result onto WGS84 so the
//! summits line up with web map tiles (accuracy ~5 m).

use std::f64::consts::PI;

use crate::types::LatLng;

struct Ellipsoid {
    a: f64,
    b: f64,
}

impl Ellipsoid {
    fn e2(&self) -> f64 {
        (self.a * self.a - self.b * self.b) / (self.a * self.a)
    }
}

const AIRY_1830: Ellipsoid = Ellipsoid {
    a: 6_377_563.396,
    b: 6_356_256.909,
};

const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    b: 6_356_752.314_245,
};

// National Grid true origin
const F0: f64 = 0.999_601_271_7;
const PHI0_DEG: f64 = 49.0;
const LAMBDA0_DEG: f64 = -2.0;
const E0: f64 = 400_000.0;
const N0: f64 = -100_000.0;

// OSGB36 → WGS84 Helmert parameters (metres, ppm, arc-seconds)
const TX: f64 = 446.448;
const TY: f64 = -125.157;
const TZ: f64 = 542.060;
const S_PPM: f64 = -20.4894;
const RX_SEC: f64 = 0.1502;
const RY_SEC: f64 = 0.2470;
const RZ_SEC: f64 = 0.8421;

fn deg2rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

fn rad2deg(rad: f64) -> f64 {
    rad * 180.0 / PI
}

fn sec2rad(sec: f64) -> f64 {
    deg2rad(sec / 3600.0)
}

/// Meridional arc from the true origin latitude to `phi`.
fn meridional_arc(phi: f64, phi0: f64) -> f64 {
    let Ellipsoid { a, b } = AIRY_1830;
    let n = (a - b) / (a + b);
    let (n2, n3) = (n * n, n * n * n);
    let dp = phi - phi0;
    let sp = phi + phi0;
    b * F0
        * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * dp
            - (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * dp.sin() * sp.cos()
            + (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * dp).sin() * (2.0 * sp).cos()
            - 35.0 / 24.0 * n3 * (3.0 * dp).sin() * (3.0 * sp).cos())
}

/// Inverse transverse Mercator: grid easting/northing → OSGB36 lat/long in degrees.
pub fn grid_to_osgb36(easting: f64, northing: f64) -> LatLng {
    let a = AIRY_1830.a;
    let e2 = AIRY_1830.e2();
    let phi0 = deg2rad(PHI0_DEG);
    let lambda0 = deg2rad(LAMBDA0_DEG);

    let mut phi = (northing - N0) / (a * F0) + phi0;
    let mut m = meridional_arc(phi, phi0);
    // Converges to 0.01 mm within a handful of rounds.
    for _ in 0..16 {
        if (northing - N0 - m).abs() < 1e-5 {
            break;
        }
        phi += (northing - N0 - m) / (a * F0);
        m = meridional_arc(phi, phi0);
    }

    let sin_phi = phi.sin();
    let nu = a * F0 / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let rho = a * F0 * (1.0 - e2) / (1.0 - e2 * sin_phi * sin_phi).powf(1.5);
    let eta2 = nu / rho - 1.0;

    let t = phi.tan();
    let (t2, t4, t6) = (t * t, t.powi(4), t.powi(6));
    let sec = 1.0 / phi.cos();

    let vii = t / (2.0 * rho * nu);
    let viii = t / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * t2 + eta2 - 9.0 * t2 * eta2);
    let ix = t / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * t2 + 45.0 * t4);
    let x = sec / nu;
    let xi = sec / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * t2);
    let xii = sec / (120.0 * nu.powi(5)) * (5.0 + 28.0 * t2 + 24.0 * t4);
    let xiia = sec / (5040.0 * nu.powi(7)) * (61.0 + 662.0 * t2 + 1320.0 * t4 + 720.0 * t6);

    let de = easting - E0;
    let lat = phi - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
    let lng = lambda0 + x * de - xi * de.powi(3) + xii * de.powi(5) - xiia * de.powi(7);

    LatLng::new(rad2deg(lat), rad2deg(lng))
}

/// Datum shift OSGB36 → WGS84 (height taken as zero).
pub fn osgb36_to_wgs84(p: LatLng) -> LatLng {
    let phi = deg2rad(p.lat);
    let lambda = deg2rad(p.lng);

    // geodetic → cartesian on Airy
    let e2 = AIRY_1830.e2();
    let nu = AIRY_1830.a / (1.0 - e2 * phi.sin().powi(2)).sqrt();
    let x1 = nu * phi.cos() * lambda.cos();
    let y1 = nu * phi.cos() * lambda.sin();
    let z1 = (1.0 - e2) * nu * phi.sin();

    let s1 = S_PPM * 1e-6 + 1.0;
    let (rx, ry, rz) = (sec2rad(RX_SEC), sec2rad(RY_SEC), sec2rad(RZ_SEC));
    let x2 = TX + x1 * s1 - y1 * rz + z1 * ry;
    let y2 = TY + x1 * rz + y1 * s1 - z1 * rx;
    let z2 = TZ - x1 * ry + y1 * rx + z1 * s1;

    // cartesian → geodetic on WGS84
    let e2 = WGS84.e2();
    let p = (x2 * x2 + y2 * y2).sqrt();
    let mut phi = z2.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let nu = WGS84.a / (1.0 - e2 * phi.sin().powi(2)).sqrt();
        let next = (z2 + e2 * nu * phi.sin()).atan2(p);
        if (next - phi).abs() < 1e-12 {
            phi = next;
            break;
        }
        phi = next;
    }
    let lambda = y2.atan2(x2);

    LatLng::new(rad2deg(phi), rad2deg(lambda))
}

/// Grid reference → WGS84. Returns `None` for a zero or non-finite easting/northing,
/// which the table uses for "not surveyed".
pub fn grid_to_wgs84(easting: f64, northing: f64) -> Option<LatLng> {
    if !easting.is_finite() || !northing.is_finite() || easting == 0.0 || northing == 0.0 {
        return None;
    }
    Some(osgb36_to_wgs84(grid_to_osgb36(easting, northing)))
}
