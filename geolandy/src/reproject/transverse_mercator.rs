//! Projection Transverse Mercator (séries de Snyder) sur GRS80
//!
//! Systèmes supportés :
//! - EPSG:9377 - MAGNA-SIRGAS / Origen-Nacional (système plan national)
//! - EPSG:3116 - MAGNA-SIRGAS / Colombia Bogota zone

use super::ellipsoid::GRS80;
use super::Geographic;

/// Paramètres d'une projection Transverse Mercator
#[derive(Debug, Clone, Copy)]
pub struct TransverseMercator {
    /// Longitude du méridien central (radians)
    lon0: f64,
    /// Latitude d'origine (radians)
    lat0: f64,
    /// Facteur d'échelle sur le méridien central
    k0: f64,
    /// False easting
    x0: f64,
    /// False northing
    y0: f64,
}

impl TransverseMercator {
    /// Origen-Nacional (EPSG:9377)
    pub fn origen_nacional() -> Self {
        Self {
            lon0: (-73.0_f64).to_radians(),
            lat0: 4.0_f64.to_radians(),
            k0: 0.9992,
            x0: 5_000_000.0,
            y0: 2_000_000.0,
        }
    }

    /// Colombia Bogota zone (EPSG:3116)
    pub fn bogota_zone() -> Self {
        Self {
            lon0: (-74.077_507_916_666_66_f64).to_radians(),
            lat0: 4.596_200_416_666_666_f64.to_radians(),
            k0: 1.0,
            x0: 1_000_000.0,
            y0: 1_000_000.0,
        }
    }

    /// Paramètres pour un code EPSG, si supporté
    pub fn for_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            9377 => Some(Self::origen_nacional()),
            3116 => Some(Self::bogota_zone()),
            _ => None,
        }
    }

    /// Géographique → plan
    pub fn forward(&self, geo: Geographic) -> (f64, f64) {
        let a = GRS80::A;
        let e2 = GRS80::E2;
        let ep2 = GRS80::EP2;

        let (sin_lat, cos_lat) = geo.lat.sin_cos();
        let tan_lat = geo.lat.tan();

        let n = a / (1.0 - e2 * sin_lat.powi(2)).sqrt();
        let t = tan_lat.powi(2);
        let c = ep2 * cos_lat.powi(2);
        let big_a = (geo.lon - self.lon0) * cos_lat;

        let m = meridian_arc(geo.lat);
        let m0 = meridian_arc(self.lat0);

        let x = self.x0
            + self.k0
                * n
                * (big_a
                    + (1.0 - t + c) * big_a.powi(3) / 6.0
                    + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * big_a.powi(5)
                        / 120.0);

        let y = self.y0
            + self.k0
                * (m - m0
                    + n * tan_lat
                        * (big_a.powi(2) / 2.0
                            + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * big_a.powi(4) / 24.0
                            + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2)
                                * big_a.powi(6)
                                / 720.0));

        (x, y)
    }

    /// Plan → géographique
    pub fn inverse(&self, x: f64, y: f64) -> Geographic {
        let a = GRS80::A;
        let e2 = GRS80::E2;
        let ep2 = GRS80::EP2;

        // Latitude du pied de la perpendiculaire
        let m = meridian_arc(self.lat0) + (y - self.y0) / self.k0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();

        let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
        let t1 = tan_phi1.powi(2);
        let c1 = ep2 * cos_phi1.powi(2);
        let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
        let d = (x - self.x0) / (n1 * self.k0);

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d.powi(2) / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                        - 252.0 * ep2
                        - 3.0 * c1.powi(2))
                        * d.powi(6)
                        / 720.0);

        let lon = self.lon0
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2
                    + 24.0 * t1.powi(2))
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        Geographic::new(lon, lat)
    }
}

/// Longueur de l'arc de méridien depuis l'équateur jusqu'à `lat`
fn meridian_arc(lat: f64) -> f64 {
    let a = GRS80::A;
    let e2 = GRS80::E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}
