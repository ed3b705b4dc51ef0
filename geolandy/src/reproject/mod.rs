//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Supporte les systèmes utilisés par les données de la réserve :
//! - MAGNA-SIRGAS géographique / WGS84 (EPSG:4326)
//! - MAGNA-SIRGAS / Origen-Nacional (EPSG:9377)
//! - MAGNA-SIRGAS / Colombia Bogota zone (EPSG:3116)
//!
//! Cible supplémentaire : Web Mercator (EPSG:3857).
//!
//! MAGNA-SIRGAS et WGS84 sont confondus (écart inférieur au mètre),
//! aucune transformation de datum n'est appliquée.

mod ellipsoid;
mod mercator;
#[cfg(feature = "reproject")]
pub mod proj;
mod smart;
mod transverse_mercator;

pub use smart::SmartReprojector;
pub use transverse_mercator::TransverseMercator;

use geo::{Coord, MapCoords, MultiPolygon};

use crate::GeolandyError;

type Result<T> = std::result::Result<T, GeolandyError>;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Systèmes connus de la reprojection légère
#[derive(Debug, Clone, Copy)]
enum Crs {
    Geographic,
    WebMercator,
    Planar(TransverseMercator),
}

impl Crs {
    fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            4326 => Some(Self::Geographic),
            3857 => Some(Self::WebMercator),
            _ => TransverseMercator::for_epsg(epsg).map(Self::Planar),
        }
    }
}

/// Reprojection légère entre les systèmes colombiens et WGS84
pub struct ReprojectorLite {
    source: Crs,
    target: Crs,
    source_epsg: u32,
    target_epsg: u32,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let source = Crs::from_epsg(source_epsg).ok_or_else(|| {
            GeolandyError::Reprojection(format!(
                "EPSG:{} not supported. Supported: 4326, 3857, 9377, 3116",
                source_epsg
            ))
        })?;
        let target = Crs::from_epsg(target_epsg).ok_or_else(|| {
            GeolandyError::Reprojection(format!(
                "EPSG:{} not supported. Supported: 4326, 3857, 9377, 3116",
                target_epsg
            ))
        })?;

        Ok(Self {
            source,
            target,
            source_epsg,
            target_epsg,
        })
    }

    fn is_supported_epsg(epsg: u32) -> bool {
        Crs::from_epsg(epsg).is_some()
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: u32, target: u32) -> bool {
        Self::is_supported_epsg(source) && Self::is_supported_epsg(target)
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return Err(GeolandyError::Reprojection(format!(
                "non-finite coordinate ({}, {})",
                x, y
            )));
        }

        // Étape 1: Source → Géographique
        let geo = match self.source {
            Crs::Geographic => Geographic::from_degrees(x, y),
            Crs::WebMercator => mercator::web_mercator_to_geographic(x, y),
            Crs::Planar(tm) => tm.inverse(x, y),
        };

        // Étape 2: Géographique → Cible
        let out = match self.target {
            Crs::Geographic => geo.to_degrees(),
            Crs::WebMercator => mercator::geographic_to_web_mercator(geo),
            Crs::Planar(tm) => tm.forward(geo),
        };

        if out.0.is_finite() && out.1.is_finite() {
            Ok(out)
        } else {
            Err(GeolandyError::Reprojection(format!(
                "coordinate ({}, {}) out of domain for EPSG:{} -> EPSG:{}",
                x, y, self.source_epsg, self.target_epsg
            )))
        }
    }

    fn transform_coord(&self, c: Coord) -> Result<Coord> {
        let (x, y) = self.transform_point(c.x, c.y)?;
        Ok(Coord { x, y })
    }

    /// Transforme un MultiPolygon
    pub fn transform_multipolygon(&self, mp: &MultiPolygon) -> Result<MultiPolygon> {
        mp.try_map_coords(|c| self.transform_coord(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    #[test]
    fn test_wgs84_to_origen_nacional() {
        let reproj = ReprojectorLite::new(4326, 9377).unwrap();
        let (x, y) = reproj.transform_point(-73.0, 4.0).unwrap();

        assert!((x - 5_000_000.0).abs() < 1e-3, "x={}", x);
        assert!((y - 2_000_000.0).abs() < 1e-3, "y={}", y);
    }

    #[test]
    fn test_bogota_zone_to_origen_nacional() {
        // Les deux systèmes plans passent par le géographique
        let reproj = ReprojectorLite::new(3116, 9377).unwrap();
        let back = ReprojectorLite::new(9377, 3116).unwrap();

        let (x, y) = reproj.transform_point(1_000_500.0, 1_002_000.0).unwrap();
        let (x2, y2) = back.transform_point(x, y).unwrap();

        assert!((x2 - 1_000_500.0).abs() < 0.01, "x2={}", x2);
        assert!((y2 - 1_002_000.0).abs() < 0.01, "y2={}", y2);
    }

    #[test]
    fn test_polygon_area_preserved() {
        // Un carré de ~1 ha près de Bogotá garde sa surface (facteur d'échelle ~0.9992²)
        let reproj = ReprojectorLite::new(3116, 9377).unwrap();
        let square = polygon![
            (x: 1_000_000.0, y: 1_000_000.0),
            (x: 1_000_100.0, y: 1_000_000.0),
            (x: 1_000_100.0, y: 1_000_100.0),
            (x: 1_000_000.0, y: 1_000_100.0),
            (x: 1_000_000.0, y: 1_000_000.0),
        ];
        let mp = MultiPolygon::new(vec![square]);
        let out = reproj.transform_multipolygon(&mp).unwrap();

        let area = out.unsigned_area();
        assert!((area - 10_000.0).abs() < 50.0, "area={}", area);
    }

    #[test]
    fn test_unsupported_epsg() {
        assert!(ReprojectorLite::new(2154, 9377).is_err());
        assert!(ReprojectorLite::new(9377, 32618).is_err());
        assert!(ReprojectorLite::is_supported(4326, 9377));
        assert!(!ReprojectorLite::is_supported(4326, 2154));
    }

    #[test]
    fn test_non_finite_rejected() {
        let reproj = ReprojectorLite::new(9377, 4326).unwrap();
        assert!(reproj.transform_point(f64::NAN, 2_000_000.0).is_err());
    }
}
