//! Choix du moteur de reprojection pour une paire EPSG
//!
//! Les systèmes colombiens courants (MAGNA-SIRGAS Origen-Nacional 9377,
//! zone Bogotá 3116, WGS84 4326, Web Mercator 3857) passent par les formules
//! intégrées. Les autres codes exigent PROJ.

use geo::MultiPolygon;

use super::ReprojectorLite;
use crate::GeolandyError;

/// Reprojection entre le plan cadastral et l'affichage
pub enum SmartReprojector {
    /// Formules intégrées pour 9377, 3116, 4326 et 3857
    Lite(ReprojectorLite),
    #[cfg(feature = "reproject")]
    Proj(super::proj::Reprojector),
    /// Source et cible identiques
    Identity,
}

impl SmartReprojector {
    /// Erreur si aucun moteur ne couvre la paire
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, GeolandyError> {
        if source_epsg == target_epsg {
            return Ok(Self::Identity);
        }

        if ReprojectorLite::is_supported(source_epsg, target_epsg) {
            return Ok(Self::Lite(ReprojectorLite::new(source_epsg, target_epsg)?));
        }

        Self::fallback(source_epsg, target_epsg)
    }

    /// Codes hors des systèmes colombiens intégrés
    #[cfg(feature = "reproject")]
    fn fallback(source_epsg: u32, target_epsg: u32) -> Result<Self, GeolandyError> {
        let proj = super::proj::Reprojector::new(source_epsg, target_epsg)?;
        Ok(Self::Proj(proj))
    }

    #[cfg(not(feature = "reproject"))]
    fn fallback(source_epsg: u32, target_epsg: u32) -> Result<Self, GeolandyError> {
        Err(GeolandyError::Reprojection(format!(
            "EPSG:{} -> EPSG:{} not supported.\n\
             Built-in systems: 4326 (WGS84 / MAGNA-SIRGAS), 9377 (Origen-Nacional), \
             3116 (Bogota zone), 3857 (Web Mercator).\n\
             For other systems, build with: cargo build --features reproject",
            source_epsg, target_epsg
        )))
    }

    pub fn transform_multipolygon(&self, mp: &MultiPolygon) -> Result<MultiPolygon, GeolandyError> {
        match self {
            Self::Identity => Ok(mp.clone()),
            Self::Lite(lite) => lite.transform_multipolygon(mp),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_multipolygon(mp),
        }
    }

    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), GeolandyError> {
        match self {
            Self::Identity => Ok((x, y)),
            Self::Lite(lite) => lite.transform_point(x, y),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_point(x, y),
        }
    }

    /// Moteur retenu, pour les logs
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "same EPSG, coordinates unchanged",
            Self::Lite(_) => "built-in MAGNA-SIRGAS formulas",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "PROJ",
        }
    }
}
