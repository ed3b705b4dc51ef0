//! Repli PROJ pour les systèmes hors des projections colombiennes intégrées
//!
//! Disponible uniquement avec le feature `reproject`.

use geo::{Coord, MapCoords, MultiPolygon};
use proj::Proj;

use crate::GeolandyError;

/// Transformation PROJ entre deux codes EPSG
pub struct Reprojector {
    proj: Proj,
}

impl Reprojector {
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, GeolandyError> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", target_epsg);

        let proj = Proj::new_known_crs(&source, &target, None).map_err(|e| {
            GeolandyError::Reprojection(format!(
                "failed to create projection from {} to {}: {}",
                source, target, e
            ))
        })?;

        Ok(Self { proj })
    }

    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), GeolandyError> {
        self.proj.convert((x, y)).map_err(|e| {
            GeolandyError::Reprojection(format!("coordinate transformation failed: {}", e))
        })
    }

    fn transform_coord(&self, c: Coord) -> Result<Coord, GeolandyError> {
        let (x, y) = self.transform_point(c.x, c.y)?;
        Ok(Coord { x, y })
    }

    /// Reprojette un contour de prédio ou de zone
    pub fn transform_multipolygon(&self, mp: &MultiPolygon) -> Result<MultiPolygon, GeolandyError> {
        mp.try_map_coords(|c| self.transform_coord(c))
    }
}
