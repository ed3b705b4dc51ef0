//! Superposition prédio / zonification et comptabilité des surfaces
//!
//! Toutes les surfaces sont calculées dans le système plan (m²).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use geo::{Area, BooleanOps, MultiPolygon};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::category::ZoneCategory;
use crate::types::{ParcelRecord, ZoneLayer, ZoneRecord};
use crate::GeolandyError;

/// Politique de calcul de la surface affectée
///
/// Deux variantes existent pour les zones qui se chevauchent entre elles :
/// - `RawSum` additionne la surface de chaque fragment. Une même portion du
///   prédio couverte par deux zones est comptée deux fois, le pourcentage peut
///   donc dépasser 100 % et la surface non affectée devenir négative.
/// - `Union` mesure l'union des fragments, bornée par la surface du prédio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AreaPolicy {
    #[default]
    RawSum,
    Union,
}

impl fmt::Display for AreaPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawSum => f.write_str("raw-sum"),
            Self::Union => f.write_str("union"),
        }
    }
}

impl FromStr for AreaPolicy {
    type Err = GeolandyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw-sum" | "rawsum" | "sum" => Ok(Self::RawSum),
            "union" => Ok(Self::Union),
            other => Err(GeolandyError::validation(format!(
                "unknown area policy '{}', expected raw-sum or union",
                other
            ))),
        }
    }
}

/// Portion d'un prédio située dans une zone
#[derive(Debug, Clone)]
pub struct IntersectionFragment {
    /// Index de la zone source dans la couche
    pub zone_index: usize,

    /// Géométrie de la superposition (système plan)
    pub geometry: MultiPolygon,

    pub category: ZoneCategory,
    pub description: String,
    pub legal_reference: String,
    pub permitted: String,
    pub prohibited: String,

    /// Surface du fragment (m²)
    pub area: f64,
}

impl IntersectionFragment {
    fn new(zone_index: usize, zone: &ZoneRecord, geometry: MultiPolygon, area: f64) -> Self {
        Self {
            zone_index,
            geometry,
            category: zone.category.clone(),
            description: zone.description.clone(),
            legal_reference: zone.legal_reference.clone(),
            permitted: zone.permitted.clone(),
            prohibited: zone.prohibited.clone(),
            area,
        }
    }

    pub fn permitted_activities(&self) -> Vec<&str> {
        crate::types::split_statements(&self.permitted)
    }

    pub fn prohibited_activities(&self) -> Vec<&str> {
        crate::types::split_statements(&self.prohibited)
    }
}

/// Surface affectée pour une catégorie
#[derive(Debug, Clone, Serialize)]
pub struct CategoryArea {
    pub category: ZoneCategory,

    /// Somme des surfaces des fragments de la catégorie (m²)
    pub area: f64,

    /// Part du prédio (%)
    pub percent: f64,

    /// Nombre de fragments
    pub fragments: usize,
}

/// Résultat de la superposition d'un prédio
#[derive(Debug, Clone)]
pub struct OverlayResult {
    pub parcel_id: String,
    pub fragments: Vec<IntersectionFragment>,
    pub policy: AreaPolicy,

    /// Surfaces en m²
    pub total_area: f64,
    pub affected_area: f64,
    pub unaffected_area: f64,

    pub percent_affected: f64,
    pub percent_unaffected: f64,
}

impl OverlayResult {
    pub fn is_affected(&self) -> bool {
        !self.fragments.is_empty()
    }

    /// Surfaces agrégées par catégorie, dans l'ordre de la nomenclature
    pub fn by_category(&self) -> Vec<CategoryArea> {
        let mut groups: BTreeMap<&ZoneCategory, (f64, usize)> = BTreeMap::new();
        for fragment in &self.fragments {
            let entry = groups.entry(&fragment.category).or_default();
            entry.0 += fragment.area;
            entry.1 += 1;
        }

        groups
            .into_iter()
            .map(|(category, (area, fragments))| CategoryArea {
                category: category.clone(),
                area,
                percent: 100.0 * area / self.total_area,
                fragments,
            })
            .collect()
    }
}

/// Superpose un prédio à la couche de zonification.
///
/// Les intersections réduites à des lignes ou des points (arêtes communes)
/// n'ont pas de surface et ne produisent aucun fragment.
///
/// # Errors
///
/// `GeolandyError::DegenerateGeometry` si la surface du prédio est nulle ou
/// non finie.
pub fn overlay(
    parcel: &ParcelRecord,
    zones: &ZoneLayer,
    policy: AreaPolicy,
) -> Result<OverlayResult, GeolandyError> {
    let total_area = parcel.geometry.unsigned_area();
    if !total_area.is_finite() || total_area <= 0.0 {
        return Err(GeolandyError::degenerate(
            &parcel.id,
            format!("parcel area is {}", total_area),
        ));
    }

    let fragments: Vec<IntersectionFragment> = zones
        .iter()
        .enumerate()
        .filter_map(|(index, zone)| {
            let geometry = parcel.geometry.intersection(&zone.geometry);
            let area = geometry.unsigned_area();
            (area > 0.0).then(|| IntersectionFragment::new(index, zone, geometry, area))
        })
        .collect();

    let affected_area = match policy {
        AreaPolicy::RawSum => fragments.iter().map(|f| f.area).sum::<f64>(),
        AreaPolicy::Union => fragments
            .iter()
            .fold(MultiPolygon::new(Vec::new()), |acc, f| acc.union(&f.geometry))
            .unsigned_area(),
    };

    let unaffected_area = total_area - affected_area;
    let percent_affected = 100.0 * affected_area / total_area;

    if unaffected_area < 0.0 {
        warn!(
            parcel = %parcel.id,
            total_area,
            affected_area,
            "Overlapping zones counted more than once, affected area exceeds parcel area"
        );
    }

    debug!(
        parcel = %parcel.id,
        fragments = fragments.len(),
        total_area,
        affected_area,
        %policy,
        "Overlay computed"
    );

    Ok(OverlayResult {
        parcel_id: parcel.id.clone(),
        fragments,
        policy,
        total_area,
        affected_area,
        unaffected_area,
        percent_affected,
        percent_unaffected: 100.0 - percent_affected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Polygon};
    use std::collections::HashMap;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
            (x: x0, y: y0),
        ]
    }

    fn parcel(poly: Polygon) -> ParcelRecord {
        ParcelRecord {
            id: "AAA0143FTRS".to_string(),
            geometry: MultiPolygon::new(vec![poly]),
            properties: HashMap::new(),
        }
    }

    fn zone(category: ZoneCategory, polys: Vec<Polygon>) -> ZoneRecord {
        ZoneRecord {
            geometry: MultiPolygon::new(polys),
            category,
            description: "desc".to_string(),
            legal_reference: "Res. 1766 de 2016".to_string(),
            permitted: "Investigacion. Monitoreo.".to_string(),
            prohibited: "Mineria.".to_string(),
            properties: HashMap::new(),
        }
    }

    #[test]
    fn test_not_affected() {
        let p = parcel(rect(0.0, 0.0, 100.0, 100.0));
        let zones = ZoneLayer::new(vec![zone(
            ZoneCategory::Preservation,
            vec![rect(200.0, 200.0, 300.0, 300.0)],
        )]);

        let result = overlay(&p, &zones, AreaPolicy::RawSum).unwrap();
        assert!(!result.is_affected());
        assert_eq!(result.affected_area, 0.0);
        assert_eq!(result.percent_affected, 0.0);
        assert_eq!(result.unaffected_area, 10_000.0);
        assert!(result.by_category().is_empty());
    }

    #[test]
    fn test_fully_contained() {
        // 250 m x 200 m = 50 000 m²
        let p = parcel(rect(10.0, 10.0, 260.0, 210.0));
        let zones = ZoneLayer::new(vec![zone(
            ZoneCategory::Restoration,
            vec![rect(0.0, 0.0, 1000.0, 1000.0)],
        )]);

        let result = overlay(&p, &zones, AreaPolicy::RawSum).unwrap();
        assert_eq!(result.fragments.len(), 1);
        assert_eq!(result.fragments[0].category, ZoneCategory::Restoration);
        assert!((result.total_area - 50_000.0).abs() < 1e-6);
        assert!((result.affected_area - 50_000.0).abs() < 1e-6);
        assert!((result.percent_affected - 100.0).abs() < 1e-6);
        assert!(result.unaffected_area.abs() < 1e-6);
    }

    #[test]
    fn test_partial_overlay_by_category() {
        let p = parcel(rect(0.0, 0.0, 100.0, 100.0));
        let zones = ZoneLayer::new(vec![
            zone(ZoneCategory::SustainableUse, vec![rect(-50.0, -50.0, 50.0, 150.0)]),
            zone(ZoneCategory::Preservation, vec![rect(50.0, 0.0, 75.0, 100.0)]),
            zone(ZoneCategory::Preservation, vec![rect(90.0, 90.0, 200.0, 200.0)]),
        ]);

        let result = overlay(&p, &zones, AreaPolicy::RawSum).unwrap();
        assert_eq!(result.fragments.len(), 3);
        assert!((result.affected_area - 7_600.0).abs() < 1e-6);
        assert!((result.percent_affected - 76.0).abs() < 1e-9);
        assert!((result.percent_unaffected - 24.0).abs() < 1e-9);

        let by_category = result.by_category();
        assert_eq!(by_category.len(), 2);
        assert_eq!(by_category[0].category, ZoneCategory::Preservation);
        assert!((by_category[0].area - 2_600.0).abs() < 1e-6);
        assert_eq!(by_category[0].fragments, 2);
        assert_eq!(by_category[1].category, ZoneCategory::SustainableUse);
        assert!((by_category[1].percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_shared_edge_yields_no_fragment() {
        let p = parcel(rect(0.0, 0.0, 100.0, 100.0));
        let zones = ZoneLayer::new(vec![zone(
            ZoneCategory::PublicUse,
            vec![rect(100.0, 0.0, 200.0, 100.0)],
        )]);

        let result = overlay(&p, &zones, AreaPolicy::RawSum).unwrap();
        assert!(result.fragments.is_empty());
        assert_eq!(result.percent_affected, 0.0);
    }

    #[test]
    fn test_overlapping_zones_raw_sum_exceeds_100() {
        let p = parcel(rect(0.0, 0.0, 100.0, 100.0));
        let zones = ZoneLayer::new(vec![
            zone(ZoneCategory::Preservation, vec![rect(0.0, 0.0, 100.0, 100.0)]),
            zone(ZoneCategory::Restoration, vec![rect(0.0, 0.0, 100.0, 50.0)]),
        ]);

        let raw = overlay(&p, &zones, AreaPolicy::RawSum).unwrap();
        assert!((raw.percent_affected - 150.0).abs() < 1e-9);
        assert!((raw.unaffected_area - (-5_000.0)).abs() < 1e-6);

        let union = overlay(&p, &zones, AreaPolicy::Union).unwrap();
        assert!((union.percent_affected - 100.0).abs() < 1e-6);
        assert!(union.percent_affected <= 100.0 + 1e-6);
        assert_eq!(union.fragments.len(), 2);
    }

    #[test]
    fn test_multipart_zone_is_one_fragment() {
        let p = parcel(rect(0.0, 0.0, 100.0, 100.0));
        let zones = ZoneLayer::new(vec![zone(
            ZoneCategory::EnvironmentalRecovery,
            vec![rect(0.0, 0.0, 10.0, 10.0), rect(90.0, 90.0, 110.0, 110.0)],
        )]);

        let result = overlay(&p, &zones, AreaPolicy::RawSum).unwrap();
        assert_eq!(result.fragments.len(), 1);
        assert_eq!(result.fragments[0].geometry.0.len(), 2);
        assert!((result.affected_area - 200.0).abs() < 1e-6);
        assert_eq!(result.fragments[0].permitted_activities(), vec!["Investigacion", "Monitoreo"]);
    }

    #[test]
    fn test_degenerate_parcel() {
        let p = parcel(polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 20.0, y: 0.0),
            (x: 0.0, y: 0.0),
        ]);
        let zones = ZoneLayer::new(vec![zone(
            ZoneCategory::Preservation,
            vec![rect(0.0, 0.0, 10.0, 10.0)],
        )]);

        let err = overlay(&p, &zones, AreaPolicy::RawSum).unwrap_err();
        assert!(matches!(err, GeolandyError::DegenerateGeometry { .. }));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("raw-sum".parse::<AreaPolicy>().unwrap(), AreaPolicy::RawSum);
        assert_eq!("UNION".parse::<AreaPolicy>().unwrap(), AreaPolicy::Union);
        assert!("max".parse::<AreaPolicy>().is_err());
        assert_eq!(AreaPolicy::default(), AreaPolicy::RawSum);
    }
}
