//! Chargement des couches prédios / zonification
//!
//! Les deux couches sont des FeatureCollection GeoJSON. Chaque géométrie est
//! reprojetée dans le système plan [`PLANAR_EPSG`] au chargement ; les
//! consultations ne manipulent ensuite que des coordonnées métriques.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use geo::{BooleanOps, Geometry, MultiPolygon};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::category::ZoneCategory;
use crate::reproject::SmartReprojector;
use crate::types::{Datasets, ParcelLayer, ParcelRecord, ZoneLayer, ZoneRecord, PLANAR_EPSG};
use crate::GeolandyError;

type Result<T> = std::result::Result<T, GeolandyError>;

/// Fichier source d'une couche
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSource {
    /// Chemin du fichier GeoJSON
    pub path: PathBuf,

    /// EPSG source forcé (sinon membre `crs` du fichier, sinon 4326)
    #[serde(default)]
    pub source_epsg: Option<u32>,
}

impl LayerSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source_epsg: None,
        }
    }

    pub fn with_epsg(mut self, epsg: u32) -> Self {
        self.source_epsg = Some(epsg);
        self
    }
}

/// Noms des attributs de la couche prédios
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelFields {
    /// Code d'enregistrement
    pub id: String,
}

impl Default for ParcelFields {
    fn default() -> Self {
        Self {
            id: "CHIP".to_string(),
        }
    }
}

/// Noms des attributs de la couche de zonification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneFields {
    pub category: String,
    pub description: String,
    pub legal_reference: String,
    pub permitted: String,
    pub prohibited: String,
}

impl Default for ZoneFields {
    fn default() -> Self {
        Self {
            category: "ZONIFICACI".to_string(),
            description: "DESCRIPCI".to_string(),
            legal_reference: "ACTO_ZONIF".to_string(),
            permitted: "ACT_PERMIT".to_string(),
            prohibited: "ACT_PROHIB".to_string(),
        }
    }
}

/// Options de chargement
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub parcels: LayerSource,
    pub zones: LayerSource,
    pub parcel_fields: ParcelFields,
    pub zone_fields: ZoneFields,

    /// Calculer la limite de la réserve (union des zones)
    pub reserve_boundary: bool,
}

impl LoadOptions {
    pub fn new(parcels: LayerSource, zones: LayerSource) -> Self {
        Self {
            parcels,
            zones,
            parcel_fields: ParcelFields::default(),
            zone_fields: ZoneFields::default(),
            reserve_boundary: true,
        }
    }
}

/// Charge et reprojette les deux couches.
///
/// Opération coûteuse, à appeler une seule fois par processus : l'appelant
/// conserve le [`Datasets`] retourné et le passe par référence aux consultations.
///
/// # Errors
///
/// Retourne `GeolandyError::DataUnavailable` si un fichier est absent, mal
/// formé, vide ou non reprojetable. Aucune consultation n'est alors possible.
pub fn load(options: &LoadOptions) -> Result<Datasets> {
    let parcels = read_parcels(&options.parcels, &options.parcel_fields)?;
    let zones = read_zones(&options.zones, &options.zone_fields)?;

    let reserve = options.reserve_boundary.then(|| reserve_boundary(&zones));

    info!(
        parcels = parcels.len(),
        zones = zones.len(),
        reserve = reserve.is_some(),
        epsg = PLANAR_EPSG,
        "Datasets loaded"
    );

    Ok(Datasets {
        parcels,
        zones,
        reserve,
        epsg: PLANAR_EPSG,
    })
}

/// Lit la couche prédios depuis un fichier
pub fn read_parcels(source: &LayerSource, fields: &ParcelFields) -> Result<ParcelLayer> {
    let name = source.path.display().to_string();
    let text = read_source(&source.path)?;
    parcels_from_geojson(&text, source.source_epsg, fields, &name)
}

/// Lit la couche de zonification depuis un fichier
pub fn read_zones(source: &LayerSource, fields: &ZoneFields) -> Result<ZoneLayer> {
    let name = source.path.display().to_string();
    let text = read_source(&source.path)?;
    zones_from_geojson(&text, source.source_epsg, fields, &name)
}

/// Construit la couche prédios depuis un texte GeoJSON
pub fn parcels_from_geojson(
    text: &str,
    source_epsg: Option<u32>,
    fields: &ParcelFields,
    name: &str,
) -> Result<ParcelLayer> {
    let (collection, epsg) = parse_collection(text, source_epsg, name)?;

    let records = convert_features(collection, epsg, name, |index, mut properties, geometry| {
        let Some(id) = properties.remove(&fields.id).filter(|id| !id.is_empty()) else {
            warn!(layer = name, index, field = %fields.id, "Parcel without identifier, skipped");
            return None;
        };
        Some(ParcelRecord {
            id,
            geometry,
            properties,
        })
    })?;

    if records.is_empty() {
        return Err(GeolandyError::data_unavailable(name, "no usable parcel feature"));
    }

    Ok(ParcelLayer::new(records))
}

/// Construit la couche de zonification depuis un texte GeoJSON
pub fn zones_from_geojson(
    text: &str,
    source_epsg: Option<u32>,
    fields: &ZoneFields,
    name: &str,
) -> Result<ZoneLayer> {
    let (collection, epsg) = parse_collection(text, source_epsg, name)?;

    let records = convert_features(collection, epsg, name, |index, mut properties, geometry| {
        let label = properties.remove(&fields.category).unwrap_or_default();
        let category = ZoneCategory::from_label(&label);
        if !category.is_known() {
            warn!(layer = name, index, category = %label, "Zone category outside the known set");
        }
        Some(ZoneRecord {
            geometry,
            category,
            description: properties.remove(&fields.description).unwrap_or_default(),
            legal_reference: properties.remove(&fields.legal_reference).unwrap_or_default(),
            permitted: properties.remove(&fields.permitted).unwrap_or_default(),
            prohibited: properties.remove(&fields.prohibited).unwrap_or_default(),
            properties,
        })
    })?;

    if records.is_empty() {
        return Err(GeolandyError::data_unavailable(name, "no usable zone feature"));
    }

    Ok(ZoneLayer::new(records))
}

/// Limite de la réserve : union de toutes les géométries de zone
pub fn reserve_boundary(zones: &ZoneLayer) -> MultiPolygon {
    zones
        .iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, zone| acc.union(&zone.geometry))
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| GeolandyError::data_unavailable(path.display().to_string(), e.to_string()))
}

/// Parse une FeatureCollection et détermine son EPSG source
fn parse_collection(
    text: &str,
    source_epsg: Option<u32>,
    name: &str,
) -> Result<(FeatureCollection, u32)> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| GeolandyError::data_unavailable(name, e.to_string()))?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(GeolandyError::data_unavailable(
            name,
            "GeoJSON document is not a FeatureCollection",
        ));
    };

    let declared = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(crs_member_epsg);

    if let (Some(forced), Some(declared)) = (source_epsg, declared) {
        if forced != declared {
            warn!(
                layer = name,
                forced,
                declared,
                "Forced EPSG differs from the declared crs member"
            );
        }
    }

    // RFC 7946 : WGS84 en l'absence de déclaration
    let epsg = source_epsg.or(declared).unwrap_or(4326);
    debug!(layer = name, epsg, features = collection.features.len(), "Collection parsed");

    Ok((collection, epsg))
}

/// Extrait l'EPSG du membre `crs` (convention GeoJSON 2008)
fn crs_member_epsg(crs: &JsonValue) -> Option<u32> {
    let name = crs.get("properties")?.get("name")?.as_str()?;
    parse_crs_name(name)
}

/// `urn:ogc:def:crs:EPSG::9377`, `EPSG:9377`, `urn:ogc:def:crs:OGC:1.3:CRS84`
pub fn parse_crs_name(name: &str) -> Option<u32> {
    let name = name.trim();
    if name.ends_with("CRS84") {
        return Some(4326);
    }
    let upper = name.to_ascii_uppercase();
    let pos = upper.rfind("EPSG")?;
    upper[pos + 4..].rsplit(':').next()?.trim().parse().ok()
}

/// Convertit et reprojette toutes les features (en parallèle)
///
/// `build` reçoit les attributs et la géométrie plane, et retourne `None` pour
/// ignorer la feature.
fn convert_features<T, F>(
    collection: FeatureCollection,
    epsg: u32,
    name: &str,
    build: F,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize, HashMap<String, String>, MultiPolygon) -> Option<T> + Sync + Send,
{
    let reprojector = SmartReprojector::new(epsg, PLANAR_EPSG)
        .map_err(|e| GeolandyError::data_unavailable(name, e.to_string()))?;
    info!(
        layer = name,
        source_epsg = epsg,
        target_epsg = PLANAR_EPSG,
        reprojector = reprojector.description(),
        "Reprojecting layer"
    );
    drop(reprojector);

    let converted: Vec<Option<T>> = collection
        .features
        .into_par_iter()
        .enumerate()
        .map_init(
            || SmartReprojector::new(epsg, PLANAR_EPSG),
            |reprojector, (index, feature)| -> Result<Option<T>> {
                let reprojector = reprojector
                    .as_ref()
                    .map_err(|e| GeolandyError::data_unavailable(name, e.to_string()))?;

                let (properties, geometry) = split_feature(feature);
                let Some(geometry) = geometry.and_then(to_multipolygon) else {
                    warn!(layer = name, index, "Feature without areal geometry, skipped");
                    return Ok(None);
                };

                let planar = reprojector.transform_multipolygon(&geometry).map_err(|e| {
                    GeolandyError::data_unavailable(name, format!("feature {}: {}", index, e))
                })?;

                Ok(build(index, properties, planar))
            },
        )
        .collect::<Result<Vec<_>>>()?;

    Ok(converted.into_iter().flatten().collect())
}

/// Sépare attributs et géométrie `geo` d'une feature GeoJSON
fn split_feature(feature: Feature) -> (HashMap<String, String>, Option<Geometry>) {
    let properties = feature
        .properties
        .map(properties_to_strings)
        .unwrap_or_default();

    let geometry = feature
        .geometry
        .and_then(|g| Geometry::<f64>::try_from(g.value).ok());

    (properties, geometry)
}

fn properties_to_strings(properties: JsonObject) -> HashMap<String, String> {
    properties
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                JsonValue::Null => return None,
                JsonValue::String(s) => s,
                other => other.to_string(),
            };
            Some((key, value))
        })
        .collect()
}

/// Ne garde que la partie surfacique d'une géométrie
fn to_multipolygon(geometry: Geometry) -> Option<MultiPolygon> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        Geometry::MultiPolygon(mp) if !mp.0.is_empty() => Some(mp),
        Geometry::GeometryCollection(gc) => {
            let polygons: Vec<_> = gc
                .into_iter()
                .filter_map(to_multipolygon)
                .flat_map(|mp| mp.0)
                .collect();
            (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
        }
        _ => None,
    }
}
