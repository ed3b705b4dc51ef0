//! Types de données pour le crate geolandy

use std::collections::HashMap;

use geo::{BoundingRect, MultiPolygon, Rect};

use crate::category::ZoneCategory;

/// Système plan de calcul des surfaces : MAGNA-SIRGAS / Origen-Nacional
pub const PLANAR_EPSG: u32 = 9377;

/// Système géographique d'affichage
pub const DISPLAY_EPSG: u32 = 4326;

/// Un prédio (parcelle) avec sa géométrie et ses attributs
#[derive(Debug, Clone)]
pub struct ParcelRecord {
    /// Code d'enregistrement (CHIP)
    pub id: String,

    /// Géométrie dans le système plan (les Polygon sont promus en MultiPolygon)
    pub geometry: MultiPolygon,

    /// Autres attributs (clé -> valeur)
    pub properties: HashMap<String, String>,
}

/// Une zone de la zonification environnementale
#[derive(Debug, Clone)]
pub struct ZoneRecord {
    /// Géométrie dans le système plan
    pub geometry: MultiPolygon,

    /// Catégorie de zonification
    pub category: ZoneCategory,

    /// Description libre
    pub description: String,

    /// Acte administratif de référence
    pub legal_reference: String,

    /// Activités permises, phrases séparées par un point
    pub permitted: String,

    /// Activités interdites, phrases séparées par un point
    pub prohibited: String,

    /// Autres attributs (clé -> valeur)
    pub properties: HashMap<String, String>,
}

impl ZoneRecord {
    pub fn permitted_activities(&self) -> Vec<&str> {
        split_statements(&self.permitted)
    }

    pub fn prohibited_activities(&self) -> Vec<&str> {
        split_statements(&self.prohibited)
    }
}

/// Découpe un champ texte en phrases (séparateur `.`), sans les vides
pub fn split_statements(text: &str) -> Vec<&str> {
    text.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Couche des prédios, dans l'ordre du fichier source
#[derive(Debug, Clone, Default)]
pub struct ParcelLayer {
    pub records: Vec<ParcelRecord>,
}

impl ParcelLayer {
    pub fn new(records: Vec<ParcelRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParcelRecord> {
        self.records.iter()
    }
}

/// Couche de zonification, dans l'ordre du fichier source
#[derive(Debug, Clone, Default)]
pub struct ZoneLayer {
    pub records: Vec<ZoneRecord>,
}

impl ZoneLayer {
    pub fn new(records: Vec<ZoneRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ZoneRecord> {
        self.records.iter()
    }

    /// Emprise de toutes les zones
    pub fn bounding_rect(&self) -> Option<Rect> {
        self.records
            .iter()
            .filter_map(|z| z.geometry.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                    (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                )
            })
    }
}

/// Jeux de données chargés, immuables pendant toute la durée du processus
#[derive(Debug, Clone)]
pub struct Datasets {
    pub parcels: ParcelLayer,
    pub zones: ZoneLayer,

    /// Limite de la réserve (union de toutes les zones), si demandée
    pub reserve: Option<MultiPolygon>,

    /// EPSG des géométries chargées (toujours [`PLANAR_EPSG`])
    pub epsg: u32,
}
