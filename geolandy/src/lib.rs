//! # geolandy
//!
//! Évaluation environnementale de prédios (parcelles) de la Reserva Forestal
//! Protectora Bosque Oriental de Bogotá : superposition de la géométrie d'un
//! prédio à la zonification environnementale de la réserve.
//!
//! ## Features
//!
//! - Chargement des couches prédios et zonification (GeoJSON), reprojetées
//!   dans le système plan MAGNA-SIRGAS / Origen-Nacional (EPSG:9377)
//! - Recherche par code CHIP ou par coordonnées
//! - Intersection avec chaque zone, surfaces et pourcentages affectés
//! - Reprojection en Rust pur, ou via PROJ avec la feature `reproject`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geolandy::{assess, load, lookup, AreaPolicy, LayerSource, LoadOptions, QueryRequest};
//!
//! let options = LoadOptions::new(
//!     LayerSource::new("PREDIOS_RFPBOB_2025.geojson"),
//!     LayerSource::new("Zonificacion_Ambiental_RFP_Bosque_Oriental_de_Bogota.geojson"),
//! );
//! let datasets = load(&options)?;
//!
//! let state = lookup(&datasets, &QueryRequest::Code("AAA0143FTRS".into()));
//! if let Some(selection) = state.selection() {
//!     let assessment = assess(selection, &datasets.zones, AreaPolicy::RawSum)?;
//!     println!("Surface: {:.2} m²", assessment.total_area());
//! }
//! ```

pub mod area;
pub mod category;
pub mod error;
pub mod loader;
pub mod locator;
pub mod overlay;
pub mod query;
pub mod reproject;
pub mod types;

pub use area::{format_area, format_percent};
pub use category::ZoneCategory;
pub use error::GeolandyError;
pub use loader::{load, LayerSource, LoadOptions, ParcelFields, ZoneFields};
pub use overlay::{overlay, AreaPolicy, CategoryArea, IntersectionFragment, OverlayResult};
pub use query::{assess, lookup, Assessment, QueryRequest, QuerySlot, QueryState, Selection};
pub use types::{
    Datasets, ParcelLayer, ParcelRecord, ZoneLayer, ZoneRecord, DISPLAY_EPSG, PLANAR_EPSG,
};
