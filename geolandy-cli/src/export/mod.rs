//! Modules d'export (GeoJSON)

pub mod geojson;

pub use geojson::export_assessment;
