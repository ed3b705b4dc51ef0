//! # geolandy-cli
//!
//! Consultation environnementale des prédios de la Reserva Forestal
//! Protectora Bosque Oriental de Bogotá en ligne de commande.
//!
//! ## Usage CLI
//!
//! ```bash
//! # Consultation par code CHIP
//! geolandy query --code AAA0143FTRS --report rapport.json --geojson predio.geojson
//!
//! # Consultation par coordonnées (EPSG:9377)
//! geolandy query --x 4884290.02 --y 2065679.52
//!
//! # Session interactive
//! geolandy session
//!
//! # Résumé de la zonification
//! geolandy zones
//! ```

pub mod config;
pub mod export;
pub mod report;

pub use config::Config;
pub use report::{QueryReport, ReportStatus};
