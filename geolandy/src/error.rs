//! Types d'erreurs pour le crate geolandy

use thiserror::Error;

/// Erreurs pouvant survenir lors du chargement ou d'une consultation
#[derive(Debug, Error)]
pub enum GeolandyError {
    /// Couche source absente, illisible ou non reprojetable (fatal au chargement)
    #[error("Data unavailable ({source_name}): {reason}")]
    DataUnavailable { source_name: String, reason: String },

    /// Entrée de consultation mal formée
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Géométrie dégénérée (surface nulle, etc.)
    #[error("Degenerate geometry for parcel {parcel_id}: {reason}")]
    DegenerateGeometry { parcel_id: String, reason: String },

    /// Reprojection impossible
    #[error("Reprojection error: {0}")]
    Reprojection(String),
}

impl GeolandyError {
    /// Crée une erreur de donnée indisponible avec contexte
    pub fn data_unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de géométrie dégénérée
    pub fn degenerate(parcel_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            parcel_id: parcel_id.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Vrai si l'erreur empêche toute consultation ultérieure
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}
