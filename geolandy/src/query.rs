//! Consultation : requête, état du créneau de session, évaluation
//!
//! Le cœur est sans état : [`lookup`] et [`assess`] sont des fonctions pures.
//! Le créneau [`QuerySlot`] appartient à la couche de présentation, qui le
//! fait évoluer au fil des requêtes.

use std::fmt;

use tracing::{info, warn};

use crate::locator;
use crate::overlay::{overlay, AreaPolicy, OverlayResult};
use crate::types::{Datasets, ParcelRecord, ZoneLayer};
use crate::GeolandyError;

/// Requête de consultation
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRequest {
    /// Recherche par code CHIP
    Code(String),
    /// Recherche par coordonnées planes (EPSG:9377)
    Point { x: f64, y: f64 },
}

impl fmt::Display for QueryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "CHIP {}", code),
            Self::Point { x, y } => write!(f, "X: {}, Y: {}", x, y),
        }
    }
}

/// Prédio(s) retenu(s) par une recherche
#[derive(Debug, Clone)]
pub struct Selection {
    /// Identifiant de référence (code saisi, ou CHIP du premier prédio trouvé)
    pub reference: String,

    /// Prédios trouvés, au moins un
    pub parcels: Vec<ParcelRecord>,
}

impl Selection {
    /// Prédio de référence (le premier trouvé), absent si la sélection est vide
    pub fn primary(&self) -> Option<&ParcelRecord> {
        self.parcels.first()
    }
}

/// État du créneau de consultation
#[derive(Debug, Clone, Default)]
pub enum QueryState {
    /// Aucune consultation
    #[default]
    Empty,
    /// Prédio trouvé
    Found(Selection),
    /// Requête valide sans résultat (issue normale, pas une erreur)
    NotFound { message: String },
    /// Requête mal formée
    Invalid { message: String },
}

impl QueryState {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Self::Found(selection) => Some(selection),
            _ => None,
        }
    }

    /// Message à afficher pour les états terminaux sans prédio
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::NotFound { message } | Self::Invalid { message } => Some(message),
            _ => None,
        }
    }
}

/// Résultat de l'évaluation d'un prédio trouvé
#[derive(Debug, Clone)]
pub enum Assessment {
    /// Aucun recouvrement avec la zonification
    NotAffected {
        parcel_id: String,
        total_area: f64,
        policy: AreaPolicy,
    },
    /// Recouvrement avec au moins une zone
    Affected(OverlayResult),
}

impl Assessment {
    pub fn total_area(&self) -> f64 {
        match self {
            Self::NotAffected { total_area, .. } => *total_area,
            Self::Affected(result) => result.total_area,
        }
    }

    /// Politique de surface demandée pour l'évaluation
    pub fn policy(&self) -> AreaPolicy {
        match self {
            Self::NotAffected { policy, .. } => *policy,
            Self::Affected(result) => result.policy,
        }
    }

    pub fn overlay(&self) -> Option<&OverlayResult> {
        match self {
            Self::Affected(result) => Some(result),
            Self::NotAffected { .. } => None,
        }
    }
}

/// Recherche le(s) prédio(s) correspondant à la requête
pub fn lookup(datasets: &Datasets, request: &QueryRequest) -> QueryState {
    let (matches, reference) = match request {
        QueryRequest::Code(code) => match locator::find_by_code(&datasets.parcels, code) {
            Ok(matches) => (matches, code.clone()),
            Err(e) => return invalid(e),
        },
        QueryRequest::Point { x, y } => {
            match locator::find_by_point(&datasets.parcels, *x, *y) {
                Ok(matches) => {
                    let reference = matches.first().map(|p| p.id.clone()).unwrap_or_default();
                    (matches, reference)
                }
                Err(e) => return invalid(e),
            }
        }
    };

    if matches.is_empty() {
        info!(request = %request, "No parcel found");
        return QueryState::NotFound {
            message: format!("No parcel found for {}", request),
        };
    }

    info!(request = %request, reference = %reference, matches = matches.len(), "Parcel found");
    QueryState::Found(Selection {
        reference,
        parcels: matches.into_iter().cloned().collect(),
    })
}

fn invalid(error: GeolandyError) -> QueryState {
    let message = match error {
        GeolandyError::Validation(message) => message,
        other => other.to_string(),
    };
    QueryState::Invalid { message }
}

/// Superpose le prédio de référence de la sélection à la zonification.
///
/// Seul le premier prédio est évalué ; les autres correspondances sont
/// signalées dans les logs. Une sélection vide est une erreur de validation.
pub fn assess(
    selection: &Selection,
    zones: &ZoneLayer,
    policy: AreaPolicy,
) -> Result<Assessment, GeolandyError> {
    if selection.parcels.len() > 1 {
        warn!(
            reference = %selection.reference,
            matches = selection.parcels.len(),
            "Several parcels match, only the first one is assessed"
        );
    }

    let parcel = selection.primary().ok_or_else(|| {
        GeolandyError::validation(format!("empty selection for {}", selection.reference))
    })?;
    let result = overlay(parcel, zones, policy)?;

    if result.is_affected() {
        Ok(Assessment::Affected(result))
    } else {
        Ok(Assessment::NotAffected {
            parcel_id: result.parcel_id,
            total_area: result.total_area,
            policy,
        })
    }
}

/// Créneau de consultation d'une session (une seule consultation active)
#[derive(Debug, Clone, Default)]
pub struct QuerySlot {
    state: QueryState,
}

impl QuerySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Exécute une requête ; le résultat remplace l'état courant
    pub fn submit(&mut self, datasets: &Datasets, request: &QueryRequest) -> &QueryState {
        self.state = lookup(datasets, request);
        &self.state
    }

    /// Retour à l'état initial
    pub fn reset(&mut self) {
        self.state = QueryState::Empty;
    }

    /// Vide le créneau et rend l'état qu'il contenait
    pub fn take(&mut self) -> QueryState {
        std::mem::take(&mut self.state)
    }
}
