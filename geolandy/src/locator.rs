//! Recherche de prédios par code CHIP ou par coordonnées planes

use std::sync::OnceLock;

use geo::{Intersects, Point};
use regex::Regex;
use tracing::debug;

use crate::types::{ParcelLayer, ParcelRecord};
use crate::GeolandyError;

/// Format CHIP : 3 lettres, 4 chiffres, 4 lettres
const CHIP_PATTERN: &str = r"^[A-Za-z]{3}[0-9]{4}[A-Za-z]{4}$";

fn chip_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CHIP_PATTERN).expect("CHIP pattern is a valid regex"))
}

/// Valide la syntaxe d'un code CHIP (insensible à la casse)
pub fn validate_code(code: &str) -> Result<(), GeolandyError> {
    if code.trim().is_empty() {
        return Err(GeolandyError::validation("please enter a CHIP code"));
    }
    if !chip_regex().is_match(code) {
        return Err(GeolandyError::validation(format!(
            "invalid CHIP format '{}': expected 3 letters + 4 digits + 4 letters (e.g. AAA0143FTRS)",
            code
        )));
    }
    Ok(())
}

/// Recherche exacte par code.
///
/// Le code est validé avant la recherche ; une absence de résultat n'est pas
/// une erreur (`Ok(vec![])`).
pub fn find_by_code<'a>(
    parcels: &'a ParcelLayer,
    code: &str,
) -> Result<Vec<&'a ParcelRecord>, GeolandyError> {
    validate_code(code)?;

    let matches: Vec<_> = parcels.iter().filter(|p| p.id == code).collect();
    debug!(code, matches = matches.len(), "Lookup by code");
    Ok(matches)
}

/// Recherche par point (coordonnées du système plan).
///
/// Retourne tous les prédios qui intersectent le point, limite comprise.
pub fn find_by_point(
    parcels: &ParcelLayer,
    x: f64,
    y: f64,
) -> Result<Vec<&ParcelRecord>, GeolandyError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(GeolandyError::validation(format!(
            "coordinates must be finite numbers, got ({}, {})",
            x, y
        )));
    }

    let point = Point::new(x, y);
    let matches: Vec<_> = parcels
        .iter()
        .filter(|p| p.geometry.intersects(&point))
        .collect();
    debug!(x, y, matches = matches.len(), "Lookup by point");
    Ok(matches)
}
