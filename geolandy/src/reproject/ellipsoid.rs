//! Définitions des ellipsoïdes

/// Ellipsoïde GRS80 (MAGNA-SIRGAS)
/// Note: Quasi identique à WGS84, différence < 0.1mm
pub struct GRS80;

impl GRS80 {
    /// Demi-grand axe (rayon équatorial) en mètres
    pub const A: f64 = 6378137.0;

    /// Aplatissement
    pub const F: f64 = 1.0 / 298.257222101;

    /// Première excentricité au carré
    pub const E2: f64 = 2.0 * Self::F - Self::F * Self::F;

    /// Deuxième excentricité au carré
    pub const EP2: f64 = Self::E2 / (1.0 - Self::E2);
}

/// Ellipsoïde WGS84 (seul le demi-grand axe sert à Web Mercator)
pub struct WGS84;

impl WGS84 {
    pub const A: f64 = 6378137.0;
}
