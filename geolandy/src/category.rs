//! Catégories de zonification environnementale et leurs couleurs d'affichage

use std::fmt;

use serde::{Serialize, Serializer};

/// Couleur neutre pour les catégories hors nomenclature
pub const FALLBACK_COLOR: &str = "#808080";

/// Catégorie de zonification de la réserve forestière
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ZoneCategory {
    /// Zona de Preservación
    Preservation,
    /// Zona de Restauración
    Restoration,
    /// Zona de uso Sostenible
    SustainableUse,
    /// Zona general de uso Público
    PublicUse,
    /// Zona de Recuperación Ambiental
    EnvironmentalRecovery,
    /// Valeur présente dans les données mais hors nomenclature (qualité des données)
    Other(String),
}

impl ZoneCategory {
    /// Les cinq catégories connues, dans l'ordre d'affichage
    pub const KNOWN: [ZoneCategory; 5] = [
        ZoneCategory::Preservation,
        ZoneCategory::Restoration,
        ZoneCategory::SustainableUse,
        ZoneCategory::PublicUse,
        ZoneCategory::EnvironmentalRecovery,
    ];

    /// Interprète le libellé de l'attribut de zonification.
    ///
    /// La comparaison ignore la casse, les accents et les espaces superflus :
    /// `"Zona de Preservacion"` et `"ZONA DE PRESERVACIÓN"` donnent la même catégorie.
    pub fn from_label(label: &str) -> Self {
        match normalize(label).as_str() {
            "zona de preservacion" => Self::Preservation,
            "zona de restauracion" => Self::Restoration,
            "zona de uso sostenible" => Self::SustainableUse,
            "zona general de uso publico" => Self::PublicUse,
            "zona de recuperacion ambiental" => Self::EnvironmentalRecovery,
            _ => Self::Other(label.trim().to_string()),
        }
    }

    /// Libellé canonique (celui des données sources)
    pub fn label(&self) -> &str {
        match self {
            Self::Preservation => "Zona de Preservacion",
            Self::Restoration => "Zona de Restauracion",
            Self::SustainableUse => "Zona de uso Sostenible",
            Self::PublicUse => "Zona general de uso Publico",
            Self::EnvironmentalRecovery => "Zona de Recuperacion Ambiental",
            Self::Other(label) => label,
        }
    }

    /// Couleur d'affichage (hex RGB)
    pub fn color(&self) -> &'static str {
        match self {
            Self::Preservation => "#006400",
            Self::Restoration => "#FFA500",
            Self::SustainableUse => "#FFFF00",
            Self::PublicUse => "#FF69B4",
            Self::EnvironmentalRecovery => "#D3D3D3",
            Self::Other(_) => FALLBACK_COLOR,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for ZoneCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ZoneCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Minuscules, sans accents, espaces simples
fn normalize(label: &str) -> String {
    let folded: String = label
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'Á' | 'À' => 'a',
            'é' | 'è' | 'É' | 'È' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'ü' | 'Ú' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            c => c.to_ascii_lowercase(),
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
