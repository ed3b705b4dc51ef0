//! Configuration du système

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use geolandy::{AreaPolicy, LayerSource, LoadOptions, ParcelFields, ZoneFields};

/// Variables d'environnement prises en compte
pub const ENV_PARCELS: &str = "GEOLANDY_PARCELS";
pub const ENV_ZONES: &str = "GEOLANDY_ZONES";
pub const ENV_POLICY: &str = "GEOLANDY_POLICY";

/// Configuration principale
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Couche des prédios
    pub parcels: LayerSource,

    /// Couche de zonification environnementale
    pub zones: LayerSource,

    /// Noms des attributs de la couche prédios
    #[serde(default)]
    pub parcel_fields: ParcelFields,

    /// Noms des attributs de la couche de zonification
    #[serde(default)]
    pub zone_fields: ZoneFields,

    /// Calcul de la surface affectée (raw-sum ou union)
    #[serde(default)]
    pub policy: AreaPolicy,

    /// Calculer la limite de la réserve au chargement
    #[serde(default = "default_true")]
    pub reserve_boundary: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "bogota" => Self::load_embedded(include_str!("presets/bogota.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: bogota", preset),
        }
    }

    /// Nom de preset ou chemin vers un fichier JSON
    pub fn from_spec(spec: &str) -> Result<Self> {
        match spec {
            "bogota" => Self::from_preset(spec),
            _ => Self::load(Path::new(spec)),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Applique les surcharges des variables d'environnement
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applique des surcharges lues via `lookup` (clé -> valeur)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty(ENV_PARCELS) {
            debug!(key = ENV_PARCELS, path = %path, "Config override");
            self.parcels.path = PathBuf::from(path);
        }
        if let Some(path) = non_empty(ENV_ZONES) {
            debug!(key = ENV_ZONES, path = %path, "Config override");
            self.zones.path = PathBuf::from(path);
        }
        if let Some(policy) = non_empty(ENV_POLICY) {
            self.policy = policy
                .parse()
                .context(format!("Invalid {} value", ENV_POLICY))?;
        }

        Ok(())
    }

    /// Options de chargement pour le cœur
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            parcels: self.parcels.clone(),
            zones: self.zones.clone(),
            parcel_fields: self.parcel_fields.clone(),
            zone_fields: self.zone_fields.clone(),
            reserve_boundary: self.reserve_boundary,
        }
    }
}
