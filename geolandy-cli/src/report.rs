//! Rapport de consultation d'un prédio
//!
//! Regroupe les surfaces formatées, la répartition par catégorie et le
//! détail de chaque zone intersectée. Affichable sur la console et
//! sérialisable en JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use geolandy::area::format_percent;
use geolandy::{
    format_area, AreaPolicy, Assessment, IntersectionFragment, QueryRequest, QueryState,
};

/// Issue de la consultation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportStatus {
    /// Prédio dans la réserve, au moins une zone intersectée
    Affected,
    /// Prédio trouvé, hors zonification
    NotAffected,
    /// Aucun prédio ne correspond
    NotFound,
    /// Requête mal formée
    Invalid,
}

/// Surfaces du prédio
#[derive(Debug, Clone, Serialize)]
pub struct AreaSummary {
    pub total_m2: f64,
    pub total: String,
    pub affected_m2: f64,
    pub affected: String,
    pub unaffected_m2: f64,
    pub unaffected: String,
    pub percent_affected: f64,
    pub percent_unaffected: f64,
    pub policy: AreaPolicy,
}

/// Ligne de la répartition par catégorie
#[derive(Debug, Clone, Serialize)]
pub struct CategoryLine {
    pub category: String,
    pub color: &'static str,
    pub area_m2: f64,
    pub area: String,
    pub percent: f64,
}

/// Détail d'une zone intersectée
#[derive(Debug, Clone, Serialize)]
pub struct ZoneDetail {
    pub category: String,
    pub color: &'static str,
    pub description: String,
    pub legal_reference: String,
    pub permitted: Vec<String>,
    pub prohibited: Vec<String>,
    pub area_m2: f64,
    pub area: String,
}

impl ZoneDetail {
    fn from_fragment(fragment: &IntersectionFragment, report_style: bool) -> Result<Self> {
        Ok(Self {
            category: fragment.category.label().to_string(),
            color: fragment.category.color(),
            description: fragment.description.clone(),
            legal_reference: fragment.legal_reference.clone(),
            permitted: to_owned(fragment.permitted_activities()),
            prohibited: to_owned(fragment.prohibited_activities()),
            area_m2: fragment.area,
            area: format_area(fragment.area, report_style)?,
        })
    }
}

fn to_owned(statements: Vec<&str>) -> Vec<String> {
    statements.into_iter().map(str::to_string).collect()
}

/// Rapport complet d'une consultation
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    /// Requête telle que saisie
    pub request: String,

    /// Identifiant du prédio de référence
    pub reference: Option<String>,

    pub status: ReportStatus,

    /// Message pour les issues sans prédio
    pub message: Option<String>,

    /// Nombre de prédios correspondant à la requête
    pub matches: usize,

    pub areas: Option<AreaSummary>,
    pub by_category: Vec<CategoryLine>,
    pub zones: Vec<ZoneDetail>,
}

impl QueryReport {
    fn empty(request: &QueryRequest, status: ReportStatus) -> Self {
        Self {
            request: request.to_string(),
            reference: None,
            status,
            message: None,
            matches: 0,
            areas: None,
            by_category: Vec::new(),
            zones: Vec::new(),
        }
    }

    /// Rapport d'une requête restée sans prédio (`NotFound`, `Invalid`).
    ///
    /// Retourne `None` pour les autres états.
    pub fn unresolved(request: &QueryRequest, state: &QueryState) -> Option<Self> {
        let (status, message) = match state {
            QueryState::NotFound { message } => (ReportStatus::NotFound, message),
            QueryState::Invalid { message } => (ReportStatus::Invalid, message),
            QueryState::Empty | QueryState::Found(_) => return None,
        };
        Some(Self {
            message: Some(message.clone()),
            ..Self::empty(request, status)
        })
    }

    /// Rapport d'un prédio évalué
    pub fn assessed(
        request: &QueryRequest,
        reference: &str,
        matches: usize,
        assessment: &Assessment,
        report_style: bool,
    ) -> Result<Self> {
        let mut report = Self::empty(request, ReportStatus::NotAffected);
        report.reference = Some(reference.to_string());
        report.matches = matches;

        let fmt = |value: f64| format_area(value, report_style);

        match assessment {
            Assessment::NotAffected {
                total_area, policy, ..
            } => {
                report.areas = Some(AreaSummary {
                    total_m2: *total_area,
                    total: fmt(*total_area)?,
                    affected_m2: 0.0,
                    affected: fmt(0.0)?,
                    unaffected_m2: *total_area,
                    unaffected: fmt(*total_area)?,
                    percent_affected: 0.0,
                    percent_unaffected: 100.0,
                    policy: *policy,
                });
            }
            Assessment::Affected(result) => {
                report.status = ReportStatus::Affected;
                report.areas = Some(AreaSummary {
                    total_m2: result.total_area,
                    total: fmt(result.total_area)?,
                    affected_m2: result.affected_area,
                    affected: fmt(result.affected_area)?,
                    unaffected_m2: result.unaffected_area,
                    unaffected: fmt(result.unaffected_area)?,
                    percent_affected: result.percent_affected,
                    percent_unaffected: result.percent_unaffected,
                    policy: result.policy,
                });

                report.by_category = result
                    .by_category()
                    .into_iter()
                    .map(|c| {
                        Ok(CategoryLine {
                            category: c.category.label().to_string(),
                            color: c.category.color(),
                            area_m2: c.area,
                            area: fmt(c.area)?,
                            percent: c.percent,
                        })
                    })
                    .collect::<Result<_>>()?;

                report.zones = result
                    .fragments
                    .iter()
                    .map(|f| ZoneDetail::from_fragment(f, report_style))
                    .collect::<Result<_>>()?;
            }
        }

        Ok(report)
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        match &self.reference {
            Some(reference) => println!("PARCEL REPORT - {}", reference),
            None => println!("PARCEL REPORT - {}", self.request),
        }
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        if let Some(message) = &self.message {
            println!("{}", message);
        }
        if self.matches > 1 {
            println!(
                "{} parcels match the request, the first one is assessed",
                self.matches
            );
        }

        if let Some(areas) = &self.areas {
            println!("\n--- AREAS ---");
            println!("Total area:      {}", areas.total);
            println!(
                "Affected area:   {} ({})",
                areas.affected,
                format_percent(areas.percent_affected)
            );
            println!(
                "Unaffected area: {} ({})",
                areas.unaffected,
                format_percent(areas.percent_unaffected)
            );
            if areas.unaffected_m2 < 0.0 {
                println!(
                    "  (overlapping zones are counted once per zone, policy {})",
                    areas.policy
                );
            }
        }

        if !self.by_category.is_empty() {
            println!("\n--- BY CATEGORY ---");
            for line in &self.by_category {
                println!(
                    "  [{}] {}: {} ({})",
                    line.color,
                    line.category,
                    line.area,
                    format_percent(line.percent)
                );
            }
        }

        if !self.zones.is_empty() {
            println!("\n--- ZONES ({}) ---", self.zones.len());
            for (i, zone) in self.zones.iter().enumerate() {
                println!("\n  {}. {} - {}", i + 1, zone.category, zone.area);
                if !zone.description.is_empty() {
                    println!("     Description: {}", zone.description);
                }
                if !zone.legal_reference.is_empty() {
                    println!("     Legal reference: {}", zone.legal_reference);
                }
                print_statements("Permitted", &zone.permitted);
                print_statements("Prohibited", &zone.prohibited);
            }
        }

        if self.status == ReportStatus::NotAffected {
            println!("\nThe parcel is outside the reserve zoning.");
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .context(format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        let subject = self.reference.as_deref().unwrap_or(&self.request);
        match (&self.areas, &self.message) {
            (Some(areas), _) => format!(
                "{}: {:?}, {} affected of {}",
                subject,
                self.status,
                format_percent(areas.percent_affected),
                areas.total
            ),
            (None, Some(message)) => format!("{}: {:?}, {}", subject, self.status, message),
            (None, None) => format!("{}: {:?}", subject, self.status),
        }
    }
}

fn print_statements(label: &str, statements: &[String]) {
    if statements.is_empty() {
        return;
    }
    println!("     {}:", label);
    for statement in statements {
        println!("       - {}", statement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use geolandy::{overlay, ParcelRecord, ZoneCategory, ZoneLayer, ZoneRecord};
    use std::collections::HashMap;

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]])
    }

    fn zone(category: &str, geometry: MultiPolygon) -> ZoneRecord {
        ZoneRecord {
            geometry,
            category: ZoneCategory::from_label(category),
            description: "Bosque".to_string(),
            legal_reference: "Res. 1766 de 2016".to_string(),
            permitted: "Investigacion. Monitoreo.".to_string(),
            prohibited: "Mineria.".to_string(),
            properties: HashMap::new(),
        }
    }

    fn request() -> QueryRequest {
        QueryRequest::Code("AAA0143FTRS".to_string())
    }

    fn affected_report(report_style: bool) -> QueryReport {
        let parcel = ParcelRecord {
            id: "AAA0143FTRS".to_string(),
            geometry: square(0.0, 0.0, 200.0),
            properties: HashMap::new(),
        };
        let zones = ZoneLayer::new(vec![
            zone("Zona de Restauracion", square(100.0, 0.0, 200.0)),
            zone("Zona de Preservacion", square(-50.0, -50.0, 100.0)),
        ]);
        let result = overlay(&parcel, &zones, AreaPolicy::RawSum).unwrap();
        QueryReport::assessed(
            &request(),
            "AAA0143FTRS",
            1,
            &Assessment::Affected(result),
            report_style,
        )
        .unwrap()
    }

    #[test]
    fn test_affected_report() {
        let report = affected_report(false);

        assert_eq!(report.status, ReportStatus::Affected);
        let areas = report.areas.as_ref().unwrap();
        assert_eq!(areas.total, "4.00 ha");
        assert_eq!(areas.affected, "2.25 ha");
        assert!((areas.percent_affected - 56.25).abs() < 1e-9);

        // Ordre de la nomenclature, pas celui de la couche
        assert_eq!(report.by_category.len(), 2);
        assert_eq!(report.by_category[0].category, "Zona de Preservacion");
        assert_eq!(report.by_category[0].color, "#006400");
        assert_eq!(report.by_category[1].area, "2.00 ha");

        assert_eq!(report.zones[0].permitted, vec!["Investigacion", "Monitoreo"]);
        assert_eq!(report.zones[0].prohibited, vec!["Mineria"]);
    }

    #[test]
    fn test_report_style_areas() {
        let report = affected_report(true);
        let areas = report.areas.as_ref().unwrap();
        assert_eq!(areas.total, "4.00 ha (40,000.00 m²)");
        assert_eq!(report.zones[1].area, "0.25 ha (2,500.00 m²)");
    }

    #[test]
    fn test_not_affected_report() {
        let assessment = Assessment::NotAffected {
            parcel_id: "AAA0143FTRS".to_string(),
            total_area: 812.5,
            policy: AreaPolicy::RawSum,
        };
        let report =
            QueryReport::assessed(&request(), "AAA0143FTRS", 2, &assessment, false).unwrap();

        assert_eq!(report.status, ReportStatus::NotAffected);
        assert_eq!(report.matches, 2);
        let areas = report.areas.as_ref().unwrap();
        assert_eq!(areas.total, "812.50 m²");
        assert_eq!(areas.percent_unaffected, 100.0);
        assert!(report.zones.is_empty());
    }

    #[test]
    fn test_not_affected_report_keeps_union_policy() {
        let assessment = Assessment::NotAffected {
            parcel_id: "AAA0143FTRS".to_string(),
            total_area: 812.5,
            policy: AreaPolicy::Union,
        };
        let report =
            QueryReport::assessed(&request(), "AAA0143FTRS", 1, &assessment, false).unwrap();
        assert_eq!(report.areas.as_ref().unwrap().policy, AreaPolicy::Union);

        let path = std::env::temp_dir().join("geolandy_report_union_test.json");
        report.save_to_file(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["areas"]["policy"], "union");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_unresolved_report() {
        let state = QueryState::NotFound {
            message: "No parcel found for CHIP AAA0143FTRS".to_string(),
        };
        let report = QueryReport::unresolved(&request(), &state).unwrap();
        assert_eq!(report.status, ReportStatus::NotFound);
        assert!(report.summary().contains("No parcel found"));

        assert!(QueryReport::unresolved(&request(), &QueryState::Empty).is_none());
    }

    #[test]
    fn test_save_to_file() {
        let report = affected_report(false);
        let path = std::env::temp_dir().join("geolandy_report_test.json");

        report.save_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["status"], "Affected");
        assert_eq!(json["reference"], "AAA0143FTRS");
        assert_eq!(json["areas"]["policy"], "raw-sum");
        assert_eq!(json["by_category"][0]["category"], "Zona de Preservacion");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_summary() {
        let summary = affected_report(false).summary();
        assert!(summary.starts_with("AAA0143FTRS"));
        assert!(summary.contains("56.25%"));
    }
}
