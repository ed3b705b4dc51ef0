//! Export GeoJSON d'une consultation avec geozero (streaming)
//!
//! Le contour du prédio et les fragments de zonification sont reprojetés dans
//! le système d'affichage (EPSG:4326). Chaque fragment porte sa catégorie et
//! sa couleur pour la symbologie.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geo::{Geometry, MultiPolygon};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use tracing::debug;

use geolandy::reproject::SmartReprojector;
use geolandy::{OverlayResult, ParcelRecord, DISPLAY_EPSG, PLANAR_EPSG};

/// Valeur d'attribut exportée
#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Number(f64),
}

/// Feature prête à écrire
#[derive(Debug)]
struct ExportFeature {
    id: String,
    geometry: Geometry,
    properties: Vec<(&'static str, Value)>,
}

/// Exporte le prédio, ses fragments et, si fournie, la limite de la réserve.
///
/// Retourne le nombre de features écrites.
pub fn export_assessment(
    parcel: &ParcelRecord,
    overlay: Option<&OverlayResult>,
    reserve: Option<&MultiPolygon>,
    output_path: &Path,
) -> Result<usize> {
    let reprojector = SmartReprojector::new(PLANAR_EPSG, DISPLAY_EPSG)
        .context("Failed to create display reprojector")?;

    let features = collect_features(parcel, overlay, reserve, &reprojector)?;

    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    write_collection(&mut writer, &features, DISPLAY_EPSG)?;
    writer.flush()?;

    debug!(
        path = %output_path.display(),
        features = features.len(),
        reprojector = reprojector.description(),
        "GeoJSON written"
    );

    Ok(features.len())
}

fn collect_features(
    parcel: &ParcelRecord,
    overlay: Option<&OverlayResult>,
    reserve: Option<&MultiPolygon>,
    reprojector: &SmartReprojector,
) -> Result<Vec<ExportFeature>> {
    let display = |mp: &MultiPolygon| -> Result<Geometry> {
        let mp = reprojector
            .transform_multipolygon(mp)
            .context("Failed to reproject geometry for display")?;
        Ok(Geometry::MultiPolygon(mp))
    };

    let mut features = Vec::new();

    if let Some(reserve) = reserve {
        features.push(ExportFeature {
            id: "reserve".to_string(),
            geometry: display(reserve)?,
            properties: vec![("layer", Value::Text("reserve".to_string()))],
        });
    }

    let mut parcel_properties = vec![
        ("layer", Value::Text("parcel".to_string())),
        ("chip", Value::Text(parcel.id.clone())),
    ];
    if let Some(result) = overlay {
        parcel_properties.push(("area_m2", Value::Number(result.total_area)));
        parcel_properties.push(("percent_affected", Value::Number(result.percent_affected)));
    }
    features.push(ExportFeature {
        id: parcel.id.clone(),
        geometry: display(&parcel.geometry)?,
        properties: parcel_properties,
    });

    for (i, fragment) in overlay.iter().flat_map(|r| r.fragments.iter()).enumerate() {
        features.push(ExportFeature {
            id: format!("{}-{}", parcel.id, i + 1),
            geometry: display(&fragment.geometry)?,
            properties: vec![
                ("layer", Value::Text("fragment".to_string())),
                ("category", Value::Text(fragment.category.label().to_string())),
                ("color", Value::Text(fragment.category.color().to_string())),
                ("description", Value::Text(fragment.description.clone())),
                ("legal_reference", Value::Text(fragment.legal_reference.clone())),
                ("area_m2", Value::Number(fragment.area)),
            ],
        });
    }

    Ok(features)
}

fn write_collection<W: Write>(writer: &mut W, features: &[ExportFeature], epsg: u32) -> Result<()> {
    // Header FeatureCollection avec CRS
    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"features":["#,
        epsg
    )?;

    for (i, feature) in features.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, feature)?;
    }

    write!(writer, "]}}")?;
    Ok(())
}

/// Écrit une feature en GeoJSON
fn write_feature<W: Write>(writer: &mut W, feature: &ExportFeature) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"Feature","id":"{}","#,
        escape_json(&feature.id)
    )?;

    write!(writer, r#""geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    feature.geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":{{"#)?;
    for (i, (key, value)) in feature.properties.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        match value {
            Value::Text(text) => write!(writer, r#""{}":"{}""#, key, escape_json(text))?,
            // NaN / infini ne sont pas du JSON valide
            Value::Number(n) if n.is_finite() => write!(writer, r#""{}":{}"#, key, n)?,
            Value::Number(_) => write!(writer, r#""{}":null"#, key)?,
        }
    }
    write!(writer, "}}}}")?;

    Ok(())
}

/// Échappe une chaîne pour JSON
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use geolandy::{overlay, AreaPolicy, ZoneCategory, ZoneLayer, ZoneRecord};
    use std::collections::HashMap;

    // Autour de l'origine d'Origen-Nacional (-73°, 4°)
    const X0: f64 = 5_000_000.0;
    const Y0: f64 = 2_000_000.0;

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon {
        let (x0, y0) = (X0 + x0, Y0 + y0);
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]])
    }

    fn fixture() -> (ParcelRecord, OverlayResult) {
        let parcel = ParcelRecord {
            id: "AAA0143FTRS".to_string(),
            geometry: square(0.0, 0.0, 100.0),
            properties: HashMap::new(),
        };
        let zones = ZoneLayer::new(vec![ZoneRecord {
            geometry: square(50.0, 0.0, 100.0),
            category: ZoneCategory::Preservation,
            description: "Bosque \"alto\" andino".to_string(),
            legal_reference: "Res. 1766".to_string(),
            permitted: String::new(),
            prohibited: String::new(),
            properties: HashMap::new(),
        }]);
        let result = overlay(&parcel, &zones, AreaPolicy::RawSum).unwrap();
        (parcel, result)
    }

    #[test]
    fn test_escape_json() {
        assert_eq!(escape_json("hello"), "hello");
        assert_eq!(escape_json("hello\"world"), "hello\\\"world");
        assert_eq!(escape_json("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn test_write_feature_properties() {
        let feature = ExportFeature {
            id: "f1".to_string(),
            geometry: Geometry::MultiPolygon(square(0.0, 0.0, 1.0)),
            properties: vec![
                ("color", Value::Text("#006400".to_string())),
                ("area_m2", Value::Number(2500.5)),
                ("bad", Value::Number(f64::NAN)),
            ],
        };

        let mut buffer = Vec::new();
        write_feature(&mut buffer, &feature).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(json["id"], "f1");
        assert_eq!(json["geometry"]["type"], "MultiPolygon");
        assert_eq!(json["properties"]["color"], "#006400");
        assert_eq!(json["properties"]["area_m2"], 2500.5);
        assert!(json["properties"]["bad"].is_null());
    }

    #[test]
    fn test_export_assessment() {
        let (parcel, result) = fixture();
        let output_path = std::env::temp_dir().join("geolandy_export_test.geojson");

        let count = export_assessment(&parcel, Some(&result), None, &output_path).unwrap();
        assert_eq!(count, 2);

        let content = std::fs::read_to_string(&output_path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert!(content.contains("EPSG::4326"));

        let features = json["features"].as_array().unwrap();
        assert_eq!(features[0]["properties"]["chip"], "AAA0143FTRS");
        assert_eq!(features[1]["properties"]["color"], "#006400");
        assert_eq!(features[1]["properties"]["description"], "Bosque \"alto\" andino");

        // Coordonnées en degrés, proches de l'origine (-73°, 4°)
        let first = &features[0]["geometry"]["coordinates"][0][0][0];
        let lon = first[0].as_f64().unwrap();
        let lat = first[1].as_f64().unwrap();
        assert!((lon + 73.0).abs() < 0.01, "lon={}", lon);
        assert!((lat - 4.0).abs() < 0.01, "lat={}", lat);

        std::fs::remove_file(output_path).ok();
    }

    #[test]
    fn test_export_with_reserve() {
        let (parcel, _) = fixture();
        let reserve = square(-1000.0, -1000.0, 3000.0);
        let output_path = std::env::temp_dir().join("geolandy_export_reserve_test.geojson");

        let count = export_assessment(&parcel, None, Some(&reserve), &output_path).unwrap();
        assert_eq!(count, 2);

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains(r#""layer":"reserve""#));
        assert!(!content.contains(r#""layer":"fragment""#));

        std::fs::remove_file(output_path).ok();
    }
}
