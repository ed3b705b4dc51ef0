//! Mise en forme des surfaces

use crate::GeolandyError;

/// Nombre de m² dans un hectare
pub const M2_PER_HECTARE: f64 = 10_000.0;

/// Formate une surface exprimée en m².
///
/// - `report_style` : toujours `"<ha> ha (<m²> m²)"`
/// - sinon : m² en dessous d'un hectare, hectares au-delà
///
/// Deux décimales, séparateur de milliers `,`. Une valeur négative (surface
/// non affectée en cas de double comptage) garde son signe.
pub fn format_area(area_m2: f64, report_style: bool) -> Result<String, GeolandyError> {
    if !area_m2.is_finite() {
        return Err(GeolandyError::validation(format!(
            "area must be a finite number, got {}",
            area_m2
        )));
    }

    let area_ha = area_m2 / M2_PER_HECTARE;

    if report_style {
        return Ok(format!(
            "{} ha ({} m²)",
            format_number(area_ha, 2),
            format_number(area_m2, 2)
        ));
    }

    if area_m2 < M2_PER_HECTARE {
        Ok(format!("{} m²", format_number(area_m2, 2)))
    } else {
        Ok(format!("{} ha", format_number(area_ha, 2)))
    }
}

/// Pourcentage à deux décimales (`"12.34%"`)
pub fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

/// Nombre avec séparateur de milliers
pub fn format_number(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    // Pas de "-0.00"
    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        grouped.insert(0, '-');
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interactive_style() {
        assert_eq!(format_area(9999.0, false).unwrap(), "9,999.00 m²");
        assert_eq!(format_area(10000.0, false).unwrap(), "1.00 ha");
        assert_eq!(format_area(0.0, false).unwrap(), "0.00 m²");
        assert_eq!(format_area(1_234_567.0, false).unwrap(), "123.46 ha");
    }

    #[test]
    fn test_report_style() {
        assert_eq!(
            format_area(12345.0, true).unwrap(),
            "1.23 ha (12,345.00 m²)"
        );
        assert_eq!(format_area(50_000.0, true).unwrap(), "5.00 ha (50,000.00 m²)");
    }

    #[test]
    fn test_negative_area() {
        assert_eq!(format_area(-5000.0, false).unwrap(), "-5,000.00 m²");
        assert_eq!(format_number(-0.001, 2), "0.00");
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(format_area(f64::NAN, false).is_err());
        assert!(format_area(f64::INFINITY, true).is_err());
    }

    #[test]
    fn test_deterministic() {
        for value in [0.5, 999.99, 9999.994, 10_000.0, 86_420.137, 3.2e7] {
            let first = format_area(value, false).unwrap();
            let second = format_area(value, false).unwrap();
            assert_eq!(first, second);
            assert_eq!(format_area(value, true).unwrap(), format_area(value, true).unwrap());
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1_000_000.0, 2), "1,000,000.00");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1234.5, 1), "1,234.5");
        assert_eq!(format_percent(76.0), "76.00%");
    }
}
