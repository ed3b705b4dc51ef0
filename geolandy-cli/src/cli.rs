//! Définition et implémentation des commandes CLI
//!
//! - `query` : consultation unique (code CHIP ou coordonnées)
//! - `session` : consultations successives lues sur l'entrée standard
//! - `zones` : résumé de la couche de zonification

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use geo::{Area, BoundingRect};
use tracing::{info, warn};

use geolandy::area::{format_number, format_percent};
use geolandy::reproject::SmartReprojector;
use geolandy::{
    assess, format_area, lookup, AreaPolicy, Datasets, QueryRequest, QuerySlot, QueryState,
    ZoneCategory, DISPLAY_EPSG, PLANAR_EPSG,
};
use geolandy_cli::export::export_assessment;
use geolandy_cli::{Config, QueryReport};

#[derive(Subcommand)]
pub enum Commands {
    /// Assess a single parcel by CHIP code or by planar coordinates
    Query {
        /// CHIP code (3 letters, 4 digits, 4 letters, e.g. AAA0143FTRS)
        #[arg(short, long, conflicts_with_all = ["x", "y"])]
        code: Option<String>,

        /// X coordinate in EPSG:9377 (meters)
        #[arg(short, long, requires = "y", allow_negative_numbers = true)]
        x: Option<f64>,

        /// Y coordinate in EPSG:9377 (meters)
        #[arg(short, long, requires = "x", allow_negative_numbers = true)]
        y: Option<f64>,

        /// Affected area policy: raw-sum (default) or union
        #[arg(long)]
        policy: Option<AreaPolicy>,

        /// Write the report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Write the parcel and its zoning fragments as GeoJSON (EPSG:4326)
        #[arg(long)]
        geojson: Option<PathBuf>,

        /// Always show areas as "<ha> ha (<m²> m²)"
        #[arg(long)]
        report_style: bool,
    },

    /// Interactive session: one active query, commands read from stdin
    Session {
        /// Affected area policy: raw-sum (default) or union
        #[arg(long)]
        policy: Option<AreaPolicy>,

        /// Always show areas as "<ha> ha (<m²> m²)"
        #[arg(long)]
        report_style: bool,
    },

    /// Summary of the zoning layer per category
    Zones,
}

/// Options d'une consultation unique
pub struct QueryArgs {
    pub code: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub policy: Option<AreaPolicy>,
    pub report: Option<PathBuf>,
    pub geojson: Option<PathBuf>,
    pub report_style: bool,
}

/// Charge les deux couches (fatal en cas d'échec)
fn load_datasets(config: &Config) -> Result<Datasets> {
    check_sources(config)?;
    info!(
        parcels = %config.parcels.path.display(),
        zones = %config.zones.path.display(),
        "Loading datasets"
    );
    geolandy::load(&config.load_options()).context("Failed to load datasets")
}

/// Construit la requête à partir des options `--code` / `--x --y`
fn build_request(code: Option<String>, x: Option<f64>, y: Option<f64>) -> Result<QueryRequest> {
    match (code, x, y) {
        (Some(code), None, None) => Ok(QueryRequest::Code(code.trim().to_string())),
        (None, Some(x), Some(y)) => Ok(QueryRequest::Point { x, y }),
        (Some(_), _, _) => anyhow::bail!("Use either --code or --x/--y, not both"),
        _ => anyhow::bail!("A CHIP code (--code) or both coordinates (--x, --y) are required"),
    }
}

/// Exécute la commande query
pub fn cmd_query(config: &Config, args: QueryArgs) -> Result<()> {
    let request = build_request(args.code, args.x, args.y)?;
    let policy = args.policy.unwrap_or(config.policy);
    let datasets = load_datasets(config)?;

    let state = lookup(&datasets, &request);

    let report = match &state {
        QueryState::Found(selection) => {
            let assessment = assess(selection, &datasets.zones, policy)
                .context(format!("Failed to assess parcel {}", selection.reference))?;

            if let Some(path) = &args.geojson {
                let parcel = selection.primary().context("Empty selection")?;
                let count = export_assessment(
                    parcel,
                    assessment.overlay(),
                    datasets.reserve.as_ref(),
                    path,
                )?;
                info!(path = %path.display(), features = count, "GeoJSON exported");
            }

            QueryReport::assessed(
                &request,
                &selection.reference,
                selection.parcels.len(),
                &assessment,
                args.report_style,
            )?
        }
        _ => QueryReport::unresolved(&request, &state)
            .context("Query produced no result state")?,
    };

    report.display();

    if let Some(path) = &args.report {
        report.save_to_file(path)?;
        info!(path = %path.display(), "Report saved");
    }

    if let QueryState::Invalid { message } = &state {
        anyhow::bail!("Invalid query: {}", message);
    }

    Ok(())
}

/// Commande saisie pendant une session
#[derive(Debug, Clone, PartialEq)]
enum SessionCommand {
    Query(QueryRequest),
    Show,
    Reset,
    Help,
    Quit,
}

/// Interprète une ligne de session. Ligne vide -> `None`.
fn parse_session_line(line: &str) -> Result<Option<SessionCommand>> {
    let mut parts = line.split_whitespace();
    let Some(keyword) = parts.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = parts.collect();

    let command = match keyword.to_ascii_lowercase().as_str() {
        "code" | "chip" => match rest.as_slice() {
            [code] => SessionCommand::Query(QueryRequest::Code(code.to_string())),
            _ => anyhow::bail!("Usage: code <CHIP>"),
        },
        "point" | "xy" => {
            let coords: Vec<&str> = rest
                .iter()
                .flat_map(|part| part.split(','))
                .filter(|part| !part.is_empty())
                .collect();
            match coords.as_slice() {
                [x, y] => {
                    let x: f64 = x.parse().context(format!("Invalid X coordinate: {}", x))?;
                    let y: f64 = y.parse().context(format!("Invalid Y coordinate: {}", y))?;
                    SessionCommand::Query(QueryRequest::Point { x, y })
                }
                _ => anyhow::bail!("Usage: point <X> <Y>"),
            }
        }
        "show" => SessionCommand::Show,
        "reset" | "clear" => SessionCommand::Reset,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        other => anyhow::bail!("Unknown command: {} (type 'help')", other),
    };

    Ok(Some(command))
}

const SESSION_HELP: &str = "Commands:
  code <CHIP>     look up a parcel by CHIP code (e.g. AAA0143FTRS)
  point <X> <Y>   look up a parcel by EPSG:9377 coordinates
  show            show the active query again
  reset           clear the active query
  quit            leave the session";

/// Exécute la commande session
pub fn cmd_session(config: &Config, policy: Option<AreaPolicy>, report_style: bool) -> Result<()> {
    let policy = policy.unwrap_or(config.policy);
    let datasets = load_datasets(config)?;

    println!(
        "{} parcels, {} zones loaded (policy {}). Type 'help' for commands.",
        datasets.parcels.len(),
        datasets.zones.len(),
        policy
    );

    let stdin = std::io::stdin();
    run_session(&datasets, policy, report_style, stdin.lock())
}

fn run_session<R: BufRead>(
    datasets: &Datasets,
    policy: AreaPolicy,
    report_style: bool,
    input: R,
) -> Result<()> {
    let mut slot = QuerySlot::new();
    let mut last_request: Option<QueryRequest> = None;
    let mut lines = input.lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        let command = match parse_session_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            SessionCommand::Query(request) => {
                slot.submit(datasets, &request);
                show_state(datasets, &request, slot.state(), policy, report_style);
                last_request = Some(request);
            }
            SessionCommand::Show => match &last_request {
                Some(request) if !slot.state().is_empty() => {
                    show_state(datasets, request, slot.state(), policy, report_style)
                }
                _ => println!("No active query"),
            },
            SessionCommand::Reset => {
                slot.reset();
                last_request = None;
                println!("Query cleared");
            }
            SessionCommand::Help => println!("{}", SESSION_HELP),
            SessionCommand::Quit => break,
        }
    }

    Ok(())
}

/// Affiche l'état courant ; les erreurs d'une consultation n'arrêtent pas la session
fn show_state(
    datasets: &Datasets,
    request: &QueryRequest,
    state: &QueryState,
    policy: AreaPolicy,
    report_style: bool,
) {
    let report = match state {
        QueryState::Found(selection) => assess(selection, &datasets.zones, policy)
            .map_err(anyhow::Error::from)
            .and_then(|assessment| {
                QueryReport::assessed(
                    request,
                    &selection.reference,
                    selection.parcels.len(),
                    &assessment,
                    report_style,
                )
            }),
        QueryState::Empty => return,
        _ => QueryReport::unresolved(request, state).context("Query produced no result state"),
    };

    match report {
        Ok(report) => report.display(),
        Err(e) => {
            warn!(request = %request, error = %e, "Assessment failed");
            println!("Assessment failed: {:#}", e);
        }
    }
}

/// Statistiques d'une catégorie de zonification
#[derive(Debug, Default)]
struct CategoryStats {
    count: usize,
    area: f64,
}

/// Exécute la commande zones
pub fn cmd_zones(config: &Config) -> Result<()> {
    let datasets = load_datasets(config)?;

    let mut stats: std::collections::BTreeMap<&ZoneCategory, CategoryStats> =
        std::collections::BTreeMap::new();
    for zone in datasets.zones.iter() {
        let entry = stats.entry(&zone.category).or_default();
        entry.count += 1;
        entry.area += zone.geometry.unsigned_area();
    }
    let total_area: f64 = stats.values().map(|s| s.area).sum();

    println!("\n{}", "=".repeat(60));
    println!("ZONING - {} zones", datasets.zones.len());
    println!("{}", "=".repeat(60));

    println!("\n--- BY CATEGORY ---");
    for (category, s) in &stats {
        let percent = if total_area > 0.0 {
            100.0 * s.area / total_area
        } else {
            0.0
        };
        println!(
            "  [{}] {}: {} zone(s), {} ({})",
            category.color(),
            category,
            s.count,
            format_area(s.area, true)?,
            format_percent(percent)
        );
    }

    let unknown: Vec<_> = stats.keys().filter(|c| !c.is_known()).collect();
    if !unknown.is_empty() {
        println!("\n{} category value(s) outside the known set", unknown.len());
    }

    if let Some(reserve) = &datasets.reserve {
        println!("\n--- RESERVE ---");
        println!("Area: {}", format_area(reserve.unsigned_area(), true)?);

        if let Some(rect) = reserve.bounding_rect() {
            print_extent(rect.min().x, rect.min().y, rect.max().x, rect.max().y)?;
        }
    } else if let Some(rect) = datasets.zones.bounding_rect() {
        println!("\n--- ZONING EXTENT ---");
        print_extent(rect.min().x, rect.min().y, rect.max().x, rect.max().y)?;
    }

    println!("\n{}", "=".repeat(60));
    Ok(())
}

fn print_extent(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<()> {
    println!(
        "Extent (EPSG:{}): X {} .. {}, Y {} .. {}",
        PLANAR_EPSG,
        format_number(min_x, 2),
        format_number(max_x, 2),
        format_number(min_y, 2),
        format_number(max_y, 2)
    );

    let reprojector = SmartReprojector::new(PLANAR_EPSG, DISPLAY_EPSG)?;
    let (west, south) = reprojector.transform_point(min_x, min_y)?;
    let (east, north) = reprojector.transform_point(max_x, max_y)?;
    println!(
        "Extent (EPSG:{}): lon {:.6} .. {:.6}, lat {:.6} .. {:.6}",
        DISPLAY_EPSG, west, east, south, north
    );
    Ok(())
}

/// Vérifie que les fichiers de données existent avant un chargement coûteux
pub fn check_sources(config: &Config) -> Result<()> {
    for (label, path) in [("parcels", &config.parcels.path), ("zones", &config.zones.path)] {
        if !path.exists() {
            anyhow::bail!(
                "{} layer not found: {} (set it in the config file or with GEOLANDY_{})",
                label,
                path.display(),
                label.to_ascii_uppercase()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        assert_eq!(
            build_request(Some(" AAA0143FTRS ".to_string()), None, None).unwrap(),
            QueryRequest::Code("AAA0143FTRS".to_string())
        );
        assert_eq!(
            build_request(None, Some(4884290.02), Some(2065679.52)).unwrap(),
            QueryRequest::Point {
                x: 4884290.02,
                y: 2065679.52
            }
        );
        assert!(build_request(None, None, None).is_err());
        assert!(build_request(None, Some(1.0), None).is_err());
        assert!(build_request(Some("AAA0143FTRS".to_string()), Some(1.0), Some(2.0)).is_err());
    }

    #[test]
    fn test_parse_session_line() {
        assert_eq!(parse_session_line("   ").unwrap(), None);
        assert_eq!(
            parse_session_line("code AAA0143FTRS").unwrap(),
            Some(SessionCommand::Query(QueryRequest::Code(
                "AAA0143FTRS".to_string()
            )))
        );
        assert_eq!(
            parse_session_line("point 4884290.02, 2065679.52").unwrap(),
            Some(SessionCommand::Query(QueryRequest::Point {
                x: 4884290.02,
                y: 2065679.52
            }))
        );
        assert_eq!(parse_session_line("RESET").unwrap(), Some(SessionCommand::Reset));
        assert_eq!(parse_session_line("quit").unwrap(), Some(SessionCommand::Quit));
    }

    #[test]
    fn test_parse_session_line_errors() {
        assert!(parse_session_line("code").is_err());
        assert!(parse_session_line("point 12").is_err());
        assert!(parse_session_line("point abc 12").is_err());
        assert!(parse_session_line("delete everything").is_err());
    }

    fn session_datasets() -> Datasets {
        use geo::{polygon, MultiPolygon};
        use geolandy::{ParcelLayer, ParcelRecord, ZoneLayer, ZoneRecord};
        use std::collections::HashMap;

        let square = |x0: f64, y0: f64, size: f64| {
            MultiPolygon::new(vec![polygon![
                (x: x0, y: y0),
                (x: x0 + size, y: y0),
                (x: x0 + size, y: y0 + size),
                (x: x0, y: y0 + size),
                (x: x0, y: y0),
            ]])
        };

        Datasets {
            parcels: ParcelLayer::new(vec![ParcelRecord {
                id: "AAA0143FTRS".to_string(),
                geometry: square(0.0, 0.0, 100.0),
                properties: HashMap::new(),
            }]),
            zones: ZoneLayer::new(vec![ZoneRecord {
                geometry: square(50.0, 0.0, 100.0),
                category: ZoneCategory::Preservation,
                description: String::new(),
                legal_reference: String::new(),
                permitted: String::new(),
                prohibited: String::new(),
                properties: HashMap::new(),
            }]),
            reserve: None,
            epsg: PLANAR_EPSG,
        }
    }

    #[test]
    fn test_run_session_script() {
        let datasets = session_datasets();
        let script = "code AAA0143FTRS\n\
                      point 50 50\n\
                      show\n\
                      reset\n\
                      show\n\
                      code AAA014\n\
                      point 500 500\n\
                      bogus\n\
                      help\n\
                      quit\n\
                      code AAA0143FTRS\n";

        let input = std::io::Cursor::new(script);
        assert!(run_session(&datasets, AreaPolicy::Union, true, input).is_ok());

        // Fin d'entrée sans 'quit'
        let input = std::io::Cursor::new("code AAA0143FTRS\n");
        assert!(run_session(&datasets, AreaPolicy::RawSum, false, input).is_ok());
    }

    #[test]
    fn test_run_session_unreadable_input() {
        let datasets = session_datasets();
        let input = std::io::Cursor::new(vec![0xff, 0xfe, b'\n']);
        assert!(run_session(&datasets, AreaPolicy::RawSum, false, input).is_err());
    }

    #[test]
    fn test_check_sources_missing() {
        let mut config = Config::from_preset("bogota").unwrap();
        config.parcels.path = PathBuf::from("/nonexistent/predios.geojson");
        let err = check_sources(&config).unwrap_err();
        assert!(err.to_string().contains("GEOLANDY_PARCELS"));
    }
}
