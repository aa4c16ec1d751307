use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use boda_bites::config::DeliveryConfig;
use boda_bites::geo::{format_distance_km, haversine_km, Coordinate};
use boda_bites::order::format_ugx;
use boda_bites::resolver::DeliveryResolver;
use boda_bites::server::{self, AppState};
use boda_bites::suggest::{
    CachedGeocoder, GeocodeCache, Geocoder, PhotonGeocoder, SuggestSession, Suggestion,
};
use boda_bites::tiers::DeliveryQuote;

/// Boda Bites delivery checker: is an address serviced, and what does
/// delivery cost?
///
/// Looks up a place via the geocoder, classifies it against the zone
/// table, and prices it by zone fee or distance band.
///
/// Examples:
///   boda "Kololo Hill"
///   boda "downtown market" --offline
///   boda --lat 0.3321 --lon 32.5936
///   boda --zones
///   boda --serve --port 8080
#[derive(Parser)]
#[command(name = "boda", version, about, long_about = None)]
struct Cli {
    /// Place to check (positional). Example: boda "Kololo Hill"
    #[arg(index = 1)]
    place: Option<String>,

    /// Latitude (-90 to 90), paired with --lon.
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude (-180 to 180), paired with --lat.
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// List the delivery zones with fees and time windows.
    #[arg(long)]
    zones: bool,

    /// Classify the place against the zone table only; no network.
    #[arg(long)]
    offline: bool,

    /// Maximum suggestions for a place lookup.
    #[arg(long, default_value_t = 5)]
    limit: usize,

    /// JSON config file overriding the built-in Kampala setup.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the on-disk geocode cache.
    #[arg(long)]
    no_cache: bool,

    /// Run the HTTP API.
    #[arg(long)]
    serve: bool,

    /// Bind host for --serve.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port for --serve.
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.serve);

    // ── Load configuration ──────────────────────────────────────

    let config = match &cli.config {
        Some(path) => DeliveryConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        None => DeliveryConfig::default(),
    };
    let resolver = DeliveryResolver::from_config(&config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    // ── Serve mode ──────────────────────────────────────────────

    if cli.serve {
        let state = Arc::new(AppState {
            geocoder: build_geocoder(cli.no_cache),
            suggest_limit: cli.limit.max(1),
            config,
            resolver,
        });
        server::start(&cli.host, cli.port, state).await;
        return;
    }

    // ── Zone table ──────────────────────────────────────────────

    if cli.zones {
        print_zone_table(&resolver);
        println!(
            "{}",
            serde_json::to_string_pretty(resolver.directory().zones()).unwrap()
        );
        return;
    }

    // ── Coordinate quote ────────────────────────────────────────

    if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            eprintln!("Error: Invalid coordinates. Lat: -90..90, Lon: -180..180");
            std::process::exit(1);
        }
        let quote = resolver.quote_coordinate(Coordinate::new(lat, lon));
        print_quote_banner(&quote);
        println!("{}", serde_json::to_string_pretty(&quote).unwrap());
        return;
    }

    // ── Place lookup ────────────────────────────────────────────

    if let Some(ref place) = cli.place {
        if cli.offline {
            let quote = resolver.quote_text(place);
            print_quote_banner(&quote);
            println!("{}", serde_json::to_string_pretty(&quote).unwrap());
            return;
        }

        let session = SuggestSession::new(Arc::new(resolver), build_geocoder(cli.no_cache))
            .with_limit(cli.limit);
        let suggestions = session.lookup(place).await.unwrap_or_default();

        if suggestions.is_empty() {
            eprintln!("  No places found for '{}'.", place);
        } else {
            print_suggestions(place, &suggestions);
        }
        println!("{}", serde_json::to_string_pretty(&suggestions).unwrap());
        return;
    }

    // ── Nothing provided ────────────────────────────────────────

    eprintln!("Error: No destination specified.");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  boda \"Kololo Hill\"");
    eprintln!("  boda \"downtown market\" --offline");
    eprintln!("  boda --lat 0.3321 --lon 32.5936");
    eprintln!("  boda --zones");
    eprintln!("  boda --serve --port 8080");
    std::process::exit(1);
}

fn init_tracing(serve: bool) {
    // The CLI keeps stdout for JSON; all logging goes to stderr.
    let default_filter = if serve { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_geocoder(no_cache: bool) -> Arc<dyn Geocoder> {
    let photon = PhotonGeocoder::new().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    if no_cache {
        Arc::new(photon)
    } else {
        Arc::new(CachedGeocoder::new(Arc::new(photon), GeocodeCache::load()))
    }
}

// ── Human rendering (stderr) ────────────────────────────────────

fn print_zone_table(resolver: &DeliveryResolver) {
    let directory = resolver.directory();
    if directory.is_empty() {
        eprintln!("  No delivery zones configured.");
        return;
    }
    let origin = resolver.origin();
    eprintln!("  Delivery zones ({} km service radius):", resolver.tiers().max_radius_km());
    eprintln!("  ─────────────────────────────────────────────────────");
    for zone in directory.zones() {
        let distance = zone
            .coordinate
            .map(|c| format_distance_km(haversine_km(origin, c)))
            .unwrap_or_else(|| "-".to_string());
        eprintln!(
            "  {:<18} UGX {:>7}   {:<12} {:>8}",
            zone.name,
            format_ugx(u64::from(zone.fee)),
            zone.estimated_time,
            distance
        );
    }
    eprintln!();
}

fn print_quote_banner(quote: &DeliveryQuote) {
    if quote.deliverable {
        let zone = quote
            .zone
            .as_deref()
            .map(|z| format!(" to {}", z))
            .unwrap_or_default();
        let distance = quote
            .distance_km
            .is_finite()
            .then(|| format!(", {} out", format_distance_km(quote.distance_km)))
            .unwrap_or_default();
        eprintln!(
            "  \u{2713} Delivering{}: UGX {} ({}){}",
            zone,
            format_ugx(u64::from(quote.fee)),
            quote.window_label().unwrap_or("window unknown"),
            distance
        );
    } else if quote.distance_km.is_finite() {
        eprintln!(
            "  \u{2717} Not deliverable: {} from the kitchen",
            format_distance_km(quote.distance_km)
        );
    } else {
        eprintln!("  \u{2717} Not deliverable: no serviced zone matches");
    }
}

fn print_suggestions(query: &str, suggestions: &[Suggestion]) {
    eprintln!("  Places matching '{}':", query);
    for s in suggestions {
        let marker = if s.quote.deliverable {
            "\u{2713}"
        } else {
            "\u{2717}"
        };
        let pricing = if s.quote.deliverable {
            format!(
                "UGX {} ({})",
                format_ugx(u64::from(s.quote.fee)),
                s.quote.window_label().unwrap_or("window unknown")
            )
        } else {
            "out of range".to_string()
        };
        let zone_note = s
            .assessment
            .matched_zone
            .as_deref()
            .zip(s.assessment.match_rule)
            .map(|(z, rule)| format!("  [zone: {}, {} match]", z, rule))
            .unwrap_or_default();
        eprintln!(
            "    {} {:<28} {}{}",
            marker,
            s.candidate.display_label(),
            pricing,
            zone_note
        );
    }
    eprintln!();
}
