//! radarahead cli - Speed camera alerts along a planned route

use std::fs::{self, File};
use std::io::BufReader;

use argopt::{cmd_group, subcmd};
use csv::Reader;
use serde::Deserialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use radarahead::radar::proximity::filter_along_route;
use radarahead::sources::{CandidatesSource, CsvRadarSource, CsvSampleSource, SampleFields, SamplesSource};
use radarahead::{
    channel, route_from_gpx, Advisory, AdvisoryOutput, Candidate, NavEvent, Navigator, NavigatorConfig,
    RouteDescriptor, TrackingUpdate,
};

/// CLI of radarahead - Replay positions along a route and get warned about speed cameras
#[cmd_group(commands = [replay, along])]
fn main() -> Result<(), String> {}

/// Replay recorded positions along a route, printing readouts and alerts
#[subcmd]
fn replay(
    /// CSV file of the radars
    radars_path: String,
    /// GPX file of the route
    route_path: String,
    /// CSV file of the recorded positions
    samples_path: String,
    /// Fields and thresholds configuration. Default: .radarahead.yaml, ~/.radarahead.yaml
    #[opt(long)]
    config: Option<String>,
) -> Result<(), String> {
    init_tracing();

    let conf = load_configs(config);
    let candidates = load_radars(&radars_path)?;
    let route = load_route(&route_path)?;

    let samples = File::open(samples_path)
        .map_err(|e| format!("Failed on open the samples file: {}", e.to_string()))?;
    let mut source = CsvSampleSource::new(Reader::from_reader(samples), Some(conf.fields));
    let samples = source.fetch().map_err(|e| e.to_string())?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| format!("Failed on start the runtime: {}", e.to_string()))?;

    rt.block_on(async move {
        let navigator = Navigator::new(&conf.navigator, candidates);
        let (handle, event_loop) = channel(64);

        let feed = async move {
            let mut events = vec![NavEvent::RouteComputed(Ok(route)), NavEvent::Start];
            events.extend(samples.into_iter().map(NavEvent::Position));
            events.push(NavEvent::Shutdown);

            for event in events {
                handle.send(event).await?;
            }

            Ok::<(), radarahead::NavError>(())
        };

        let mut printer = Printer;
        let (fed, _) = tokio::join!(feed, event_loop.run(navigator, &mut printer));

        fed.map_err(|e| e.to_string())
    })
}

/// List the radars along a route
#[subcmd]
fn along(
    /// CSV file of the radars
    radars_path: String,
    /// GPX file of the route
    route_path: String,
    /// Thresholds configuration. Default: .radarahead.yaml, ~/.radarahead.yaml
    #[opt(long)]
    config: Option<String>,
) -> Result<(), String> {
    init_tracing();

    let conf = load_configs(config);
    let candidates = load_radars(&radars_path)?;
    let route = load_route(&route_path)?;

    let on_route = filter_along_route(
        &candidates,
        &route.points,
        conf.navigator.proximity.buffer_km,
        conf.navigator.proximity.bbox_pad,
    );

    println!(
        "{}, {} radars on the route",
        route.distance_km(),
        on_route.len()
    );
    for radar in on_route {
        println!(
            "{}\t{}\t{}\t{}",
            radar.identity(),
            radar.label(),
            radar.location_text(),
            radar.limit_text().unwrap_or_else(|| "—".to_string())
        );
    }

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_radars(path: &str) -> Result<Vec<Candidate>, String> {
    let file = File::open(path).map_err(|e| format!("Failed on open the radars file: {}", e.to_string()))?;

    let mut source = CsvRadarSource::new(Reader::from_reader(file));

    source.fetch().map_err(|e| e.to_string())
}

fn load_route(path: &str) -> Result<RouteDescriptor, String> {
    let file = File::open(path).map_err(|e| format!("Failed on open the route file: {}", e.to_string()))?;

    route_from_gpx(BufReader::new(file)).map_err(|e| e.to_string())
}

/// Readouts and advisories to the terminal
struct Printer;

impl AdvisoryOutput for Printer {
    fn advise(&mut self, advisory: &Advisory) {
        println!("{}", advisory);
    }

    fn tracking(&mut self, update: &TrackingUpdate) {
        let dash = || "—".to_string();

        println!(
            "{}\t{}\t{}\t{}",
            update.estimate.timestamp,
            update
                .readouts
                .speed
                .map(|s| format!("{} km/h", s))
                .unwrap_or_else(dash),
            update
                .readouts
                .heading
                .map(|h| format!("{}°", h))
                .unwrap_or_else(dash),
            update
                .next_radar
                .as_ref()
                .map(|n| n.to_string())
                .unwrap_or_else(dash)
        );
    }
}

/// Load the current config
fn load_configs(provided: Option<String>) -> Configs {
    let mut options = vec![];

    if let Some(sprovided) = provided {
        options.push(sprovided);
    }

    options.push(".radarahead.yaml".to_string());

    if let Some(home) = dirs::home_dir() {
        if let Some(shome) = home.to_str() {
            options.push(format!("{}/.radarahead.yaml", shome));
        }
    }

    let mut yaml: Option<String> = None;
    for fi in options {
        if let Ok(s) = fs::read_to_string(&fi) {
            debug!(path = %fi, "Configuration found");
            yaml = Some(s);
            break;
        }
    }

    if let Some(s) = yaml {
        match serde_yaml::from_str::<Configs>(&s) {
            Ok(conf) => return conf,
            Err(e) => warn!("Invalid configuration, using defaults: {}", e),
        }
    }

    Configs::default()
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
struct Configs {
    #[serde(default)]
    pub fields: SampleFields,
    #[serde(flatten)]
    pub navigator: NavigatorConfig,
}

#[test]
fn parse_configs() -> Result<(), String> {
    let yaml = "alert:\n  radius_m: 500";

    let conf: Configs = serde_yaml::from_str(&yaml).map_err(|e| e.to_string())?;

    assert_eq!(Configs::default(), conf);

    let yaml = "\nfields:\n  time: ts\n  flip_coordinates: true\nspeed:\n  max_kmh: 180\nalert:\n  radius_m: 800";

    let conf: Configs = serde_yaml::from_str(&yaml).map_err(|e| e.to_string())?;

    let mut expected = Configs::default();
    expected.fields.time = "ts".to_string();
    expected.fields.flip_coordinates = true;
    expected.navigator.speed.max_kmh = 180.0;
    expected.navigator.alert.radius_m = 800.0;

    assert_eq!(expected, conf);

    Ok(())
}
