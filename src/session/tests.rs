
use approx::assert_abs_diff_eq;
use geo::Point;

use super::{Advisory, AdvisoryOutput, Navigator, ProviderError};
use crate::config::NavigatorConfig;
use crate::fusion::RawSample;
use crate::radar::Candidate;
use crate::route::RouteDescriptor;
use crate::NavError;

fn north_of(meters: f64) -> Point {
    Point::new(2.35, 48.86 + meters / 111_195.0)
}

fn northbound_route() -> RouteDescriptor {
    RouteDescriptor::from_points(vec![north_of(0.0), north_of(5000.0)], 300.0)
}

fn radars() -> Vec<Candidate> {
    let mut fixed = Candidate::basic("R1", north_of(300.0));
    fixed.limit = Some(50);
    vec![
        fixed,
        Candidate::basic("R2", north_of(3000.0)),
        // Far off the route
        Candidate::basic("R3", Point::new(2.40, 48.87)),
    ]
}

/// 15 m/s northbound, one sample per second
fn sample(second: u64) -> RawSample {
    RawSample::basic(north_of(second as f64 * 15.0), 5.0, second * 1000).speed(15.0)
}

#[test]
fn alerts_once_per_route() -> Result<(), String> {
    let mut nav = Navigator::new(&NavigatorConfig::default(), radars());
    nav.start();

    let advisory = nav.set_route(northbound_route());
    match &advisory {
        Advisory::RouteComputed {
            radars,
            next,
            travel_time,
        } => {
            assert_eq!(2, *radars);
            assert_eq!("R1", next.as_ref().ok_or("no next radar")?.candidate.id);
            assert_eq!(Some("5min".to_string()), *travel_time);
        }
        other => return Err(format!("unexpected {:?}", other)),
    }
    assert!(advisory.to_string().contains("2 radars detected"));

    let update = nav.process_sample(&sample(0), None).ok_or("rejected")?;
    let alert = update.alert.ok_or("no alert")?;
    assert_eq!("R1", alert.identity);
    assert_eq!("Caution. Radar in 300 meters. Limit 50.", alert.spoken);
    assert_eq!("R1", update.next_radar.ok_or("no next radar")?.candidate.id);

    for second in 1..10 {
        let update = nav.process_sample(&sample(second), None).ok_or("rejected")?;
        assert_eq!(None, update.alert);
    }
    assert_eq!(1, nav.session().alerts().len());

    // Same route computed again, the radar may alert once more
    nav.set_route(northbound_route());
    assert!(nav.session().alerts().is_empty());
    let update = nav.process_sample(&sample(10), None).ok_or("rejected")?;
    assert_eq!("R1", update.alert.ok_or("no alert")?.identity);

    Ok(())
}

#[test]
fn no_alerts_without_route() -> Result<(), String> {
    let mut nav = Navigator::new(&NavigatorConfig::default(), radars());
    nav.start();

    let update = nav.process_sample(&sample(0), None).ok_or("rejected")?;
    assert_eq!(None, update.alert);
    assert_eq!(None, update.next_radar);
    assert_abs_diff_eq!(54.0, update.estimate.speed.ok_or("no speed")?, epsilon = 1e-9);

    Ok(())
}

#[test]
fn nothing_after_stop() {
    let mut nav = Navigator::new(&NavigatorConfig::default(), radars());
    assert_eq!(None, nav.process_sample(&sample(0), None));

    nav.set_gyroscope(true);
    nav.start();
    assert!(nav.process_sample(&sample(0), None).is_some());
    assert!(nav.session().last_estimate().is_some());

    nav.stop();
    assert!(!nav.session().is_active());
    assert!(nav.session().last_estimate().is_none());
    assert!(!nav.gyroscope_enabled());
    assert_eq!(None, nav.process_sample(&sample(1), None));
}

#[test]
fn start_twice_keeps_session() -> Result<(), String> {
    let mut nav = Navigator::new(&NavigatorConfig::default(), vec![]);
    nav.start();
    nav.process_sample(&sample(0), None).ok_or("rejected")?;

    nav.start();
    assert!(nav.session().last_estimate().is_some());

    Ok(())
}

#[test]
fn provider_failure_stops_tracking() {
    let mut nav = Navigator::new(&NavigatorConfig::default(), vec![]);
    nav.set_gyroscope(true);
    nav.start();

    let advisory = nav.provider_failed(ProviderError::PermissionDenied);
    assert_eq!("Location permission denied.", advisory.to_string());
    assert!(!nav.session().is_active());
    assert!(!nav.gyroscope_enabled());
    assert_eq!(None, nav.process_sample(&sample(0), None));
}

#[test]
fn failed_route_keeps_previous() {
    let mut nav = Navigator::new(&NavigatorConfig::default(), radars());
    nav.set_route(northbound_route());

    let mut out: Vec<Advisory> = vec![];
    out.advise(&nav.route_computed(Err(NavError::DestinationNotFound)));
    out.advise(&nav.route_computed(Err(NavError::service("HTTP 500"))));
    out.advise(&nav.route_computed(Ok(RouteDescriptor::from_points(vec![north_of(0.0)], 0.0))));

    assert_eq!(
        vec![Advisory::DestinationNotFound, Advisory::RouteFailed, Advisory::NoRoute],
        out
    );
    assert_eq!("Could not compute a route.", out[2].to_string());
    assert_eq!(2, nav.session().route_radars().len());
    assert!(nav.session().route().is_some());
}
