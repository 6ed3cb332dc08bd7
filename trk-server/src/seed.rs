//! Demo routes written at startup when the trip collection is empty.

use tracing::{info, warn};

use trk_common::{Location, PredefinedTrip};

use crate::service::TrackingService;

/// Returns the built-in demo routes, all inactive.
pub fn default_trips() -> Vec<PredefinedTrip> {
    vec![
        demo_trip(
            "Lviv - Old Town Walk",
            "Historic centre of Lviv",
            "3 hours",
            "Break from 12:00 to 13:00",
            &["Shevchenko Park", "Central Cafe"],
            &["Lviv Opera House", "Market Square"],
            &[
                (49.842957, 24.031111),
                (49.844000, 24.032500),
                (49.845500, 24.034000),
                (49.847000, 24.035500),
                (49.848500, 24.037000),
            ],
        ),
        demo_trip(
            "Carpathians - Mountain Hike",
            "A mountain walk through the Carpathians",
            "6 hours",
            "Break from 13:00 to 14:00",
            &["Mountain shelter", "Viewing platform"],
            &["Hoverla", "Pip Ivan"],
            &[
                (48.922633, 22.573900),
                (48.925000, 22.575000),
                (48.927500, 22.577500),
                (48.930000, 22.580000),
                (48.932000, 22.582000),
            ],
        ),
        demo_trip(
            "Bukovel - Ski Route",
            "Ski slopes of Bukovel",
            "4 hours",
            "Break from 12:30 to 13:30",
            &["Ski base", "Mountain restaurant"],
            &["Ski slopes", "Cable car"],
            &[
                (48.354600, 24.412700),
                (48.356000, 24.414000),
                (48.357500, 24.416500),
                (48.359000, 24.418000),
                (48.360500, 24.420000),
            ],
        ),
    ]
}

/// Writes [`default_trips`] if no predefined trip exists yet.
///
/// Failures are logged; startup continues either way. Returns how many routes
/// were written.
pub async fn seed_default_trips(service: &TrackingService) -> usize {
    if !service.predefined_trips().await.is_empty() {
        return 0;
    }

    let mut written = 0;
    for trip in default_trips() {
        let name = trip.name.clone();
        match service.save_predefined_trip(trip).await {
            Ok(_) => written += 1,
            Err(err) => warn!(trip = %name, error = %err, "failed to seed demo trip"),
        }
    }
    info!(written, "seeded demo trips");
    written
}

fn demo_trip(
    name: &str,
    description: &str,
    duration: &str,
    break_schedule: &str,
    rest_places: &[&str],
    points_of_interest: &[&str],
    route: &[(f64, f64)],
) -> PredefinedTrip {
    PredefinedTrip {
        name: name.to_string(),
        description: description.to_string(),
        route: route
            .iter()
            .map(|&(lat, lon)| Location::new(lat, lon))
            .collect(),
        duration: duration.to_string(),
        break_schedule: break_schedule.to_string(),
        rest_places: owned(rest_places),
        points_of_interest: owned(points_of_interest),
        ..PredefinedTrip::default()
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
