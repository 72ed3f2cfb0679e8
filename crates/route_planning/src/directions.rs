use itertools::Itertools;
use model::location::Coordinates;
use model::route::Route;

const DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/?api=1";

fn point(coordinates: Coordinates) -> String {
    format!("{},{}", coordinates.latitude, coordinates.longitude)
}

/// Google Maps link that drives the route in order. `None` when the route
/// has fewer than two stops with coordinates.
pub fn google_maps_url(route: &Route) -> Option<String> {
    let mut points = route
        .stops
        .iter()
        .filter_map(|stop| stop.location.coordinates())
        .collect::<Vec<_>>();
    if points.len() < 2 {
        return None;
    }
    if route.returns_to_origin {
        points.push(points[0]);
    }

    let origin = points[0];
    let destination = points[points.len() - 1];
    let waypoints = &points[1..points.len() - 1];

    let mut url = format!(
        "{DIRECTIONS_URL}&origin={}&destination={}&travelmode=driving",
        point(origin),
        point(destination)
    );
    if !waypoints.is_empty() {
        url.push_str("&waypoints=");
        url.push_str(&waypoints.iter().map(|&p| point(p)).join("%7C"));
    }
    Some(url)
}
