pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const EARTH_RADIUS_METERS: f64 = EARTH_RADIUS_KM * 1000.0;

pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

pub fn is_valid_latitude(latitude: f64) -> bool {
    latitude.is_finite() && (LATITUDE_RANGE.0..=LATITUDE_RANGE.1).contains(&latitude)
}

pub fn is_valid_longitude(longitude: f64) -> bool {
    longitude.is_finite()
        && (LONGITUDE_RANGE.0..=LONGITUDE_RANGE.1).contains(&longitude)
}

pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    is_valid_latitude(latitude) && is_valid_longitude(longitude)
}

/// Parses a `"<lat>,<lng>"` pair as typed into an address field.
///
/// Returns `None` for anything that is not exactly two numbers within the
/// valid coordinate ranges, so street addresses containing commas and digits
/// are left to the geocoder.
pub fn parse_coordinate_pair(text: &str) -> Option<(f64, f64)> {
    let mut parts = text.split(',');
    let latitude: f64 = parts.next()?.trim().parse().ok()?;
    let longitude: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || !is_valid_coordinate(latitude, longitude) {
        return None;
    }
    Some((latitude, longitude))
}

/// Great-circle distance in kilometers.
pub fn haversine_distance(
    latitude_1: f64,
    longitude_1: f64,
    latitude2: f64,
    longitude_2: f64,
) -> f64 {
    let lat1_rad = to_radians(latitude_1);
    let lon1_rad = to_radians(longitude_1);
    let lat2_rad = to_radians(latitude2);
    let lon2_rad = to_radians(longitude_2);

    let dlat = lat2_rad - lat1_rad;
    let dlon = lon2_rad - lon1_rad;

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn haversine_distance_meters(
    latitude_1: f64,
    longitude_1: f64,
    latitude_2: f64,
    longitude_2: f64,
) -> f64 {
    haversine_distance(latitude_1, longitude_1, latitude_2, longitude_2) * 1000.0
}

/// Moves a point by the given number of meters north and east. Only accurate
/// for short distances, which is all it is used for.
pub fn offset_meters(
    latitude: f64,
    longitude: f64,
    north_meters: f64,
    east_meters: f64,
) -> (f64, f64) {
    let delta_latitude = north_meters / EARTH_RADIUS_METERS;
    let delta_longitude = east_meters / (EARTH_RADIUS_METERS * to_radians(latitude).cos());
    (
        latitude + delta_latitude.to_degrees(),
        longitude + delta_longitude.to_degrees(),
    )
}
