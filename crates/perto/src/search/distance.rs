use perto_datasets::Coordinates;

/// Mean Earth radius in meters, the single radius constant in the crate.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two points via the haversine formula, in
/// meters.
///
/// The intermediate term is clamped to `[0, 1]` so floating-point drift
/// near antipodal points cannot feed a negative value into `sqrt`.
#[must_use]
pub fn haversine_meters(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lng = (to.longitude - from.longitude).to_radians();
    let a = ((d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lng / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAO_PAULO: Coordinates = Coordinates::new(-23.5505, -46.6333);
    const RIO: Coordinates = Coordinates::new(-22.9068, -43.1729);

    #[test]
    fn test_identical_points_are_zero() {
        assert!(haversine_meters(SAO_PAULO, SAO_PAULO).abs() < 1e-9);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let there = haversine_meters(SAO_PAULO, RIO);
        let back = haversine_meters(RIO, SAO_PAULO);
        assert!((there - back).abs() < 1e-6);
    }

    #[test]
    fn test_sao_paulo_to_rio_is_about_360_km() {
        let distance = haversine_meters(SAO_PAULO, RIO);
        assert!(
            (355_000.0..367_000.0).contains(&distance),
            "got {distance} m"
        );
    }

    #[test]
    fn test_quarter_circumference_along_the_equator() {
        let distance = haversine_meters(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 90.0));
        let expected = EARTH_RADIUS_METERS * std::f64::consts::FRAC_PI_2;
        assert!((distance - expected).abs() < 1e-3);
    }

    #[test]
    fn test_antipodal_points_do_not_produce_nan() {
        let distance = haversine_meters(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0));
        assert!(distance.is_finite());
        let expected = EARTH_RADIUS_METERS * std::f64::consts::PI;
        assert!((distance - expected).abs() < 1.0);
    }
}
