use placemark_core::geofence::{compute_visible, distance, EARTH_RADIUS_M};
use placemark_core::{Coordinate, Place};

const ORIGIN: Coordinate = Coordinate {
    latitude: 43.4549,
    longitude: -80.4998,
};

/// Point `meters` due north of `from`; haversine distance along a meridian is
/// exactly `R * delta_phi`.
fn north_of(from: Coordinate, meters: f64) -> Coordinate {
    let delta_deg = (meters / EARTH_RADIUS_M).to_degrees();
    Coordinate::new(from.latitude + delta_deg, from.longitude)
}

fn place_at(id: &str, at: Coordinate) -> Place {
    Place::new(id, format!("Place {id}"), at.latitude, at.longitude)
}

#[test]
fn one_degree_of_latitude_matches_earth_radius() {
    let expected = EARTH_RADIUS_M * 1f64.to_radians();
    let measured = distance(Coordinate::new(10.0, 20.0), Coordinate::new(11.0, 20.0));
    assert!((measured - expected).abs() < 1e-6);
}

#[test]
fn distance_wraps_across_antimeridian_and_equator() {
    let west = Coordinate::new(0.0, 179.5);
    let east = Coordinate::new(0.0, -179.5);
    let expected = EARTH_RADIUS_M * 1f64.to_radians();
    assert!((distance(west, east) - expected).abs() < 1e-6);

    let north = Coordinate::new(0.5, 30.0);
    let south = Coordinate::new(-0.5, 30.0);
    assert!((distance(north, south) - expected).abs() < 1e-6);
}

#[test]
fn scenario_radius_change_admits_farther_place() {
    let near = place_at("near", north_of(ORIGIN, 4800.0));
    let far = place_at("far", north_of(ORIGIN, 5200.0));
    let saved = vec![near.clone(), far.clone()];

    assert!((distance(ORIGIN, near.coordinate()) - 4800.0).abs() < 1e-6);
    assert!((distance(ORIGIN, far.coordinate()) - 5200.0).abs() < 1e-6);

    let at_5000 = compute_visible(ORIGIN, &saved, 5000.0);
    assert_eq!(at_5000, vec![near.clone()]);

    let at_6000 = compute_visible(ORIGIN, &saved, 6000.0);
    assert_eq!(at_6000, vec![near, far]);
}

#[test]
fn boundary_is_inclusive() {
    let target = place_at("edge", north_of(ORIGIN, 1000.0));
    let exact = distance(ORIGIN, target.coordinate());
    let visible = compute_visible(ORIGIN, std::slice::from_ref(&target), exact);
    assert_eq!(visible.len(), 1);
}

#[test]
fn visible_set_matches_filter_definition_and_is_monotonic() {
    let saved: Vec<Place> = (0..20)
        .map(|idx| place_at(&format!("p{idx}"), north_of(ORIGIN, idx as f64 * 750.0)))
        .collect();

    let mut previous: Vec<Place> = Vec::new();
    for radius in [0.0, 500.0, 1000.0, 2500.0, 5000.0, 7500.0, 20000.0] {
        let visible = compute_visible(ORIGIN, &saved, radius);
        let expected: Vec<Place> = saved
            .iter()
            .filter(|place| distance(ORIGIN, place.coordinate()) <= radius)
            .cloned()
            .collect();
        assert_eq!(visible, expected);
        for member in &previous {
            assert!(visible.contains(member), "radius {radius} dropped {}", member.id);
        }
        previous = visible;
    }
}

#[test]
fn result_preserves_saved_order() {
    let saved = vec![
        place_at("c", north_of(ORIGIN, 300.0)),
        place_at("a", north_of(ORIGIN, 100.0)),
        place_at("b", north_of(ORIGIN, 200.0)),
    ];
    let ids: Vec<String> = compute_visible(ORIGIN, &saved, 1000.0)
        .into_iter()
        .map(|place| place.id)
        .collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}
