//! Text shown next to the map for the session counters.

pub fn format_elapsed(seconds: u64) -> String {
    let minutes = (seconds / 60) % 60;
    let seconds = seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

pub fn format_distance(meters: f64) -> String {
    format!("{:.2} Km", meters / 1000.0)
}

pub fn format_speed(kmh: f64) -> String {
    format!("{:.0} Km/h", kmh)
}

#[test]
fn elapsed_wraps_at_an_hour() {
    assert_eq!(format_elapsed(0), "00:00");
    assert_eq!(format_elapsed(59), "00:59");
    assert_eq!(format_elapsed(60), "01:00");
    assert_eq!(format_elapsed(61 * 60 + 5), "01:05");
}

#[test]
fn distance_and_speed() {
    assert_eq!(format_distance(0.0), "0.00 Km");
    assert_eq!(format_distance(52.26), "0.05 Km");
    assert_eq!(format_distance(12_346.0), "12.35 Km");
    assert_eq!(format_speed(36.0), "36 Km/h");
    assert_eq!(format_speed(0.0), "0 Km/h");
}
