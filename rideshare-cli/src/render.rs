use chrono::{DateTime, Utc};
use rideshare_client::models::{Trip, User, Vehicle};
use std::fmt::Write;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

pub fn trip_card(trip: &Trip) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Trip {}", trip.id);
    let _ = writeln!(out, "  {} -> {}", trip.start_location, trip.end_location);
    let _ = writeln!(out, "  Driver: {}", trip.driver.name);
    let _ = writeln!(
        out,
        "  Departs: {}  Arrives: {}",
        trip.departure_time.format(TIME_FORMAT),
        trip.arrival_time.format(TIME_FORMAT)
    );
    let _ = writeln!(
        out,
        "  Seats: {} of {} free  [{}]",
        trip.remaining_seats, trip.available_seats, trip.status
    );

    if trip.passengers.is_empty() {
        let _ = writeln!(out, "  No passengers yet");
    } else {
        let _ = writeln!(out, "  Passengers:");
        for p in &trip.passengers {
            let _ = writeln!(
                out,
                "    - {} ({} -> {})",
                p.user.name, p.pickup_location, p.dropoff_location
            );
        }
    }

    if let Some(status) = &trip.viewer_status {
        let _ = writeln!(out, "  {status}");
    }
    out
}

pub fn trip_list(trips: &[Trip]) -> String {
    if trips.is_empty() {
        return "No trips found\n".to_string();
    }
    trips.iter().map(trip_card).collect::<Vec<_>>().join("\n")
}

/// Splits trips into upcoming and past by departure time, soonest first
/// and most recent first respectively.
pub fn my_trips(trips: &[Trip], now: DateTime<Utc>) -> String {
    let (mut upcoming, mut past): (Vec<&Trip>, Vec<&Trip>) =
        trips.iter().partition(|t| t.departure_time >= now);
    upcoming.sort_by_key(|t| t.departure_time);
    past.sort_by_key(|t| std::cmp::Reverse(t.departure_time));

    let mut out = String::new();
    for (title, group) in [("Upcoming trips", upcoming), ("Past trips", past)] {
        let _ = writeln!(out, "{title} ({})", group.len());
        if group.is_empty() {
            let _ = writeln!(out, "  none");
        }
        for trip in group {
            out.push_str(&trip_card(trip));
        }
    }
    out
}

pub fn user(user: &User) -> String {
    let role = if user.is_driver { "driver" } else { "rider" };
    let mut out = format!("{} <{}> [{}]\n  id: {}\n", user.name, user.email, role, user.id);
    if let Some(phone) = &user.phone {
        let _ = writeln!(out, "  phone: {phone}");
    }
    if let Some(vehicle) = user.vehicle {
        let _ = writeln!(out, "  vehicle: {vehicle}");
    }
    out
}

pub fn vehicle(vehicle: &Vehicle) -> String {
    format!(
        "{} ({})\n  battery: {:.1} / {:.1} kWh\n",
        vehicle, vehicle.id, vehicle.current_battery, vehicle.battery_capacity
    )
}
