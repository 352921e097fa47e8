use super::{colorize_state, json_pretty, or_dash, EXIT_SUCCESS};
use crate::client::{CarpoolClient, ClientError};
use crate::time::parse_start_time;
use carpool_schema::{TripRequest, TripView};
use chrono::Local;
use clap::Args;

#[derive(Debug, Args)]
pub struct TripArgs {
    /// Car owner publishing the trip.
    #[arg(long)]
    owner: String,
    /// Pickup location.
    #[arg(long = "from")]
    pickup: String,
    /// Alternative pickup location.
    #[arg(long)]
    alt_pickup: Option<String>,
    /// Destination.
    #[arg(long = "to")]
    destination: String,
    /// Departure time: RFC 3339, or HH:MM for today (local time).
    #[arg(long)]
    start: String,
    /// Number of seats offered.
    #[arg(long, allow_negative_numbers = true)]
    seats: i32,
}

impl TripArgs {
    fn into_request(self) -> Result<TripRequest, ClientError> {
        let start_time =
            parse_start_time(&self.start, &Local::now()).map_err(ClientError::InvalidInput)?;
        Ok(TripRequest {
            car_owner_id: self.owner.into(),
            pickup_location: self.pickup,
            alt_pickup_location: self.alt_pickup,
            start_time,
            destination: self.destination,
            total_seats: self.seats,
        })
    }
}

fn print_trip(trip: &TripView) {
    println!("id:          {}", trip.id);
    println!("state:       {}", colorize_state(trip.state()));
    println!("owner:       {}", trip.car_owner_id);
    println!("pickup:      {}", trip.pickup_location);
    println!("alt pickup:  {}", or_dash(trip.alt_pickup_location.as_deref()));
    println!("destination: {}", trip.destination);
    println!(
        "departs:     {}",
        trip.start_time.with_timezone(&Local).format("%Y-%m-%d %H:%M %Z")
    );
    println!(
        "seats:       {} of {} available",
        trip.available_seats, trip.total_seats
    );
    if trip.enrolled_passengers.is_empty() {
        println!("passengers:  -");
    } else {
        let names: Vec<&str> = trip.enrolled_passengers.iter().map(|p| p.as_str()).collect();
        println!("passengers:  {}", names.join(", "));
    }
}

fn print_result(trip: &TripView, verb: &str, json: bool) -> Result<u8, ClientError> {
    if json {
        println!("{}", json_pretty(trip)?);
    } else {
        println!(
            "{verb} trip {} ({} of {} seats available)",
            trip.id, trip.available_seats, trip.total_seats
        );
    }
    Ok(EXIT_SUCCESS)
}

pub fn list(client: &CarpoolClient, json: bool) -> Result<u8, ClientError> {
    let trips = client.list_trips()?;
    if json {
        println!("{}", json_pretty(&trips)?);
    } else if trips.is_empty() {
        println!("no trips found");
    } else {
        println!(
            "{:<12} {:<10} {:<12} {:<17} {:<7} ROUTE",
            "ID", "STATE", "OWNER", "DEPARTS", "SEATS"
        );
        for trip in &trips {
            println!(
                "{:<12} {:<10} {:<12} {:<17} {:<7} {} -> {}",
                trip.id,
                colorize_state(trip.state()),
                trip.car_owner_id,
                trip.start_time.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                format!("{}/{}", trip.available_seats, trip.total_seats),
                trip.pickup_location,
                trip.destination
            );
        }
    }
    Ok(EXIT_SUCCESS)
}

pub fn show(client: &CarpoolClient, trip_id: &str, json: bool) -> Result<u8, ClientError> {
    let trip = client.get_trip(trip_id)?;
    if json {
        println!("{}", json_pretty(&trip)?);
    } else {
        print_trip(&trip);
    }
    Ok(EXIT_SUCCESS)
}

/// Create (`create`) or update a trip.
pub fn save(
    client: &CarpoolClient,
    create: bool,
    trip_id: &str,
    args: TripArgs,
    json: bool,
) -> Result<u8, ClientError> {
    let request = args.into_request()?;
    let trip = client.save_trip(create, trip_id, &request)?;
    print_result(&trip, if create { "created" } else { "updated" }, json)
}

pub fn enroll(
    client: &CarpoolClient,
    trip_id: &str,
    user_id: &str,
    json: bool,
) -> Result<u8, ClientError> {
    let trip = client.enroll(trip_id, user_id)?;
    print_result(&trip, &format!("enrolled {user_id} in"), json)
}

pub fn start(
    client: &CarpoolClient,
    trip_id: &str,
    caller_id: &str,
    json: bool,
) -> Result<u8, ClientError> {
    let trip = client.start(trip_id, caller_id)?;
    if json {
        println!("{}", json_pretty(&trip)?);
    } else {
        println!(
            "started trip {} with {} passengers",
            trip.id,
            trip.enrolled_passengers.len()
        );
    }
    Ok(EXIT_SUCCESS)
}

pub fn cancel(client: &CarpoolClient, trip_id: &str, json: bool) -> Result<u8, ClientError> {
    client.cancel(trip_id)?;
    if json {
        println!(
            "{}",
            json_pretty(&serde_json::json!({ "id": trip_id, "cancelled": true }))?
        );
    } else {
        println!("cancelled trip {trip_id}");
    }
    Ok(EXIT_SUCCESS)
}

pub fn status(client: &CarpoolClient, trip_id: &str, json: bool) -> Result<u8, ClientError> {
    let status = client.status(trip_id)?;
    if json {
        println!("{}", json_pretty(&status)?);
    } else {
        println!("started:     {}", if status.started { "yes" } else { "no" });
        let names: Vec<&str> = status.enrolled_passengers.iter().map(|p| p.as_str()).collect();
        println!("passengers:  {}", or_dash(Some(names.join(", ").as_str())));
    }
    Ok(EXIT_SUCCESS)
}
