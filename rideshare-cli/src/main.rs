mod render;
mod session;

use chrono::{DateTime, Utc};
use clap::Parser;
use rideshare_client::models::{CreateTrip, CreateVehicle, JoinTrip, Location, NewUser};
use rideshare_client::{RideshareClient, RideshareHttpClient};
use session::Session;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
struct Cli {
    #[clap(short, long, default_value = "http://127.0.0.1:8080")]
    server: String,

    #[clap(long, default_value = ".rideshare_session")]
    session_file: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    Register {
        #[clap(long)]
        name: String,
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
        #[clap(long)]
        phone: Option<String>,
        #[clap(long)]
        driver: bool,
    },
    Login {
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
    },
    Logout,
    Whoami,
    ListTrips,
    ShowTrip {
        id: Uuid,
    },
    MyTrips,
    CreateTrip {
        #[clap(long)]
        from: String,
        #[clap(long)]
        to: String,
        /// RFC 3339, e.g. 2026-11-01T08:00:00Z
        #[clap(long)]
        departure: DateTime<Utc>,
        #[clap(long)]
        arrival: DateTime<Utc>,
        #[clap(long)]
        seats: u16,
    },
    JoinTrip {
        id: Uuid,
        #[clap(long)]
        pickup: Option<String>,
        #[clap(long)]
        dropoff: Option<String>,
    },
    RegisterVehicle {
        #[clap(long)]
        make: String,
        #[clap(long)]
        model: String,
        #[clap(long)]
        year: i32,
        #[clap(long)]
        battery_capacity: f64,
        #[clap(long)]
        current_battery: f64,
    },
    ShowVehicle {
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let session = Session::load(&args.session_file)?;
    let client = RideshareHttpClient::connect(&args.server)?.with_token(session.token.clone());

    match args.command {
        Command::Register {
            name,
            email,
            password,
            phone,
            driver,
        } => {
            let user = client
                .register(NewUser {
                    name,
                    email,
                    password,
                    phone,
                    is_driver: driver,
                })
                .await?;
            println!("Registered!");
            print!("{}", render::user(&user));
        }
        Command::Login { email, password } => {
            let login = client.login(&email, &password).await?;
            Session::from_login(&login).save(&args.session_file)?;
            println!("Logged in as {}", login.user.name);
        }
        Command::Logout => {
            Session::finish_logout(&args.session_file, client.logout().await)?;
            println!("Logged out successfully");
        }
        Command::Whoami => {
            let user = client.current_user().await?;
            print!("{}", render::user(&user));
        }
        Command::ListTrips => {
            let trips = client.list_trips().await?;
            print!("{}", render::trip_list(&trips));
        }
        Command::ShowTrip { id } => {
            let trip = client.get_trip(id).await?;
            print!("{}", render::trip_card(&trip));
        }
        Command::MyTrips => {
            let user_id = session.user_id().ok_or("not logged in; run `login` first")?;
            let trips = client.user_trips(user_id).await?;
            print!("{}", render::my_trips(&trips, Utc::now()));
        }
        Command::CreateTrip {
            from,
            to,
            departure,
            arrival,
            seats,
        } => {
            let trip = client
                .create_trip(CreateTrip {
                    start_location: Location::new(from),
                    end_location: Location::new(to),
                    departure_time: departure,
                    arrival_time: arrival,
                    available_seats: seats,
                    driver: None,
                })
                .await?;
            println!("Trip created!");
            print!("{}", render::trip_card(&trip));
        }
        Command::JoinTrip {
            id,
            pickup,
            dropoff,
        } => {
            let trip = client
                .join_trip(
                    id,
                    JoinTrip {
                        user: None,
                        pickup_location: pickup.map(Location::new),
                        dropoff_location: dropoff.map(Location::new),
                    },
                )
                .await?;
            println!("Successfully joined the trip!");
            print!("{}", render::trip_card(&trip));
        }
        Command::RegisterVehicle {
            make,
            model,
            year,
            battery_capacity,
            current_battery,
        } => {
            let vehicle = client
                .register_vehicle(CreateVehicle {
                    make,
                    model,
                    year,
                    battery_capacity,
                    current_battery,
                })
                .await?;
            println!("Vehicle registered!");
            print!("{}", render::vehicle(&vehicle));
        }
        Command::ShowVehicle { id } => {
            let vehicle = client.get_vehicle(id).await?;
            print!("{}", render::vehicle(&vehicle));
        }
    }

    Ok(())
}
