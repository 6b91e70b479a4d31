use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use holidaze::{
    filter_venues, ClientConfig, FileStorage, HolidazeApi, HttpTransport, LoginRequest,
    MyBookings, MyVenues, ProfileSync, SessionStore, Venue, VenueBookingView, VenueDirectory,
};

type Api = Arc<HolidazeApi<HttpTransport>>;

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse and book Holidaze venues")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "List venues, optionally filtered by name or description")]
    Venues {
        #[arg(short, long)]
        search: Option<String>,
    },
    #[command(about = "Show a venue and its booked periods")]
    Venue { id: String },
    #[command(about = "Check whether a stay can be booked")]
    Check {
        id: String,
        from: NaiveDate,
        to: NaiveDate,
        #[arg(short, long, default_value_t = 1)]
        guests: u32,
    },
    #[command(about = "Book a stay")]
    Book {
        id: String,
        from: NaiveDate,
        to: NaiveDate,
        #[arg(short, long, default_value_t = 1)]
        guests: u32,
    },
    Login {
        email: String,
        #[arg(long, env = "HOLIDAZE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    #[command(about = "Show the logged-in profile")]
    Whoami,
    MyBookings,
    #[command(about = "List owned venues, optionally with their reservations")]
    MyVenues {
        #[arg(long)]
        bookings: bool,
    },
    DeleteVenue { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;
    let args = Args::parse();

    let config = ClientConfig::from_env()?;
    let api: Api = Arc::new(HolidazeApi::from_config(&config)?);
    let storage = FileStorage::open(&config.session_path)
        .with_context(|| format!("Cannot open session file {}", config.session_path.display()))?;
    let mut store = SessionStore::restore(storage);

    let sync = ProfileSync::new(api.clone());
    sync.sync_in_background(&mut store).await;

    run(args.command, api, &sync, &mut store).await
}

async fn run(
    command: Command,
    api: Api,
    sync: &ProfileSync<HttpTransport>,
    store: &mut SessionStore,
) -> Result<()> {
    match command {
        Command::Venues { search } => {
            let mut directory = VenueDirectory::new(api);
            directory.list().await?;
            let term = search.unwrap_or_default();
            for venue in filter_venues(directory.venues(), &term) {
                print_venue_line(venue);
            }
        }
        Command::Venue { id } => {
            let mut view = VenueBookingView::new(api, id);
            let venue = view.load().await?;
            print_venue_line(venue);
            if !venue.description.is_empty() {
                println!("  {}", venue.description);
            }
            let amenities = venue.meta.amenities();
            if !amenities.is_empty() {
                println!("  amenities: {}", amenities.join(", "));
            }
            for range in view.calendar().ranges() {
                println!("  booked {} to {}", range.start, range.end);
            }
        }
        Command::Check {
            id,
            from,
            to,
            guests,
        } => {
            let mut view = VenueBookingView::new(api, id);
            let venue = view.load().await?.clone();
            view.select_dates(from, Some(to));
            view.set_guests(guests);

            let stay = view.calendar().validate(view.candidate(), venue.max_guests)?;
            println!(
                "{} is available for {} night(s), total {:.2}",
                venue.name,
                stay.nights(),
                stay.quote(venue.price)
            );
        }
        Command::Book {
            id,
            from,
            to,
            guests,
        } => {
            let mut view = VenueBookingView::new(api, id);
            view.load().await?;
            view.select_dates(from, Some(to));
            view.set_guests(guests);

            let booking = view.submit(store.current()).await?;
            println!(
                "Booked {} from {} to {} for {} guest(s)",
                booking.id,
                booking.days().start,
                booking.days().end,
                booking.guests
            );
        }
        Command::Login { email, password } => {
            let session = sync.login(store, &LoginRequest { email, password }).await?;
            println!("Logged in as {}", session.name());
        }
        Command::Logout => {
            store.logout();
            println!("Logged out");
        }
        Command::Whoami => match store.current() {
            Some(session) => {
                let user = &session.user;
                println!("{} <{}>", user.name, user.email);
                if user.venue_manager {
                    println!("  venue manager");
                }
                if let Some(bio) = &user.bio {
                    println!("  {}", bio);
                }
            }
            None => println!("Not logged in"),
        },
        Command::MyBookings => {
            let session = store.require()?;
            let mut bookings = MyBookings::new(api);
            for booking in bookings.load(session).await? {
                let venue = booking
                    .venue
                    .as_ref()
                    .map(|venue| venue.name.as_str())
                    .unwrap_or("unknown venue");
                let days = booking.days();
                println!(
                    "{}  {} to {}  {} guest(s)  {}",
                    booking.id, days.start, days.end, booking.guests, venue
                );
            }
        }
        Command::MyVenues { bookings } => {
            let session = store.require()?;
            if !session.is_venue_manager() {
                bail!("You must be a venue manager to list your venues");
            }
            let mut venues = MyVenues::new(api);
            venues.load(session).await?;
            if bookings {
                venues.load_bookings().await?;
            }
            for venue in venues.venues() {
                print_venue_line(venue);
                for booking in venues.bookings_for(&venue.id) {
                    let days = booking.days();
                    println!(
                        "    {} to {}  {} guest(s)",
                        days.start, days.end, booking.guests
                    );
                }
            }
        }
        Command::DeleteVenue { id } => {
            let session = store.require()?;
            // A venue already gone on the server counts as deleted
            let mut venues = MyVenues::new(api);
            venues.delete(session, &id).await?;
            println!("Deleted venue {}", id);
        }
    }
    Ok(())
}

fn print_venue_line(venue: &Venue) {
    println!(
        "{}  {}  {:.2}/night  up to {} guest(s)",
        venue.id, venue.name, venue.price, venue.max_guests
    );
}

fn init_logger() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let subscriber = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(subscriber)
        .with(env_filter)
        .try_init()?;

    Ok(())
}
