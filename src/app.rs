use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;

use crate::core::{
    alerts::{
        dispatch::{AlertSink, ContactSink, FanoutSink, LogSink, SoundSink},
        engine::{Destination, ProximityEngine},
        model::CooldownMode,
    },
    config::{ConfigManager, Settings},
    coordinator::Coordinator,
    geo::{GeoPoint, ProximityThreshold},
    log_io::StartAt,
    model::PositionFix,
    sos::{
        dispatch::{resolve_location, LogGateway, SosDispatcher},
        model::{ContactDraft, SosLocation},
        store::ContactStore,
    },
    stations::StationCatalog,
    tracker::{PositionSource, TrackedPositionLog},
};

/// How often the push task checks the position log.
const PUSH_CHECK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "buzz-yatra", about = "Proximity alerts and emergency SOS")]
pub struct Cli {
    /// Directory holding settings.json
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow a position log and alert when close to the destination
    Track(TrackArgs),
    /// List known stations
    Stations,
    /// Send an SOS to a user's emergency contacts
    Sos(SosArgs),
    /// Manage emergency contacts
    #[command(subcommand)]
    Contacts(ContactsCommand),
}

#[derive(Args, Debug)]
struct TrackArgs {
    /// Destination station name
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    to: Option<String>,
    /// Destination latitude
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,
    /// Destination longitude
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
    /// Alert radius in meters
    #[arg(long)]
    alert_distance: f64,
    /// Position log to follow ("lat,lon" per line)
    #[arg(long)]
    positions: PathBuf,
    /// Replay the existing contents of the position log first
    #[arg(long)]
    from_start: bool,
    /// Re-alert on every in-radius sample (deprecated behavior)
    #[arg(long)]
    legacy: bool,
}

#[derive(Args, Debug)]
struct SosArgs {
    #[arg(long)]
    user: String,
    /// Position log whose last fix is used while it is fresh
    #[arg(long)]
    positions: Option<PathBuf>,
    /// Current latitude, used when the position log has no fresh fix
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,
    /// Current longitude
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
    /// Replaces the default emergency line
    #[arg(long)]
    message: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ContactsCommand {
    List {
        #[arg(long)]
        user: String,
    },
    Add {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        relationship: String,
        #[arg(long)]
        primary: bool,
    },
    Remove {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: u64,
    },
    SetPrimary {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: u64,
    },
}

/// Parse the command line and run the selected command.
pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let settings = ConfigManager::new(cli.config_dir.clone()).load();

    match cli.command {
        Command::Track(args) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(track(args, &settings))
        }
        Command::Stations => {
            let catalog = StationCatalog::load(&settings.stations_file)?;
            for name in catalog.names() {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Sos(args) => sos(args, &settings),
        Command::Contacts(cmd) => contacts(cmd, &settings),
    }
}

fn resolve_destination(args: &TrackArgs, settings: &Settings) -> Result<Destination, Box<dyn Error>> {
    let target = match (&args.to, args.lat, args.lon) {
        (Some(name), _, _) => {
            let catalog = StationCatalog::load(&settings.stations_file)?;
            catalog.find(name)?.location()?
        }
        (None, Some(lat), Some(lon)) => GeoPoint::new(lat, lon)?,
        _ => return Err("either --to or --lat/--lon is required".into()),
    };
    Ok(Destination {
        target,
        threshold: ProximityThreshold::new(args.alert_distance)?,
    })
}

fn build_sink(settings: &Settings) -> Result<Box<dyn AlertSink>, Box<dyn Error>> {
    let mut sink = FanoutSink::new().with(Box::new(LogSink));
    if let Some(sound) = &settings.sound_file {
        sink = sink.with(Box::new(SoundSink::new(sound.clone())));
    }
    if let Some(user) = &settings.notify_user {
        let mut store = ContactStore::new(settings.data_dir.clone());
        let contacts = store.load(user)?.contacts.clone();
        if contacts.iter().all(|c| !c.is_active) {
            log::warn!("{} has no active contacts to notify on arrival", user);
        }
        let dispatcher = Arc::new(SosDispatcher::new(Arc::new(LogGateway)));
        sink = sink.with(Box::new(ContactSink::new(dispatcher, contacts)));
    }
    Ok(Box::new(sink))
}

async fn track(args: TrackArgs, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let destination = resolve_destination(&args, settings)?;
    let mode = if args.legacy {
        CooldownMode::Legacy
    } else {
        settings.cooldown_mode
    };
    let poll_interval = settings.poll_interval();

    let mut coordinator = Coordinator::new(ProximityEngine::for_mode(mode), build_sink(settings)?, poll_interval);
    coordinator.start_route(destination);

    let start = if args.from_start {
        StartAt::Beginning
    } else {
        StartAt::End
    };
    let mut source = TrackedPositionLog::open(&args.positions, start)?;
    log::info!("Following positions in {:?}", source.path());

    // Push source: forward fixes from the log as they appear.
    let (tx, mut rx) = mpsc::channel::<Vec<PositionFix>>(32);
    let push_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PUSH_CHECK_INTERVAL);
        loop {
            ticker.tick().await;
            match source.poll_fixes() {
                Ok(fixes) if fixes.is_empty() => {}
                Ok(fixes) => {
                    if tx.send(fixes).await.is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("Error reading positions: {}", e),
            }
        }
    });

    let mut poll = tokio::time::interval(poll_interval);
    let mut last_shown = String::new();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let evaluation = tokio::select! {
            Some(fixes) = rx.recv() => {
                let now = Instant::now();
                let mut latest = None;
                for fix in &fixes {
                    latest = Some(coordinator.on_push(fix, now));
                }
                latest
            }
            _ = poll.tick() => coordinator.on_poll(Instant::now()),
            result = &mut shutdown => {
                if let Err(e) = result {
                    log::error!("Failed to listen for ctrl-c: {}", e);
                }
                coordinator.stop();
                break;
            }
        };

        if let Some(evaluation) = evaluation {
            let shown = evaluation.to_string();
            if shown != last_shown {
                println!("{}  [{:?}]", shown, coordinator.status());
                last_shown = shown;
            }
        }
    }

    push_task.abort();
    println!("Tracking status: {:?}", coordinator.status());
    Ok(())
}

/// Last fix in a position log. Untimed lines take the file's modification time.
fn last_logged_location(path: &Path) -> io::Result<Option<SosLocation>> {
    let mut log = TrackedPositionLog::open(path, StartAt::Beginning)?;
    let Some(fix) = log.poll_fixes()?.pop() else {
        return Ok(None);
    };
    let captured_at = match fix.timestamp {
        Some(ts) => Utc
            .timestamp_opt(ts.as_secs() as i64, ts.subsec_nanos())
            .single()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "timestamp out of range"))?,
        None => DateTime::<Utc>::from(fs::metadata(path)?.modified()?),
    };
    Ok(Some(SosLocation::new(fix.point, captured_at)))
}

fn sos_location(args: &SosArgs, now: DateTime<Utc>) -> Result<SosLocation, Box<dyn Error>> {
    let cached = match &args.positions {
        Some(path) => last_logged_location(path)?,
        None => None,
    };
    let explicit = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(SosLocation::new(GeoPoint::new(lat, lon)?, now)),
        _ => None,
    };
    Ok(resolve_location(cached.as_ref(), now, || explicit)?)
}

fn sos(args: SosArgs, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let location = sos_location(&args, Utc::now())?;
    let mut store = ContactStore::new(settings.data_dir.clone());
    let book = store.load(&args.user)?;

    let dispatcher = SosDispatcher::new(Arc::new(LogGateway));
    let report = dispatcher.send_sos(book, location, args.message.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn contacts(cmd: ContactsCommand, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let mut store = ContactStore::new(settings.data_dir.clone());
    let now = Utc::now();

    let user = match cmd {
        ContactsCommand::List { user } => {
            let book = store.load(&user)?;
            println!("{}", serde_json::to_string_pretty(&book.contacts)?);
            return Ok(());
        }
        ContactsCommand::Add {
            user,
            name,
            phone,
            relationship,
            primary,
        } => {
            let draft = ContactDraft {
                name,
                phone_number: phone,
                relationship,
                is_primary: primary,
            };
            let contact = store.get_mut(&user)?.add(draft, now)?;
            println!("Added contact {} ({})", contact.id, contact.name);
            user
        }
        ContactsCommand::Remove { user, id } => {
            let removed = store.get_mut(&user)?.remove(id)?;
            println!("Removed contact {} ({})", removed.id, removed.name);
            user
        }
        ContactsCommand::SetPrimary { user, id } => {
            let contact = store.get_mut(&user)?.set_primary(id, now)?;
            println!("{} is now the primary contact", contact.name);
            user
        }
    };

    store.save(&user)?;
    Ok(())
}
