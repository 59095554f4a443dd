use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};

use bustimes_map_sync::config::SyncConfig;
use bustimes_map_sync::initial_view;
use bustimes_map_sync::persistence::{PreferenceStore, SavedView};
use bustimes_map_sync::sync::domain::{Selection, Viewport};
use bustimes_map_sync::sync::endpoints::HttpApi;
use bustimes_map_sync::sync::journey::JourneyView;
use bustimes_map_sync::sync::{MapSnapshot, SyncController, VehicleRendering};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    /// Keep the map in sync and print every change.
    Watch,
    /// Load once, wait for both fetches and print what arrived.
    Once,
    /// Open a single journey and follow its vehicle.
    Journey,
}

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "https://bustimes.org/")]
    api_root: String,

    /// Preference file (last viewport, map style).
    #[arg(long)]
    prefs: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Mode::Watch)]
    mode: Mode,

    #[arg(long, requires_all = ["lng", "zoom"])]
    lat: Option<f64>,

    #[arg(long, requires_all = ["lat", "zoom"])]
    lng: Option<f64>,

    #[arg(long, requires_all = ["lat", "lng"])]
    zoom: Option<f64>,

    /// Map size in pixels, used to derive the visible extent.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Map style to remember in the preference file.
    #[arg(long)]
    style: Option<String>,

    /// Page the map was opened from; a stop page preselects that stop.
    #[arg(long)]
    referrer: Option<String>,

    #[arg(long)]
    journey_id: Option<u64>,

    #[arg(long)]
    vehicle_id: Option<u64>,

    #[arg(long, default_value_t = 60)]
    duration_secs: u64,

    #[arg(long, default_value_t = 12)]
    poll_secs: u64,
}

impl Args {
    fn requested_view(&self) -> Option<SavedView> {
        Some(SavedView {
            zoom: self.zoom?,
            lat: self.lat?,
            lng: self.lng?,
        })
    }

    fn config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_secs(self.poll_secs),
            ..SyncConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("[MAIN] Mode: {:?}", args.mode);
    println!("[MAIN] Data endpoints: {}", args.api_root);

    let store = args.prefs.as_ref().map(PreferenceStore::new);
    if let Some(store) = &store {
        if let Some(style) = &args.style {
            store.save_style(style);
        }
        println!("[MAIN] Map style: {}", store.load_style());
    }

    let api = HttpApi::new(args.api_root.clone());

    match args.mode {
        Mode::Watch => run_watch(&args, api, store).await,
        Mode::Once => run_once(&args, api, store).await,
        Mode::Journey => run_journey(&args, api).await,
    }
}

fn opening_viewport(args: &Args, store: Option<&PreferenceStore>) -> Viewport {
    let view = initial_view(store, args.requested_view());
    println!("[MAIN] Opening at {}", view);
    Viewport::around(view.center(), view.zoom, args.width, args.height)
}

async fn run_once(args: &Args, api: HttpApi, store: Option<PreferenceStore>) -> Result<()> {
    let viewport = opening_viewport(args, store.as_ref());
    let mut controller = SyncController::new(api, args.config());

    let t0 = std::time::Instant::now();
    controller.trigger_load(viewport);
    controller.run_until_idle().await;

    print_summary(&controller.snapshot(), t0.elapsed());
    Ok(())
}

async fn run_watch(args: &Args, api: HttpApi, store: Option<PreferenceStore>) -> Result<()> {
    let viewport = opening_viewport(args, store.as_ref());

    let mut controller = SyncController::new(api, args.config());
    if let Some(store) = store {
        controller = controller.with_preferences(store);
    }

    let t0 = std::time::Instant::now();
    let (handle, task) = controller.spawn();
    let mut updates = handle.subscribe();
    if let Some(referrer) = &args.referrer {
        handle.select(Selection::from_referrer(referrer));
    }
    handle.trigger_load(viewport);

    let deadline = tokio::time::sleep(Duration::from_secs(args.duration_secs));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                println!("[MAIN] Interrupted");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_status(&snapshot, t0.elapsed());
            }
        }
    }

    handle.teardown();
    task.await?;

    print_summary(&handle.snapshot(), t0.elapsed());
    Ok(())
}

async fn run_journey(args: &Args, api: HttpApi) -> Result<()> {
    let Some(journey_id) = args.journey_id else {
        bail!("--journey-id is required in journey mode");
    };

    let poll = Duration::from_secs(args.poll_secs);
    let view = JourneyView::open(Arc::new(api), journey_id, args.vehicle_id, poll).await?;
    let journey = view.journey();

    println!("[JOURNEY] {}", journey.title());
    println!("-----------------------------------");
    println!("Date:             {}", journey.datetime);
    println!("Stops:            {}", journey.stops.len());
    println!("Locations:        {}", journey.locations.len());
    match view.fit_bounds() {
        Some(b) => println!(
            "Fit bounds:       {:.5},{:.5} .. {:.5},{:.5}",
            b.west, b.south, b.east, b.north
        ),
        None => println!("Fit bounds:       -"),
    }
    if let Some(previous) = &journey.previous {
        println!("Previous:         #{} ({})", previous.id, previous.datetime);
    }
    if let Some(next) = &journey.next {
        println!("Next:             #{} ({})", next.id, next.datetime);
    }
    println!("-----------------------------------");

    if !view.is_following() {
        return Ok(());
    }

    let mut updates = view.subscribe();
    let deadline = tokio::time::sleep(Duration::from_secs(args.duration_secs));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    println!("[JOURNEY] Vehicle no longer tracked");
                    break;
                }
                if let Some(vehicle) = updates.borrow_and_update().clone() {
                    println!(
                        "[JOURNEY] Vehicle {} at {:.5},{:.5} heading {}",
                        vehicle.id,
                        vehicle.coordinates.lat,
                        vehicle.coordinates.lng,
                        vehicle.heading.map_or("-".to_string(), |h| format!("{:.0}", h)),
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_status(snapshot: &MapSnapshot, elapsed: Duration) {
    let vehicles = snapshot.visible_vehicles().map_or(0, |v| v.len());
    let stops = snapshot.visible_stops().map_or(0, |s| s.len());
    let mut line = format!(
        "[MAP] {:>8.1}s: {} vehicles, {} stops",
        elapsed.as_secs_f64(),
        vehicles,
        stops
    );
    if let Some(stop) = snapshot.selected_stop() {
        line.push_str(&format!(" | selected {}", stop.name));
    }
    for status in snapshot.status_lines() {
        line.push_str(" | ");
        line.push_str(status);
    }
    println!("{}", line);
}

fn print_summary(snapshot: &MapSnapshot, elapsed: Duration) {
    let count = |n: Option<usize>| n.map_or("-".to_string(), |n| n.to_string());
    let rendering = match snapshot.vehicle_rendering() {
        VehicleRendering::Markers => "markers",
        VehicleRendering::Points => "points",
    };

    println!("[MAIN] Sync Finished");
    println!("-----------------------------------");
    println!("Total Time:       {:?}", elapsed);
    println!(
        "Zoom:             {}",
        snapshot.zoom.map_or("-".to_string(), |z| format!("{:.2}", z))
    );
    println!("Vehicles:         {}", count(snapshot.visible_vehicles().map(|v| v.len())));
    println!("Stops:            {}", count(snapshot.visible_stops().map(|s| s.len())));
    println!("Vehicle layer:    {}", rendering);
    for status in snapshot.status_lines() {
        println!("Status:           {}", status);
    }
    println!("-----------------------------------");
}
