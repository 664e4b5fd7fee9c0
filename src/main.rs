//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here; attendance rules live in the use cases.

use dotenv::dotenv;
use geo_attend::adapters::clock::SystemClock;
use geo_attend::adapters::identity::StaticIdentity;
use geo_attend::adapters::location::{FixedLocation, HttpLocationAdapter};
use geo_attend::adapters::persistence::SqliteRepo;
use geo_attend::adapters::ui::tui::TuiInputPort;
use geo_attend::domain::Coordinate;
use geo_attend::ports::{
    ClockPort, GeofenceStore, IdentityPort, InputPort, LocationPort, OverrideStore, SessionStore,
};
use geo_attend::shared::config::AppConfig;
use geo_attend::usecases::{AttendanceService, GeofenceService, OverrideService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    geo_attend::adapters::ui::init_ui();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config could not be loaded; using defaults");
            AppConfig::default()
        }
    };

    let data_path = PathBuf::from(cfg.data_dir_or_default());
    let data_dir_abs = data_path
        .canonicalize()
        .unwrap_or_else(|_| data_path.clone());
    info!(path = %data_dir_abs.display(), "data directory");

    // --- Store: one SQLite file backs all three store ports ---
    let sqlite_repo = Arc::new(
        SqliteRepo::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );
    let geofences: Arc<dyn GeofenceStore> = Arc::clone(&sqlite_repo) as Arc<dyn GeofenceStore>;
    let sessions: Arc<dyn SessionStore> = Arc::clone(&sqlite_repo) as Arc<dyn SessionStore>;
    let overrides: Arc<dyn OverrideStore> = Arc::clone(&sqlite_repo) as Arc<dyn OverrideStore>;

    // --- Identity ---
    let identity: Arc<dyn IdentityPort> = Arc::new(StaticIdentity::from_config(&cfg));
    match identity.current_user().await {
        Ok(Some(user)) => info!(
            user_id = %user.id,
            role = user.role.as_str(),
            class_name = %user.class_name,
            "signed in"
        ),
        _ => warn!("no profile configured (set GEO_ATTEND_CLASS_NAME and GEO_ATTEND_USER_ID); actions will require login"),
    }

    // --- Location: HTTP lookup, else fixed coordinates, else unavailable ---
    let location: Arc<dyn LocationPort> = if let Some(url) = cfg.location_url.clone() {
        info!(url = %url, "location via HTTP lookup");
        Arc::new(HttpLocationAdapter::new(url))
    } else if let Some((lat, lng)) = cfg.fixed_location() {
        let at = Coordinate::new(lat, lng)
            .map_err(|e| anyhow::anyhow!("fixed location is invalid: {}", e))?;
        info!(location = %at, "location fixed by configuration");
        Arc::new(FixedLocation::new(at))
    } else {
        warn!("no location source configured (GEO_ATTEND_LOCATION_URL or GEO_ATTEND_FIXED_LATITUDE/LONGITUDE)");
        Arc::new(FixedLocation::denied("no location source configured"))
    };

    let location_timeout = Duration::from_secs(cfg.location_timeout_secs_or_default());
    info!(
        timeout_secs = location_timeout.as_secs(),
        "location timeout: {} s",
        location_timeout.as_secs()
    );

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);

    // --- Services ---
    let attendance = Arc::new(AttendanceService::new(
        Arc::clone(&identity),
        location,
        Arc::clone(&clock),
        Arc::clone(&geofences),
        sessions,
        location_timeout,
    ));
    let override_service = Arc::new(OverrideService::new(
        Arc::clone(&identity),
        Arc::clone(&clock),
        overrides,
    ));
    let geofence_service = Arc::new(GeofenceService::new(Arc::clone(&identity), geofences));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        attendance,
        override_service,
        geofence_service,
        data_path.join("exports"),
    ));

    // --- Run (main menu -> check in / check out / override / history) ---
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
