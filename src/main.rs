use color_eyre::Result;
use input_mapper::config::Settings;
use input_mapper::controller::backend::{JoystickBackend, NoJoysticks};
use input_mapper::controller::gilrs_backend::GilrsJoysticks;
use input_mapper::mapping::InputMapperContext;
use input_mapper::ports::EmulatorPorts;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(Settings::default_path);
    let settings = Settings::load_or_default(&settings_path).await;
    info!("Settings: {:?}", settings);

    let mut backend = open_backend();
    let binds_text = read_bind_file(&settings.mapper.mapperfile).await;

    let mut mapper = InputMapperContext::startup(
        EmulatorPorts::logging(),
        &settings,
        backend.as_ref(),
        binds_text.as_deref(),
    )?;

    let mut interval =
        tokio::time::interval(Duration::from_millis(settings.mapper.poll_interval_ms.max(1)));
    info!("Polling joysticks every {}ms, Ctrl-C to quit", settings.mapper.poll_interval_ms);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            }
            _ = interval.tick() => mapper.update_joysticks(backend.as_mut()),
        }
    }

    mapper.losing_focus();
    write_bind_file(&settings.mapper.mapperfile, &mapper.save_binds()).await;
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

fn open_backend() -> Box<dyn JoystickBackend> {
    match GilrsJoysticks::create() {
        Ok(joysticks) => Box::new(joysticks.initialize()),
        Err(e) => {
            warn!("Continuing without joysticks: {}", e);
            Box::new(NoJoysticks)
        }
    }
}

async fn read_bind_file(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            info!("Loading binds from {}", path.display());
            Some(text)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No bind file at {}, using default binds", path.display());
            None
        }
        Err(e) => {
            warn!("Cannot read {}: {}, using default binds", path.display(), e);
            None
        }
    }
}

async fn write_bind_file(path: &Path, text: &str) {
    if let Some(parent) = path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            error!("Cannot create {}: {}", parent.display(), e);
            return;
        }
    }
    match tokio::fs::write(path, text).await {
        Ok(()) => info!("Saved binds to {}", path.display()),
        Err(e) => error!("Failed to save binds to {}: {}", path.display(), e),
    }
}
