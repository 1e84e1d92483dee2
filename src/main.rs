#![forbid(unsafe_code)]

mod color;
mod constants;
mod gui;
mod overlay;
mod pool;
mod roster;
mod session;
mod settings;
mod timer;

use tracing::{Level as TraceLevel, error, info};
use tracing_subscriber::FmtSubscriber;

use roster::RosterStore;
use settings::SettingsManager;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = SettingsManager::new();
    info!(path = %settings.path().display(), "settings store ready");

    let roster_store = RosterStore::new(RosterStore::default_path());
    let (students, notice) = match roster_store.load() {
        Ok(loaded) => {
            let notice = loaded.template_created.then(|| {
                format!(
                    "No roster was found, so a template was created at {}. Edit it and restart.",
                    roster_store.path().display()
                )
            });
            (loaded.students, notice)
        }
        Err(err) => {
            error!(error = %err, "roster is unreadable, continuing with an empty class");
            (
                Vec::new(),
                Some(format!(
                    "The roster could not be read ({err}). Fix the file and restart."
                )),
            )
        }
    };

    gui::run_app(settings, roster_store, students, notice)?;
    Ok(())
}
