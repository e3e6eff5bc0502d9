//! Loads the tasks of a Firestore collection, and prints their countdown every second.
//!
//! Settings are read from `COUNTDOWN_TASKS_*` environment variables (see [`RemoteSettings`]).
//! Set `RUST_LOG` to display more info about what happens.

use countdown_tasks::client::Client;
use countdown_tasks::config::{RemoteSettings, TICK_PERIOD};
use countdown_tasks::countdown::scheduler::Scheduler;
use countdown_tasks::FirestoreProvider;

/// How many times the countdown is printed when `COUNTDOWN_TASKS_TICKS` is not set
const DEFAULT_TICKS: u32 = 10;

#[tokio::main]
async fn main() {
    env_logger::init();

    let settings = match RemoteSettings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };
    let client = match Client::from_settings(&settings) {
        Ok(client) => client,
        Err(err) => {
            log::error!("Unable to create a client: {}", err);
            std::process::exit(1);
        }
    };
    let ticks = std::env::var("COUNTDOWN_TASKS_TICKS").ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    println!("Watching collection {} of project {}", settings.collection, settings.project_id);
    let provider = FirestoreProvider::new(client);
    if let Err(err) = provider.load_all().await {
        log::warn!("Unable to load the tasks, starting with an empty list: {}", err);
    }

    let mut scheduler = Scheduler::new().with_units(settings.units);
    scheduler.start(provider.subscribe());

    for _ in 0..ticks {
        tokio::time::sleep(TICK_PERIOD).await;
        println!("---- {} -----", chrono::Local::now().format("%H:%M:%S"));
        countdown_tasks::utils::print_task_list(&provider.tasks().tasks(), &scheduler);
    }

    scheduler.stop();
}
