use std::sync::Arc;

use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::service::PollService;
use crate::store::{MemoryStore, MongoStore, PollStore};

/// Name of the MongoDB database holding the poll collection.
const DATABASE: &str = "slotpoll";

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Deserialize)]
pub struct Config {
    max_write_attempts: u32,
}

impl Config {
    /// Compare-and-swap attempts per mutation before a conflict surfaces
    /// to the caller.
    pub fn max_write_attempts(&self) -> u32 {
        self.max_write_attempts
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        Ok(rocket.manage(config))
    }
}

/// Which storage engine backs the poll store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StorageBackend {
    /// In-memory map; state vanishes on restart. For development and tests.
    Memory,
    /// MongoDB, via `db_uri`.
    Mongodb,
}

/// Configuration for the storage layer.
#[derive(Debug, Deserialize)]
struct StorageConfig {
    storage: StorageBackend,
    db_uri: Option<String>,
}

/// A fairing that loads the storage config, connects the chosen poll store,
/// and places the [`PollService`] built on top of it into managed state.
/// Must be attached after [`ConfigFairing`].
pub struct StorageFairing;

#[rocket::async_trait]
impl Fairing for StorageFairing {
    fn info(&self) -> Info {
        Info {
            name: "Poll storage",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<StorageConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load storage config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let store: Arc<dyn PollStore> = match config.storage {
            StorageBackend::Memory => {
                info!("Using in-memory poll storage");
                Arc::new(MemoryStore::new())
            }
            StorageBackend::Mongodb => {
                let Some(db_uri) = config.db_uri else {
                    error!("`db_uri` must be set when `storage` is \"mongodb\"");
                    return Err(rocket);
                };
                info!("Loaded storage config, connecting...");
                let client = match MongoClient::with_uri_str(&db_uri).await {
                    Ok(client) => client,
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                };
                info!("...database connection online!");
                Arc::new(MongoStore::new(&client.database(DATABASE)))
            }
        };

        let Some(app_config) = rocket.state::<Config>() else {
            error!("Application config missing; attach ConfigFairing first");
            return Err(rocket);
        };
        let service = PollService::new(store, app_config.max_write_attempts());
        Ok(rocket.manage(service))
    }
}
