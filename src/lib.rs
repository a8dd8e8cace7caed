#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

use rocket::{Build, Rocket};

use config::{ConfigFairing, StorageFairing};
use logging::LoggerFairing;

/// Assemble the server: routes, configuration, storage, and request logging.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(StorageFairing)
        .attach(LoggerFairing)
}

/// A client against a fully-assembled server backed by in-memory storage,
/// independent of any `Rocket.toml` on disk.
#[cfg(test)]
pub(crate) async fn test_client() -> rocket::local::asynchronous::Client {
    let figment = rocket::figment::Figment::from(rocket::Config::debug_default())
        .merge(("storage", "memory"))
        .merge(("max_write_attempts", 3));
    let rocket = rocket::custom(figment)
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(StorageFairing);
    rocket::local::asynchronous::Client::tracked(rocket)
        .await
        .expect("valid rocket instance")
}
