// raydio-core - Shared building blocks for the Raydio livestream client
//
// - models/    - Livestreams, connection / player / play states, ids
// - sdk        - Contracts of the Raydio SDK collaborators
// - platform   - Notification and control-intent contracts of the host
// - memory/    - In-memory SDK used by the demo binary and tests
// - config, logging, bootstrap - ambient setup

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod memory;
pub mod models;
pub mod platform;
pub mod sdk;

pub use config::Config;
pub use error::{Error, Result};
pub use sdk::RaydioSdk;
