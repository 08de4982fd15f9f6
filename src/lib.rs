//! factsync - fact repository to inventory custom attribute reconciler
//!
//! Pulls the fact set published by the configuration-management fact
//! repository and writes the relevant facts into custom attribute fields on
//! the systems-management inventory platform. Intended to run unattended
//! from a scheduler.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Orchestrator                           │
//! │     acquire session → fetch → per-fact loop → release        │
//! └──────────────────────────────────────────────────────────────┘
//!        │              │             │              │
//!        ▼              ▼             ▼              ▼
//!  SessionManager   FactSource    FactMapper    HostResolver ──► AttributeSync
//!        │          (HTTP GET)   (static table)       │               │
//!        └──────────────────── InventoryApi (XML-RPC) ┴───────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use factsync::{FactMapper, Orchestrator, PuppetDbFactSource, SatelliteClient, SyncConfig};
//!
//! let config = SyncConfig::load()?;
//! let facts = PuppetDbFactSource::new(&config.facts, config.http_timeout())?;
//! let inventory = SatelliteClient::new(&config.inventory, config.http_timeout())?;
//! let mapper = FactMapper::new(config.mapping.clone());
//!
//! let report = Orchestrator::new(&facts, &inventory, &mapper, config.credentials())
//!     .run()
//!     .await?;
//! ```

pub mod attributes;
pub mod config;
pub mod error;
pub mod facts;
pub mod inventory;
pub mod mapping;
pub mod orchestrator;
pub mod resolver;
pub mod session;
pub mod telemetry;

// Re-export main types
pub use attributes::AttributeSync;
pub use config::{Credentials, FactFeedConfig, InventoryConfig, SyncConfig};
pub use error::{ConfigError, FactSourceError, InventoryError, SyncError};
pub use facts::{Fact, FactSource, PuppetDbFactSource};
pub use inventory::{InventoryApi, InventoryHost, SatelliteClient, SessionKey, SystemId};
pub use mapping::{FactMapper, MappingRule};
pub use orchestrator::{Orchestrator, RunReport, RunState};
pub use resolver::{HostResolver, Resolution};
pub use session::{Session, SessionManager};
