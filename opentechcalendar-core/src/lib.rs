//! Event import pipeline for the Open Tech Calendar.
//!
//! Groups are read from the SQLite configuration store, their sources
//! (iCal feeds or Eventbrite organisation pages) are fetched and normalized
//! into [`Event`]s, filtered by each group's keyword rules, and written to
//! the markdown event store:
//! - `repository` for group records and keyword lists
//! - `normalize` for the source adapters
//! - `filter` for the import decision
//! - `store` for the on-disk format
//! - `importer` to drive the whole thing for one group

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod fetch;
pub mod filter;
pub mod group;
pub mod importer;
pub mod normalize;
pub mod repository;
pub mod store;

pub use config::ImportConfig;
pub use error::{ImportError, ImportResult};
pub use event::{Attendance, CommunityParticipation, Event};
pub use group::{Group, ImportType, Policy};
pub use importer::{EventFailure, ImportReport, Importer};
