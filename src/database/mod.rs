//! Destination database layer.
//!
//! Provides the precondition-checked connection to `places.sqlite` and the
//! schema used to recognise (and, for fixtures, build) a destination profile.
//!
//! # Usage
//!
//! ```no_run
//! use arc2zen::database::Database;
//!
//! // Open a live profile database; fails without writing if it is locked
//! let db = Database::open_destination("places.sqlite").expect("destination unavailable");
//!
//! // Or an in-memory database with the destination schema for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod schema;

pub use connection::Database;
