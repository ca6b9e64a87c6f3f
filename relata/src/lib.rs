//! Relata — aggregate-oriented relational persistence.
//!
//! This facade crate re-exports the Relata sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use relata::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature        | Default | Crate                        |
//! |----------------|---------|------------------------------|
//! | `events`       | **yes** | `relata-events`              |
//! | `data`         | **yes** | `relata-data`                |
//! | `data-sqlx`    | no      | `relata-data-sqlx`           |
//! | `sqlite`       | no      | `relata-data-sqlx/sqlite`    |
//! | `test-support` | no      | `relata-test`                |

// Re-export everything from relata-core at the top level for convenience.
pub use relata_core::*;

#[cfg(feature = "events")]
pub use relata_events;

#[cfg(feature = "data")]
pub use relata_data;

#[cfg(feature = "data-sqlx")]
pub use relata_data_sqlx;

#[cfg(feature = "test-support")]
pub use relata_test;

pub mod prelude {
    //! Re-exports of the most commonly used Relata types.
    pub use relata_core::prelude::*;

    #[cfg(feature = "events")]
    pub use relata_events::{
        AggregateEvent, DeleteEventMode, EventFailurePolicy, EventPublisher, LocalEventBus,
        NoopPublisher,
    };

    #[cfg(feature = "data")]
    pub use relata_data::prelude::*;

    #[cfg(all(feature = "data-sqlx", feature = "sqlite"))]
    pub use relata_data_sqlx::SqliteStrategy;
}
