//! Storage and derived-statistics engine for a multiple-choice training
//! quiz. The engine owns every persisted document: the session log of
//! answered questions, the aggregate accuracy statistics, the review queue
//! of currently missed questions, and the per-day learning history used
//! for streaks. The UI layer is a pure consumer of the operations exposed
//! on [`store::Store`].
//!
//! All operations are synchronous; sled holds an exclusive lock on the
//! data directory, so there is no multi-process write race to manage.

pub mod config;
pub mod logging;
pub mod store;
