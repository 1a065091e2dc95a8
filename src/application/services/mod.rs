//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, Operator, TreeCodec)
//! but are themselves concrete structs, not traits.

mod session;
mod store;

pub use session::{SessionService, VisitOutcome, VisitReport};
pub use store::TreeStore;
