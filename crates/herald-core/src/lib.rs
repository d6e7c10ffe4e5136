pub mod engine;
pub mod enrichment;
pub mod fingerprint;
pub mod gc;
pub mod kinds;
pub mod logical_key;
pub mod poller;
pub mod render;
pub mod season;
pub mod store;

pub use engine::{Engine, EngineOptions, Origin, Outcome};
pub use enrichment::{Enrichment, RenderExtras};
pub use fingerprint::fingerprint;
pub use logical_key::{resolve_key, resolve_key_parts};
pub use poller::{run_poller, PollKind, PollerSettings};
pub use store::{Store, StoreError};
