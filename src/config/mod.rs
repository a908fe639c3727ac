//! World configuration: the JSON document schema, the embedded default, and
//! file loading plus validation.

pub mod embedded;
pub mod loader;
pub mod schema;

pub use loader::{load_world, ConfigOrigin};
pub use schema::{
    Aggregation, FeedKind, HypothesisDef, NoiseKind, SignalBinding, SignalDef, SimulationDef,
    SourceDef, WorldConfig,
};
