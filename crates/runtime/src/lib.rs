pub mod event_bus;
pub mod metrics;
pub mod timers;

pub use event_bus::*;
pub use metrics::*;
pub use timers::*;
