//! Location tour engine: steps a globe through an ordered list of locations,
//! animating each move with an arc and ring cascade and labelling the ports
//! around the active stop.

pub mod autoplay;
pub mod choreography;
pub mod config;
pub mod engine;
pub mod error;
pub mod labels;
pub mod location;
pub mod navigation;
pub mod provider;
pub mod sink;
pub mod timer;
pub mod viewport;

pub use autoplay::AutoplayState;
pub use choreography::{Arc, ArcId, Ring, RingId};
pub use config::TourConfig;
pub use engine::{Direction, HostEvent, InteractionKind, RenderMode, TourEngine, TourEvent};
pub use error::{ConfigError, ProviderError, SinkError};
pub use labels::{Label, LabelCollisionResolver, Orientation};
pub use location::{Contact, Location, PointOfInterest, TourData};
pub use provider::{JsonFileProvider, StaticProvider, TourDataProvider};
pub use sink::{CameraPose, RecordingSinkFactory, RenderSink, RenderSinkFactory, SinkCall};
pub use viewport::{Breakpoint, FixedViewport, Viewport};
