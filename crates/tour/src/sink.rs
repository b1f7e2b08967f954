use std::cell::RefCell;
use std::rc::Rc;

use foundation::math::GeoPoint;
use serde::Serialize;

use crate::choreography::{Arc, Ring};
use crate::error::SinkError;
use crate::labels::Label;
use crate::location::Location;
use crate::viewport::Breakpoint;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPose {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
    pub duration_ms: f64,
}

/// Declarative globe renderer.
///
/// The engine only ever hands it complete sets: every `set_*` call replaces
/// what the renderer showed for that kind of data.
pub trait RenderSink {
    fn set_active_location(&mut self, point: GeoPoint);
    fn set_camera_pose(&mut self, pose: CameraPose);
    fn set_arcs(&mut self, arcs: &[Arc]);
    fn set_rings(&mut self, rings: &[Ring]);
    fn set_labels(&mut self, labels: &[Label]);
    fn set_markers(&mut self, markers: &[Location]);
    fn destroy(&mut self);
}

/// Creates renderers, once at startup and again on every breakpoint change.
pub trait RenderSinkFactory {
    fn create(&mut self, breakpoint: Breakpoint) -> Result<Box<dyn RenderSink>, SinkError>;
}

/// One recorded renderer call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum SinkCall {
    Created { breakpoint: Breakpoint },
    ActiveLocation { lat: f64, lng: f64 },
    CameraPose(CameraPose),
    Arcs { arcs: Vec<Arc> },
    Rings { rings: Vec<Ring> },
    Labels { labels: Vec<Label> },
    Markers { markers: Vec<Location> },
    Destroyed,
}

/// Call log shared by every sink a [`RecordingSinkFactory`] creates.
pub type SinkLog = Rc<RefCell<Vec<SinkCall>>>;

/// Renderer that records calls instead of drawing.
#[derive(Debug)]
pub struct RecordingSink {
    log: SinkLog,
}

impl RecordingSink {
    pub fn new(log: SinkLog) -> Self {
        Self { log }
    }

    fn push(&self, call: SinkCall) {
        self.log.borrow_mut().push(call);
    }
}

impl RenderSink for RecordingSink {
    fn set_active_location(&mut self, point: GeoPoint) {
        self.push(SinkCall::ActiveLocation {
            lat: point.lat,
            lng: point.lng,
        });
    }

    fn set_camera_pose(&mut self, pose: CameraPose) {
        self.push(SinkCall::CameraPose(pose));
    }

    fn set_arcs(&mut self, arcs: &[Arc]) {
        self.push(SinkCall::Arcs {
            arcs: arcs.to_vec(),
        });
    }

    fn set_rings(&mut self, rings: &[Ring]) {
        self.push(SinkCall::Rings {
            rings: rings.to_vec(),
        });
    }

    fn set_labels(&mut self, labels: &[Label]) {
        self.push(SinkCall::Labels {
            labels: labels.to_vec(),
        });
    }

    fn set_markers(&mut self, markers: &[Location]) {
        self.push(SinkCall::Markers {
            markers: markers.to_vec(),
        });
    }

    fn destroy(&mut self) {
        self.push(SinkCall::Destroyed);
    }
}

#[derive(Debug, Default)]
pub struct RecordingSinkFactory {
    log: SinkLog,
    /// Breakpoints for which `create` fails.
    fail_on: Vec<Breakpoint>,
    created: usize,
}

impl RecordingSinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(breakpoints: impl IntoIterator<Item = Breakpoint>) -> Self {
        Self {
            fail_on: breakpoints.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn log(&self) -> SinkLog {
        Rc::clone(&self.log)
    }

    pub fn created(&self) -> usize {
        self.created
    }
}

impl RenderSinkFactory for RecordingSinkFactory {
    fn create(&mut self, breakpoint: Breakpoint) -> Result<Box<dyn RenderSink>, SinkError> {
        if self.fail_on.contains(&breakpoint) {
            return Err(SinkError::Init(format!("no renderer for {breakpoint:?}")));
        }
        self.created += 1;
        self.log
            .borrow_mut()
            .push(SinkCall::Created { breakpoint });
        Ok(Box::new(RecordingSink::new(self.log())))
    }
}
