//! Composition root: wires navigation, autoplay, choreography and labels to a
//! render sink, and drives every timer from the host's clock.
//!
//! The host owns the clock. It forwards input as [`HostEvent`]s and calls
//! [`TourEngine::advance_to`] (or [`TourEngine::update`]) from its frame loop;
//! due timers fire in deadline order with the engine clock set to each
//! deadline.

use foundation::time::TimeMs;
use runtime::{Event, EventBus, Fired, Metrics};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::autoplay::{AutoplayScheduler, AutoplayState};
use crate::choreography::{Arc, Choreographer, Ring};
use crate::config::TourConfig;
use crate::error::{ConfigError, SinkError};
use crate::labels::{Label, LabelCollisionResolver, labels_for};
use crate::location::{Location, PointOfInterest};
use crate::navigation::{LocationChange, NavigationState};
use crate::provider::{TourDataProvider, fetch_or_empty};
use crate::sink::{CameraPose, RenderSink, RenderSinkFactory};
use crate::timer::{TourTimer, TourTimers};
use crate::viewport::{Breakpoint, Viewport};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InteractionKind {
    Pointer,
    Touch,
    Click,
    Keyboard,
}

/// Input forwarded by the host surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum HostEvent {
    /// Left/right keys. Counts as a keyboard interaction.
    Advance(Direction),
    Interaction(InteractionKind),
    VisibilityChanged { visible: bool },
    BreakpointChanged(Breakpoint),
    /// The current renderer finished initializing.
    RendererReady,
}

/// What the engine reports back to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TourEvent {
    DataLoaded { locations: usize, ports: usize },
    DataLoadFailed { reason: String },
    LocationChanged {
        previous: Option<Location>,
        current: Location,
    },
    AutoplayStateChanged(AutoplayState),
    RendererReady,
    RendererRecreated { breakpoint: Breakpoint },
    RendererFailed { reason: String },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderMode {
    /// A renderer exists but has not reported ready; scene pushes are held.
    AwaitingReady,
    Live,
    /// The renderer failed to initialize; the host shows a static fallback.
    Fallback,
}

pub struct TourEngine<F: RenderSinkFactory> {
    config: TourConfig,
    now: TimeMs,
    timers: TourTimers,
    navigation: NavigationState,
    autoplay: AutoplayScheduler,
    choreographer: Choreographer,
    resolver: LabelCollisionResolver,
    ports: Vec<PointOfInterest>,
    labels: Vec<Label>,
    factory: F,
    sink: Option<Box<dyn RenderSink>>,
    mode: RenderMode,
    breakpoint: Breakpoint,
    camera: Option<CameraPose>,
    loaded: bool,
    activated: bool,
    destroyed: bool,
    events: EventBus<TourEvent>,
    metrics: Metrics,
}

impl<F: RenderSinkFactory> TourEngine<F> {
    pub fn new(config: TourConfig, factory: F, viewport: &dyn Viewport) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut engine = Self {
            autoplay: AutoplayScheduler::new(config.autoplay.clone()),
            choreographer: Choreographer::new(config.choreography.clone()),
            resolver: LabelCollisionResolver::new(
                config.labels.cell_size_deg,
                config.labels.max_nudges,
            ),
            config,
            now: TimeMs::ZERO,
            timers: TourTimers::new(),
            navigation: NavigationState::default(),
            ports: Vec::new(),
            labels: Vec::new(),
            factory,
            sink: None,
            mode: RenderMode::AwaitingReady,
            breakpoint: viewport.breakpoint(),
            camera: None,
            loaded: false,
            activated: false,
            destroyed: false,
            events: EventBus::new(),
            metrics: Metrics::new(),
        };
        engine.create_sink();
        Ok(engine)
    }

    pub fn now(&self) -> TimeMs {
        self.now
    }

    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn current_location(&self) -> Option<&Location> {
        self.navigation.current()
    }

    pub fn index(&self) -> Option<usize> {
        self.navigation.index()
    }

    pub fn arcs(&self) -> &[Arc] {
        self.choreographer.arcs()
    }

    pub fn rings(&self) -> &[Ring] {
        self.choreographer.rings()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn autoplay_state(&self) -> AutoplayState {
        self.autoplay.state()
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    pub fn camera_pose(&self) -> Option<CameraPose> {
        self.camera
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn events(&self) -> &[Event<TourEvent>] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event<TourEvent>> {
        self.events.drain()
    }

    /// Fetches tour data. A failing provider leaves the tour empty.
    pub fn load(&mut self, provider: &dyn TourDataProvider) {
        if self.destroyed {
            return;
        }
        let (data, err) = fetch_or_empty(provider);
        let event = match err {
            Some(err) => TourEvent::DataLoadFailed {
                reason: err.to_string(),
            },
            None => TourEvent::DataLoaded {
                locations: data.locations.len(),
                ports: data.ports.len(),
            },
        };
        self.events.emit(self.now, event);

        self.ports = data.ports;
        self.navigation.replace_sequence(data.locations);
        self.loaded = true;
        self.push_markers();

        if self.activated {
            match self.navigation.commit() {
                Some(change) => self.apply_change(change),
                None => self.refresh_labels(),
            }
        } else {
            self.try_activate();
        }
    }

    pub fn handle(&mut self, event: HostEvent) {
        if self.destroyed {
            return;
        }
        match event {
            HostEvent::Advance(direction) => {
                self.interact(InteractionKind::Keyboard);
                match direction {
                    Direction::Next => self.next(),
                    Direction::Previous => self.prev(),
                };
            }
            HostEvent::Interaction(kind) => self.interact(kind),
            HostEvent::VisibilityChanged { visible } => {
                let before = self.autoplay.state();
                self.autoplay.set_visible(visible, &mut self.timers, self.now);
                self.note_autoplay(before);
            }
            HostEvent::BreakpointChanged(breakpoint) => self.change_breakpoint(breakpoint),
            HostEvent::RendererReady => {
                if self.mode != RenderMode::AwaitingReady {
                    return;
                }
                self.mode = RenderMode::Live;
                info!(breakpoint = ?self.breakpoint, "renderer ready");
                self.events.emit(self.now, TourEvent::RendererReady);
                self.replay_scene();
                self.try_activate();
            }
        }
    }

    pub fn next(&mut self) -> bool {
        self.navigate(NavigationState::next)
    }

    pub fn prev(&mut self) -> bool {
        self.navigate(NavigationState::prev)
    }

    pub fn goto(&mut self, index: i64) -> bool {
        self.navigate(|nav| nav.goto(index))
    }

    pub fn goto_location(&mut self, location: &Location) -> bool {
        self.navigate(|nav| nav.goto_by_value(location))
    }

    /// Runs every timer due at or before `now`.
    ///
    /// Time never moves backwards; an earlier or non-finite `now` is ignored.
    pub fn advance_to(&mut self, now: TimeMs) {
        if self.destroyed || !now.0.is_finite() || now.total_cmp(&self.now).is_lt() {
            return;
        }
        while let Some(fired) = self.timers.pop_due(now) {
            self.now = fired.deadline;
            self.fire(fired);
        }
        self.now = now;
    }

    pub fn update(&mut self, dt_ms: f64) {
        if !dt_ms.is_finite() {
            return;
        }
        self.advance_to(self.now.after(dt_ms));
    }

    /// When the next pending timer is due, if any.
    pub fn next_deadline(&self) -> Option<TimeMs> {
        self.timers.next_deadline()
    }

    /// Applies a new configuration.
    ///
    /// Choreography changes affect cascades started afterwards. In-flight
    /// arcs and rings keep their schedule.
    pub fn reconfigure(&mut self, config: TourConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if self.destroyed {
            return Ok(());
        }

        if self.activated {
            let before = self.autoplay.state();
            self.autoplay
                .reconfigure(config.autoplay.clone(), &mut self.timers, self.now);
            self.note_autoplay(before);
        } else {
            // Autoplay starts on activation.
            self.autoplay.set_config(config.autoplay.clone());
        }

        self.choreographer.set_config(config.choreography.clone());
        self.resolver =
            LabelCollisionResolver::new(config.labels.cell_size_deg, config.labels.max_nudges);
        self.config = config;
        self.refresh_labels();
        Ok(())
    }

    /// Tears the engine down. Every pending timer is invalidated and the
    /// renderer destroyed; afterwards all operations are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        let dropped = self.timers.clear();
        self.autoplay.reset();
        self.choreographer.reset();
        self.labels.clear();
        if let Some(mut sink) = self.sink.take() {
            sink.destroy();
        }
        self.destroyed = true;
        info!(dropped_timers = dropped, "tour engine destroyed");
    }

    fn try_activate(&mut self) {
        if self.activated || !self.loaded || self.mode == RenderMode::AwaitingReady {
            return;
        }
        let Some(change) = self.navigation.commit() else {
            return;
        };
        self.activated = true;
        self.apply_change(change);

        if self.config.autoplay.enabled {
            let before = self.autoplay.state();
            self.autoplay.start(&mut self.timers, self.now);
            self.note_autoplay(before);
        }
    }

    fn navigate(&mut self, op: impl FnOnce(&mut NavigationState) -> Option<LocationChange>) -> bool {
        if self.destroyed || !self.activated {
            return false;
        }
        self.metrics.inc_counter("tour.advances", 1);
        match op(&mut self.navigation) {
            Some(change) => {
                self.apply_change(change);
                true
            }
            None => false,
        }
    }

    fn interact(&mut self, kind: InteractionKind) {
        debug!(?kind, "interaction");
        let before = self.autoplay.state();
        self.autoplay.pause(&mut self.timers, self.now);
        self.note_autoplay(before);
    }

    fn apply_change(&mut self, change: LocationChange) {
        self.metrics.inc_counter("tour.location_changes", 1);

        match &change.previous {
            None => {
                self.choreographer
                    .arrive(&change.current, &mut self.timers, self.now);
                self.metrics.inc_counter("tour.rings_spawned", 1);
            }
            Some(previous) => {
                self.choreographer.transition(
                    previous,
                    &change.current,
                    &mut self.timers,
                    self.now,
                );
                self.metrics.inc_counter("tour.arcs_spawned", 1);
                self.metrics.inc_counter("tour.rings_spawned", 1);
            }
        }

        debug!(
            from = change.previous.as_ref().map(|l| l.name.as_str()),
            to = %change.current.name,
            at_ms = self.now.0,
            "location changed"
        );

        let pose = CameraPose {
            lat: change.current.lat,
            lng: change.current.lng,
            altitude: self.config.camera.altitude(self.breakpoint),
            duration_ms: self.config.camera.camera_transition_ms,
        };
        self.camera = Some(pose);
        if self.mode == RenderMode::Live
            && let Some(sink) = self.sink.as_mut()
        {
            sink.set_active_location(change.current.point());
            sink.set_camera_pose(pose);
        }

        self.events.emit(
            self.now,
            TourEvent::LocationChanged {
                previous: change.previous,
                current: change.current,
            },
        );

        self.refresh_labels();
        self.push_arcs();
        self.push_rings();
    }

    fn fire(&mut self, fired: Fired<TourTimer>) {
        match fired.payload {
            TourTimer::AutoplayTick => {
                if self.autoplay.on_tick(fired.id, &mut self.timers, self.now) {
                    self.metrics.inc_counter("tour.autoplay_ticks", 1);
                    self.next();
                }
            }
            TourTimer::AutoplayResume => {
                let before = self.autoplay.state();
                let advance = self.autoplay.on_resume(fired.id, &mut self.timers, self.now);
                self.note_autoplay(before);
                if advance {
                    self.next();
                }
            }
            TourTimer::ClearArc(id) => {
                if self.choreographer.clear_arc(id) {
                    self.push_arcs();
                }
            }
            TourTimer::SpawnRing(ring) => {
                self.choreographer.land(ring, &mut self.timers, self.now);
                self.metrics.inc_counter("tour.rings_spawned", 1);
                self.push_rings();
            }
            TourTimer::ClearRing(id) => {
                if self.choreographer.clear_ring(id) {
                    self.push_rings();
                }
            }
        }
    }

    fn note_autoplay(&mut self, before: AutoplayState) {
        let after = self.autoplay.state();
        if after != before {
            self.events
                .emit(self.now, TourEvent::AutoplayStateChanged(after));
        }
    }

    fn create_sink(&mut self) {
        match self.factory.create(self.breakpoint) {
            Ok(sink) => {
                self.sink = Some(sink);
                self.mode = RenderMode::AwaitingReady;
            }
            Err(err) => self.enter_fallback(err),
        }
    }

    fn change_breakpoint(&mut self, breakpoint: Breakpoint) {
        if breakpoint == self.breakpoint {
            return;
        }
        self.breakpoint = breakpoint;
        if self.mode == RenderMode::Fallback {
            // A failed renderer is not retried.
            return;
        }

        if let Some(mut sink) = self.sink.take() {
            sink.destroy();
        }
        self.create_sink();
        if self.mode == RenderMode::AwaitingReady {
            self.metrics.inc_counter("tour.sink_recreated", 1);
            self.events
                .emit(self.now, TourEvent::RendererRecreated { breakpoint });
            info!(?breakpoint, "renderer recreated");
        }
        self.refresh_labels();
    }

    fn enter_fallback(&mut self, err: SinkError) {
        if self.mode == RenderMode::Fallback {
            return;
        }
        warn!("{err}; switching to static fallback");
        self.sink = None;
        self.mode = RenderMode::Fallback;
        self.events.emit(
            self.now,
            TourEvent::RendererFailed {
                reason: err.to_string(),
            },
        );
        self.try_activate();
    }

    /// Pushes the whole scene, used when a renderer becomes ready.
    fn replay_scene(&mut self) {
        self.push_markers();
        if self.mode != RenderMode::Live {
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Some(pose) = self.camera {
            sink.set_camera_pose(pose);
        }
        if self.activated
            && let Some(current) = self.navigation.current()
        {
            sink.set_active_location(current.point());
        }
        sink.set_labels(&self.labels);
        sink.set_arcs(self.choreographer.arcs());
        sink.set_rings(self.choreographer.rings());
    }

    fn refresh_labels(&mut self) {
        self.labels = match (self.activated, self.navigation.current()) {
            (true, Some(current)) => {
                let style = self.config.labels.style(self.breakpoint);
                self.resolver
                    .resolve(&labels_for(current, &self.ports, style))
            }
            _ => Vec::new(),
        };
        if self.mode == RenderMode::Live
            && let Some(sink) = self.sink.as_mut()
        {
            sink.set_labels(&self.labels);
        }
    }

    fn push_markers(&mut self) {
        if self.mode == RenderMode::Live
            && let Some(sink) = self.sink.as_mut()
        {
            sink.set_markers(self.navigation.sequence());
        }
    }

    fn push_arcs(&mut self) {
        self.metrics
            .set_gauge("tour.active_arcs", self.choreographer.arcs().len() as i64);
        if self.mode == RenderMode::Live
            && let Some(sink) = self.sink.as_mut()
        {
            sink.set_arcs(self.choreographer.arcs());
        }
    }

    fn push_rings(&mut self) {
        if self.mode == RenderMode::Live
            && let Some(sink) = self.sink.as_mut()
        {
            sink.set_rings(self.choreographer.rings());
        }
    }
}

impl<F: RenderSinkFactory> Drop for TourEngine<F> {
    fn drop(&mut self) {
        self.destroy();
    }
}
