//! Arc and ring cascades played between two locations.
//!
//! Arcs and rings form additive sets. Each member is cleared by its own timer;
//! a new cascade appends to the sets and never cancels an older one.

use foundation::ids::IdAllocator;
use foundation::math::{GeoPoint, central_angle_rad};
use foundation::time::{TimeMs, TimeSpan};
use serde::Serialize;
use tracing::debug;

use crate::config::ChoreographyConfig;
use crate::location::Location;
use crate::timer::{TourTimer, TourTimers};

foundation::define_id!(ArcId);
foundation::define_id!(RingId);

impl Serialize for ArcId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl Serialize for RingId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Arc {
    pub id: ArcId,
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_lat: f64,
    pub end_lng: f64,
    pub color: String,
    pub spawned_at_ms: f64,
    pub lifetime_ms: f64,
    pub altitude: f64,
    pub dash_length: f64,
    pub dash_gap: f64,
    pub dash_initial_gap: f64,
    pub dash_animate_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ring {
    pub id: RingId,
    pub lat: f64,
    pub lng: f64,
    pub spawned_at_ms: f64,
    pub lifetime_ms: f64,
    pub max_radius_deg: f64,
    pub propagation_speed_deg_per_sec: f64,
    pub repeat_period_ms: f64,
    pub rgb: [u8; 3],
}

impl Ring {
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(TimeMs(self.spawned_at_ms), self.lifetime_ms)
    }

    pub fn opacity_at(&self, now: TimeMs) -> f64 {
        ring_opacity(self.span().fraction_elapsed(now))
    }

    pub fn color_at(&self, now: TimeMs) -> String {
        let [r, g, b] = self.rgb;
        format!("rgba({r},{g},{b},{:.3})", self.opacity_at(now))
    }
}

/// Ring fade curve: `sqrt(1 - t)` for `t` in `[0, 1]`.
pub fn ring_opacity(t: f64) -> f64 {
    (1.0 - t.clamp(0.0, 1.0)).sqrt()
}

/// A destination ring waiting for the dash to arrive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingRing {
    pub lat: f64,
    pub lng: f64,
}

/// Time for the whole dash pattern (dash plus gap) to leave the arc.
pub fn full_animation_time_ms(flight_time_ms: f64, dash_length: f64, dash_gap: f64) -> f64 {
    let cycle = dash_length + dash_gap;
    if cycle <= 0.0 {
        return flight_time_ms;
    }
    flight_time_ms * (1.0 + dash_gap / cycle)
}

#[derive(Debug)]
pub struct Choreographer {
    config: ChoreographyConfig,
    ids: IdAllocator,
    arcs: Vec<Arc>,
    rings: Vec<Ring>,
}

impl Choreographer {
    pub fn new(config: ChoreographyConfig) -> Self {
        Self {
            config,
            ids: IdAllocator::new(),
            arcs: Vec::new(),
            rings: Vec::new(),
        }
    }

    pub fn config(&self) -> &ChoreographyConfig {
        &self.config
    }

    /// New parameters apply to cascades started afterwards.
    pub fn set_config(&mut self, config: ChoreographyConfig) {
        self.config = config;
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn full_animation_time_ms(&self) -> f64 {
        full_animation_time_ms(
            self.config.flight_time_ms,
            self.config.dash_length,
            self.config.dash_gap,
        )
    }

    /// How long a ring stays up: the time the dash needs to reach a location.
    pub fn ring_lifetime_ms(&self) -> f64 {
        self.config.flight_time_ms * self.config.relative_length
    }

    /// First activation: a single arrival pulse, no arc.
    pub fn arrive(&mut self, at: &Location, timers: &mut TourTimers, now: TimeMs) {
        self.spawn_ring(at.lat, at.lng, timers, now);
        debug!(location = %at.name, "arrival pulse");
    }

    /// Plays the full cascade from `from` to `to`.
    pub fn transition(
        &mut self,
        from: &Location,
        to: &Location,
        timers: &mut TourTimers,
        now: TimeMs,
    ) {
        let lifetime_ms = self.full_animation_time_ms();
        let arc = Arc {
            id: ArcId::allocate(&mut self.ids),
            start_lat: from.lat,
            start_lng: from.lng,
            end_lat: to.lat,
            end_lng: to.lng,
            color: self.config.arc_color.clone(),
            spawned_at_ms: now.0,
            lifetime_ms,
            altitude: self.arc_altitude(from.point(), to.point()),
            dash_length: self.config.dash_length,
            dash_gap: self.config.dash_gap,
            dash_initial_gap: 1.0,
            dash_animate_time_ms: self.config.flight_time_ms,
        };
        timers.schedule_after(now, lifetime_ms, TourTimer::ClearArc(arc.id));
        self.arcs.push(arc);

        self.spawn_ring(from.lat, from.lng, timers, now);
        timers.schedule_after(
            now,
            self.config.flight_time_ms,
            TourTimer::SpawnRing(PendingRing {
                lat: to.lat,
                lng: to.lng,
            }),
        );

        debug!(
            from = %from.name,
            to = %to.name,
            arc_clear_ms = lifetime_ms,
            "transition cascade scheduled"
        );
    }

    /// The dash reached the destination.
    pub fn land(&mut self, ring: PendingRing, timers: &mut TourTimers, now: TimeMs) -> RingId {
        self.spawn_ring(ring.lat, ring.lng, timers, now)
    }

    pub fn clear_arc(&mut self, id: ArcId) -> bool {
        let before = self.arcs.len();
        self.arcs.retain(|a| a.id != id);
        self.arcs.len() != before
    }

    pub fn clear_ring(&mut self, id: RingId) -> bool {
        let before = self.rings.len();
        self.rings.retain(|r| r.id != id);
        self.rings.len() != before
    }

    /// Drops every arc and ring. Their timers must already be gone.
    pub fn reset(&mut self) {
        self.arcs.clear();
        self.rings.clear();
    }

    fn spawn_ring(&mut self, lat: f64, lng: f64, timers: &mut TourTimers, now: TimeMs) -> RingId {
        let lifetime_ms = self.ring_lifetime_ms();
        let num_rings = self.config.num_rings.max(1) as f64;
        let repeat_period_ms = lifetime_ms / num_rings;
        let propagation_speed_deg_per_sec = if repeat_period_ms > 0.0 {
            self.config.ring_max_radius_deg / (repeat_period_ms / 1000.0)
        } else {
            0.0
        };

        let ring = Ring {
            id: RingId::allocate(&mut self.ids),
            lat,
            lng,
            spawned_at_ms: now.0,
            lifetime_ms,
            max_radius_deg: self.config.ring_max_radius_deg,
            propagation_speed_deg_per_sec,
            repeat_period_ms,
            rgb: self.config.ring_rgb,
        };
        let id = ring.id;
        timers.schedule_after(now, lifetime_ms, TourTimer::ClearRing(id));
        self.rings.push(ring);
        id
    }

    fn arc_altitude(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        self.config.arc_altitude_scale * central_angle_rad(a, b) / std::f64::consts::PI
    }
}
