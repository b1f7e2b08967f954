use runtime::TimerQueue;

use crate::choreography::{ArcId, PendingRing, RingId};

/// Every deferred action the engine can schedule.
#[derive(Debug, Clone, PartialEq)]
pub enum TourTimer {
    AutoplayTick,
    AutoplayResume,
    ClearArc(ArcId),
    SpawnRing(PendingRing),
    ClearRing(RingId),
}

pub type TourTimers = TimerQueue<TourTimer>;
