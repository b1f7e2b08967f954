use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Mobile,
    Desktop,
}

impl Breakpoint {
    pub fn from_width(width_px: f64, threshold_px: f64) -> Self {
        if width_px < threshold_px {
            Breakpoint::Mobile
        } else {
            Breakpoint::Desktop
        }
    }
}

/// Host viewport, injected into the engine instead of read from a global.
///
/// Changes are delivered separately as
/// [`HostEvent::BreakpointChanged`](crate::engine::HostEvent::BreakpointChanged).
pub trait Viewport {
    fn breakpoint(&self) -> Breakpoint;
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FixedViewport {
    pub width_px: f64,
    pub threshold_px: f64,
}

impl FixedViewport {
    pub fn new(width_px: f64, threshold_px: f64) -> Self {
        Self {
            width_px,
            threshold_px,
        }
    }
}

impl Viewport for FixedViewport {
    fn breakpoint(&self) -> Breakpoint {
        Breakpoint::from_width(self.width_px, self.threshold_px)
    }
}

impl Viewport for Breakpoint {
    fn breakpoint(&self) -> Breakpoint {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive_for_mobile() {
        assert_eq!(Breakpoint::from_width(767.0, 768.0), Breakpoint::Mobile);
        assert_eq!(Breakpoint::from_width(768.0, 768.0), Breakpoint::Desktop);
        assert_eq!(FixedViewport::new(320.0, 768.0).breakpoint(), Breakpoint::Mobile);
    }
}
