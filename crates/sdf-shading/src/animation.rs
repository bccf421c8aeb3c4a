//! Frame clock and staged reveal timeline.

use serde::Deserialize;

use crate::uniforms::{ShaderUniformSet, REVEAL_BANDS};

/// Easing function type: takes progress (0.0 to 1.0) and returns eased value (0.0 to 1.0)
pub type EasingFn = fn(f32) -> f32;

pub fn linear(t: f32) -> f32 {
    t
}

/// Quadratic, slow start
pub fn ease_in(t: f32) -> f32 {
    t * t
}

/// Quadratic, slow end
pub fn ease_out(t: f32) -> f32 {
    t * (2.0 - t)
}

pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

pub fn ease_in_cubic(t: f32) -> f32 {
    t * t * t
}

pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t - 1.0;
    t * t * t + 1.0
}

pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let t = t - 1.0;
        1.0 + 4.0 * t * t * t
    }
}

/// Named easing, selectable from config (`easing = "ease_out_cubic"`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
}

impl Easing {
    pub const ALL: [Easing; 7] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
    ];

    pub fn function(self) -> EasingFn {
        match self {
            Easing::Linear => linear,
            Easing::EaseIn => ease_in,
            Easing::EaseOut => ease_out,
            Easing::EaseInOut => ease_in_out,
            Easing::EaseInCubic => ease_in_cubic,
            Easing::EaseOutCubic => ease_out_cubic,
            Easing::EaseInOutCubic => ease_in_out_cubic,
        }
    }

    /// Applies the curve to `t` clamped to [0, 1].
    pub fn apply(self, t: f32) -> f32 {
        (self.function())(t.clamp(0.0, 1.0))
    }

    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "ease_in",
            Easing::EaseOut => "ease_out",
            Easing::EaseInOut => "ease_in_out",
            Easing::EaseInCubic => "ease_in_cubic",
            Easing::EaseOutCubic => "ease_out_cubic",
            Easing::EaseInOutCubic => "ease_in_out_cubic",
        }
    }
}

/// Default per-frame time increment.
pub const DEFAULT_TIME_STEP: f32 = 0.0002;

/// Monotonic shader time. Advances by a fixed step per frame, not by wall time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameClock {
    pub time: f32,
    pub step: f32,
    pub frame: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_STEP)
    }
}

impl FrameClock {
    pub fn new(step: f32) -> Self {
        Self {
            time: 0.0,
            step: step.max(0.0),
            frame: 0,
        }
    }

    /// Advance one frame and return the new time.
    pub fn tick(&mut self) -> f32 {
        self.time += self.step;
        self.frame += 1;
        self.time
    }
}

/// Sequentially ramps the four reveal bands from 0 to 1.
///
/// Band `i` starts `i * stagger` seconds after [`RevealTimeline::start`] and takes `duration`
/// seconds. While idle the timeline reports no progress so manual values stay in effect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealTimeline {
    pub duration: f32,
    pub stagger: f32,
    pub easing: Easing,
    elapsed: Option<f32>,
}

impl Default for RevealTimeline {
    fn default() -> Self {
        Self::new(1.2, 0.35, Easing::default())
    }
}

impl RevealTimeline {
    pub fn new(duration: f32, stagger: f32, easing: Easing) -> Self {
        Self {
            duration: duration.max(0.0),
            stagger: stagger.max(0.0),
            easing,
            elapsed: None,
        }
    }

    /// (Re)start from zero.
    pub fn start(&mut self) {
        log::debug!(
            "Reveal timeline started (duration {}s, stagger {}s, {})",
            self.duration,
            self.stagger,
            self.easing.name()
        );
        self.elapsed = Some(0.0);
    }

    pub fn stop(&mut self) {
        self.elapsed = None;
    }

    pub fn advance(&mut self, dt: f32) {
        if let Some(elapsed) = self.elapsed.as_mut() {
            *elapsed += dt.max(0.0);
        }
    }

    pub fn total_duration(&self) -> f32 {
        (REVEAL_BANDS - 1) as f32 * self.stagger + self.duration
    }

    pub fn is_running(&self) -> bool {
        self.elapsed.is_some() && !self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed
            .is_some_and(|elapsed| elapsed >= self.total_duration())
    }

    /// Eased progress per band, or `None` if never started.
    pub fn progress(&self) -> Option<[f32; REVEAL_BANDS]> {
        let elapsed = self.elapsed?;

        Some(std::array::from_fn(|band| {
            let local = elapsed - band as f32 * self.stagger;
            let t = if local <= 0.0 {
                0.0
            } else if self.duration <= 0.0 {
                1.0
            } else {
                local / self.duration
            };
            self.easing.apply(t)
        }))
    }
}

/// Immutable per-frame snapshot handed to draw functions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    pub time: f32,
    pub frame: u64,
    pub uniforms: ShaderUniformSet,
}

impl FrameContext {
    /// Snapshot `uniforms` with the clock's time written in.
    pub fn new(clock: &FrameClock, mut uniforms: ShaderUniformSet) -> Self {
        uniforms.time = clock.time;
        Self {
            time: clock.time,
            frame: clock.frame,
            uniforms,
        }
    }
}
