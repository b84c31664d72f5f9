//! Time-of-day transition curves.
//!
//! A schedule maps the current wall-clock time to the [`TargetState`] lights
//! should show. Times are minute-of-day in local time; seconds are ignored.
//!
//! Outside its window a transition always evaluates to its end state, so the
//! schedule rests on the end value overnight. A window whose start lies after
//! its end (crossing midnight) is treated as never active, and a zero-length
//! interpolation segment resolves straight to the end state.

use std::f64::consts::PI;

use chrono::NaiveTime;
use chrono::Timelike;

use super::target::TargetState;

pub fn minute_of_day(now: NaiveTime) -> u32 {
    60 * now.hour() + now.minute()
}

/// Straight-line interpolation from `start` to `end` across the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransition {
    pub start_minute: u32,
    pub end_minute: u32,
    pub start: TargetState,
    pub end: TargetState,
}

/// Holds `start` until `transition_minute`, then eases to `end` along a
/// raised-cosine S-curve with zero slope at both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothTransition {
    pub start_minute: u32,
    pub transition_minute: u32,
    pub end_minute: u32,
    pub start: TargetState,
    pub end: TargetState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionSpec {
    Linear(LinearTransition),
    Smooth(SmoothTransition),
}

/// The complete schedule the engine follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Schedule {
    /// One transition drives both channels.
    Uniform(TransitionSpec),
    /// Brightness and color temperature follow independent transitions.
    PerChannel {
        brightness: TransitionSpec,
        color_temp: TransitionSpec,
    },
}

fn in_window(cur: u32, start: u32, end: u32) -> bool {
    start <= end && start <= cur && cur <= end
}

fn progress(cur: u32, from: u32, to: u32) -> f64 {
    if to <= from {
        return 1.0;
    }
    let p = (f64::from(cur) - f64::from(from)) / (f64::from(to) - f64::from(from));
    p.clamp(0.0, 1.0)
}

fn lerp(start: f64, end: f64, p: f64) -> f64 {
    start + p * (end - start)
}

/// Raised-cosine ease: `start` at p=0, `end` at p=1, flat at both ends.
pub fn ease(start: f64, end: f64, p: f64) -> f64 {
    if p <= 0.0 {
        return start;
    }
    if p >= 1.0 {
        return end;
    }
    0.5 * (start - end) * (1.0 + (PI * p).cos()) + end
}

fn blend(start: Option<f64>, end: Option<f64>, curve: impl Fn(f64, f64) -> f64) -> Option<f64> {
    match (start, end) {
        (Some(s), Some(e)) => Some(curve(s, e)),
        (Some(s), None) => Some(s),
        (None, e) => e,
    }
}

fn interpolate(
    start: TargetState,
    end: TargetState,
    curve: impl Fn(f64, f64) -> f64,
) -> TargetState {
    let mirek = blend(
        start.color_temp_mirek.map(f64::from),
        end.color_temp_mirek.map(f64::from),
        &curve,
    );
    TargetState {
        brightness: blend(start.brightness, end.brightness, &curve),
        // truncated, not rounded
        color_temp_mirek: mirek.map(|m| m.trunc() as u16),
    }
}

impl LinearTransition {
    pub fn target_light_state(&self, now: NaiveTime) -> TargetState {
        let cur = minute_of_day(now);
        if !in_window(cur, self.start_minute, self.end_minute) {
            return self.end;
        }

        let p = progress(cur, self.start_minute, self.end_minute);
        interpolate(self.start, self.end, |s, e| lerp(s, e, p))
    }
}

impl SmoothTransition {
    pub fn target_light_state(&self, now: NaiveTime) -> TargetState {
        let cur = minute_of_day(now);
        if !in_window(cur, self.start_minute, self.end_minute) {
            return self.end;
        }
        if cur < self.transition_minute {
            return self.start;
        }

        let p = progress(cur, self.transition_minute, self.end_minute);
        interpolate(self.start, self.end, |s, e| ease(s, e, p))
    }
}

impl TransitionSpec {
    pub fn target_light_state(&self, now: NaiveTime) -> TargetState {
        match self {
            TransitionSpec::Linear(t) => t.target_light_state(now),
            TransitionSpec::Smooth(t) => t.target_light_state(now),
        }
    }
}

impl Schedule {
    pub fn target_light_state(&self, now: NaiveTime) -> TargetState {
        match self {
            Schedule::Uniform(spec) => spec.target_light_state(now),
            Schedule::PerChannel {
                brightness,
                color_temp,
            } => TargetState {
                brightness: brightness.target_light_state(now).brightness,
                color_temp_mirek: color_temp.target_light_state(now).color_temp_mirek,
            },
        }
    }
}
