//! Per-side time banks.
//!
//! Both clocks hold whole seconds in `0..=MAX_SECONDS`. Seconds double as the
//! currency for power cards, so adds and subtracts happen outside of ticking.

use crate::board::types::Color;

pub const MAX_SECONDS: u32 = 100;
pub const FINAL_STRETCH_SECONDS: u32 = 30;

/// What a clock mutation changed beyond the number itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockUpdate {
    /// The side's clock entered the final stretch for the first time.
    pub entered_final_stretch: bool,
    /// The side ran out of time on this tick.
    pub expired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    remaining: [u32; 2],
    final_stretch: [bool; 2],
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(MAX_SECONDS)
    }
}

impl Clock {
    pub fn new(start_seconds: u32) -> Self {
        let start = start_seconds.min(MAX_SECONDS);
        let mut clock = Self {
            remaining: [start; 2],
            final_stretch: [false; 2],
        };
        for color in Color::ALL {
            clock.latch_final_stretch(color);
        }
        clock
    }

    #[inline]
    pub fn remaining(&self, color: Color) -> u32 {
        self.remaining[color.index()]
    }

    /// Whether `color` has reached the final stretch at any point this game.
    #[inline]
    pub fn in_final_stretch(&self, color: Color) -> bool {
        self.final_stretch[color.index()]
    }

    pub fn add(&mut self, color: Color, seconds: u32) {
        let slot = &mut self.remaining[color.index()];
        *slot = slot.saturating_add(seconds).min(MAX_SECONDS);
    }

    pub fn subtract(&mut self, color: Color, seconds: u32) -> ClockUpdate {
        let slot = &mut self.remaining[color.index()];
        *slot = slot.saturating_sub(seconds);
        ClockUpdate {
            entered_final_stretch: self.latch_final_stretch(color),
            expired: false,
        }
    }

    /// One second of real time for the side to move. A side with one second
    /// or less left flags.
    pub fn tick(&mut self, color: Color) -> ClockUpdate {
        let slot = &mut self.remaining[color.index()];
        let expired = *slot <= 1;
        *slot = slot.saturating_sub(1);
        ClockUpdate {
            entered_final_stretch: self.latch_final_stretch(color),
            expired,
        }
    }

    fn latch_final_stretch(&mut self, color: Color) -> bool {
        let idx = color.index();
        if !self.final_stretch[idx] && self.remaining[idx] <= FINAL_STRETCH_SECONDS {
            self.final_stretch[idx] = true;
            return true;
        }
        false
    }
}
