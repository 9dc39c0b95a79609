use std::fmt;

const FILTER_MIN: f32 = -0.08;
const FILTER_MAX: f32 = 0.08;
const FILTER_LEAK: f32 = 0.3;
const LEAK: f32 = 0.1;

/// HC55516-style continuously variable slope delta decoder.
///
/// Each bit nudges a slope filter, the filter is integrated into `state`, and `state` is the
/// audio level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cvsd {
    shift: u8,
    filter: f32,
    state: f32,
}

impl Cvsd {
    /// A decoder at rest: empty history, zero filter and zero output
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one bit of the encoded stream
    pub fn add_bit(&mut self, bit: bool) {
        self.shift = ((self.shift << 1) | bit as u8) & 0x07;

        match self.shift {
            0b111 => self.filter += (FILTER_MAX - self.filter) / 2.0,
            0b000 => self.filter += (FILTER_MIN - self.filter) / 2.0,
            _ => {}
        }

        self.state += self.filter;
        self.filter *= FILTER_LEAK;

        self.state = self.state.clamp(-1.0, 1.0);
        self.state -= self.state * LEAK;
    }

    /// Current output level in [-1, 1]
    pub fn state(&self) -> f32 {
        self.state
    }

    /// Current slope of the syllabic filter
    pub fn filter(&self) -> f32 {
        self.filter
    }

    /// The last three bits fed, newest in bit 0
    pub fn history(&self) -> u8 {
        self.shift
    }

    /// Return to the power-on state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for Cvsd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CVSD: {:03b} ; filter {:+.5} ; state {:+.5}",
            self.shift, self.filter, self.state
        )
    }
}
