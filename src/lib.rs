//! Emulation of a Williams pinball sound board: a 6800-family CPU, a 6821 PIA driving an
//! 8-bit DAC and an HC55516 CVSD speech decoder, clocked against an audio sample rate.

#[cfg(feature = "audio")]
pub mod audio;
pub mod board;
pub mod bus;
pub mod clock;
pub mod config;
pub mod cpu;
pub mod cvsd;
pub mod diagnostics;
pub mod disasm;
pub mod error;
pub mod map;
pub mod opcode;
pub mod pia;

pub use board::Board;
pub use bus::Bus;
pub use clock::{Keypad, SampleClock};
pub use config::{Config, RamInit};
pub use cpu::{Cpu, Flags, Registers};
pub use error::{BusFault, ConfigError, CpuError, Fault, MountError};
pub use map::MemoryMap;
pub use opcode::Variant;
