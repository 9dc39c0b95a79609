use crate::cpu::Registers;
use std::fmt;
use thiserror::Error;

/// Direction of a bus access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
        }
    }
}

/// Access to an address the bus cannot service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusFault {
    #[error("unmapped {access} at ${addr:04X}")]
    Unmapped { addr: u16, access: Access },

    #[error("write of 0x{value:02X} to read-only ${addr:04X}")]
    ReadOnly { addr: u16, value: u8 },
}

/// Rejected region layout, reported before anything executes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    #[error(
        "region ${base:04X}+{size:#X} overlaps region ${existing_base:04X}+{existing_size:#X}"
    )]
    Overlap {
        base: u16,
        size: usize,
        existing_base: u16,
        existing_size: usize,
    },

    #[error("region ${base:04X}+{size:#X} runs past $FFFF")]
    OutOfRange { base: u16, size: usize },

    #[error("empty region at ${base:04X}")]
    Empty { base: u16 },

    #[error("ROM {slot} is {actual} bytes, expected {expected}")]
    RomSize {
        slot: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("no image supplied for ROM {slot}")]
    MissingImage { slot: &'static str },
}

/// Settings that cannot drive a sample clock
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("sample rate must be non-zero")]
    ZeroSampleRate,

    #[error("CPU clock of {0} Hz is not a positive finite frequency")]
    CpuClock(f64),
}

/// What went wrong inside an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    #[error(transparent)]
    Bus(#[from] BusFault),

    #[error("illegal opcode 0x{0:02X}")]
    IllegalOpcode(u8),

    #[error("unimplemented opcode 0x{0:02X}")]
    UnimplementedOpcode(u8),
}

/// A fatal CPU condition together with the register state at the start of the failing
/// instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{fault} [{registers}]")]
pub struct CpuError {
    pub fault: Fault,
    pub registers: Registers,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Flags;

    #[test]
    fn test_bus_fault_messages() {
        let read = BusFault::Unmapped {
            addr: 0x2000,
            access: Access::Read,
        };
        assert_eq!(read.to_string(), "unmapped read at $2000");

        let write = BusFault::ReadOnly {
            addr: 0xF800,
            value: 0x12,
        };
        assert_eq!(write.to_string(), "write of 0x12 to read-only $F800");
    }

    #[test]
    fn test_cpu_error_includes_registers() {
        let err = CpuError {
            fault: Fault::IllegalOpcode(0x02),
            registers: Registers {
                pc: 0xF800,
                x: 0x1234,
                a: 0x05,
                b: 0x06,
                sp: 0x007F,
                cc: Flags::from_bits_retain(0xD0),
            },
        };
        let text = err.to_string();
        assert!(text.starts_with("illegal opcode 0x02"));
        assert!(text.contains("PC: $F800"));
        assert!(text.contains("CC:0x11010000"));
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::ZeroSampleRate.to_string(),
            "sample rate must be non-zero"
        );
        assert_eq!(
            ConfigError::CpuClock(-1.0).to_string(),
            "CPU clock of -1 Hz is not a positive finite frequency"
        );
    }

    #[test]
    fn test_bus_fault_converts_into_fault() {
        let fault: Fault = BusFault::Unmapped {
            addr: 0x8000,
            access: Access::Write,
        }
        .into();
        assert_eq!(fault.to_string(), "unmapped write at $8000");
    }
}
