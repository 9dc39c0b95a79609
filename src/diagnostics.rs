use crate::bus::Bus;
use crate::cpu::Registers;
use crate::disasm::Listing;
use crate::error::CpuError;
use crate::opcode::Variant;
use std::collections::VecDeque;
use std::fmt::Write;

/// Recent CPU history for fault reports
#[derive(Debug, Clone)]
pub struct Diagnostics {
    lookback: VecDeque<Registers>,
    capacity: usize,
}

impl Diagnostics {
    /// Keep the last `capacity` register snapshots. Zero disables the lookback.
    pub fn new(capacity: usize) -> Self {
        Self {
            lookback: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Remember the registers at the start of an instruction, dropping the oldest entry
    pub fn record(&mut self, registers: Registers) {
        if self.capacity == 0 {
            return;
        }
        if self.lookback.len() == self.capacity {
            self.lookback.pop_front();
        }
        self.lookback.push_back(registers);
    }

    /// Oldest first
    pub fn lookback(&self) -> impl Iterator<Item = &Registers> {
        self.lookback.iter()
    }

    /// Forget the recorded history
    pub fn clear(&mut self) {
        self.lookback.clear();
    }

    /// Multi-line report of a fault: the error, the recent instructions, and device state
    pub fn report(&self, err: &CpuError, bus: &Bus, variant: Variant) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "fault: {}", err);
        let _ = writeln!(out, "lookback:");
        for registers in &self.lookback {
            let listing = match Listing::at(bus, registers.pc, variant) {
                Ok(listing) => listing.to_string(),
                Err(fault) => format!("0x{:04X}    <{}>", registers.pc, fault),
            };
            let _ = writeln!(out, "  {}    {}", registers, listing);
        }
        let _ = writeln!(out, "PIA: {}", bus.pia());
        let _ = write!(out, "{}", bus.pia().cvsd());
        out
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Flags;
    use crate::error::Fault;

    fn registers(pc: u16) -> Registers {
        Registers {
            pc,
            x: 0,
            a: 0,
            b: 0,
            sp: 0x7F,
            cc: Flags::HIGH,
        }
    }

    #[test]
    fn test_lookback_is_bounded() {
        let mut diagnostics = Diagnostics::new(3);
        for pc in 0..5 {
            diagnostics.record(registers(pc));
        }
        let pcs: Vec<u16> = diagnostics.lookback().map(|r| r.pc).collect();
        assert_eq!(pcs, vec![2, 3, 4]);
        diagnostics.clear();
        assert_eq!(diagnostics.lookback().count(), 0);
    }

    #[test]
    fn test_zero_capacity_records_nothing() {
        let mut diagnostics = Diagnostics::new(0);
        diagnostics.record(registers(1));
        assert_eq!(diagnostics.lookback().count(), 0);
    }

    #[test]
    fn test_report_lists_history() {
        let mut bus = Bus::new();
        bus.mount_ram(0x0000, 0x100).unwrap();
        bus.load(0x0010, &[0x86, 0x05, 0x00]).unwrap();

        let mut diagnostics = Diagnostics::new(4);
        diagnostics.record(registers(0x0010));
        diagnostics.record(registers(0x0012));
        diagnostics.record(registers(0x0200));

        let err = CpuError {
            fault: Fault::IllegalOpcode(0x00),
            registers: registers(0x0012),
        };
        let report = diagnostics.report(&err, &bus, Variant::M6800);
        let lines: Vec<&str> = report.lines().collect();
        assert!(lines[0].starts_with("fault: illegal opcode 0x00"));
        assert_eq!(lines[1], "lookback:");
        assert!(lines[2].ends_with("0x0010    lda   #$05"));
        assert!(lines[3].ends_with("0x0012    --  ill"));
        assert!(lines[4].ends_with("<unmapped read at $0200>"));
        assert!(lines[5].starts_with("PIA: ORA/ORB"));
        assert!(lines[6].starts_with("CVSD:"));
    }
}
