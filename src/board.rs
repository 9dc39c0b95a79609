use crate::bus::Bus;
use crate::config::Config;
use crate::cpu::Cpu;
use crate::diagnostics::Diagnostics;
use crate::disasm::Listing;
use crate::error::CpuError;
use log::{Level, log_enabled, trace};

/// A sound board: the CPU, everything on its bus, and the history kept for fault reports
pub struct Board {
    cpu: Cpu,
    bus: Bus,
    diagnostics: Diagnostics,
}

impl Board {
    /// Take ownership of a populated bus and reset the CPU from it
    pub fn new(mut bus: Bus, config: &Config) -> Result<Self, CpuError> {
        let mut cpu = Cpu::new(config.variant);
        cpu.reset(&mut bus)?;
        Ok(Self {
            cpu,
            bus,
            diagnostics: Diagnostics::new(config.lookback),
        })
    }

    /// Run one instruction or interrupt entry
    pub fn step(&mut self) -> Result<u8, CpuError> {
        self.diagnostics.record(self.cpu.registers());
        if log_enabled!(Level::Trace) {
            if let Ok(listing) = Listing::at(&self.bus, self.cpu.pc, self.cpu.variant) {
                trace!("{}", listing);
            }
        }
        self.cpu.step(&mut self.bus)
    }

    /// Reset the PIA and the CPU. Memory is left as it is.
    pub fn reset(&mut self) -> Result<(), CpuError> {
        self.bus.pia_mut().reset();
        self.diagnostics.clear();
        self.cpu.reset(&mut self.bus)
    }

    /// Text report for a fault raised by `step`
    pub fn report(&self, err: &CpuError) -> String {
        self.diagnostics.report(err, &self.bus, self.cpu.variant)
    }

    /// The CPU
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Mutable CPU access, for setting registers from a debugger or a test
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// The bus and everything mounted on it
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Mutable bus access
    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Instruction history kept for fault reports
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}
