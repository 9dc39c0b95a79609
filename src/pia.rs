use crate::cvsd::Cvsd;
use log::debug;
use std::fmt;

// Control register bits
/// Cx1 active transition raises IRQ
pub const CX1_IRQ_ENABLE: u8 = 0b0000_0001;
/// Cx1 active transition is low-to-high when set
pub const CX1_RISING: u8 = 0b0000_0010;
/// Register 0/2 selects the data register when set, the direction register when clear
pub const DATA_SELECT: u8 = 0b0000_0100;
/// Cx2 output level when Cx2 is in set/reset mode
pub const CX2_LEVEL: u8 = 0b0000_1000;
pub const CX2_MODE_1: u8 = 0b0001_0000;
pub const CX2_OUTPUT: u8 = 0b0010_0000;
/// Read-only interrupt flags
pub const IRQ2_FLAG: u8 = 0b0100_0000;
pub const IRQ1_FLAG: u8 = 0b1000_0000;

const CX2_SET_RESET: u8 = CX2_MODE_1 | CX2_OUTPUT;
const WRITABLE: u8 = 0b0011_1111;

/// One of the two PIA ports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    A,
    B,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PortState {
    output: u8,
    direction: u8,
    control: u8,
    input: u8,
    irq: bool,
    c1: bool,
    c2: bool,
}

impl PortState {
    fn read_data(&mut self) -> u8 {
        if self.control & DATA_SELECT == 0 {
            return self.direction;
        }
        self.control &= !(IRQ1_FLAG | IRQ2_FLAG);
        self.irq = false;
        self.pins()
    }

    fn peek_data(&self) -> u8 {
        if self.control & DATA_SELECT == 0 {
            self.direction
        } else {
            self.pins()
        }
    }

    fn write_data(&mut self, value: u8) {
        if self.control & DATA_SELECT == 0 {
            self.direction = value;
        } else {
            self.output = value;
        }
    }

    /// Stores the control register. Returns true on a rising Cx2 edge.
    fn write_control(&mut self, value: u8) -> bool {
        self.control = (self.control & !WRITABLE) | (value & WRITABLE);
        if self.control & CX2_SET_RESET != CX2_SET_RESET {
            return false;
        }
        let level = self.control & CX2_LEVEL != 0;
        let rising = level && !self.c2;
        self.c2 = level;
        rising
    }

    /// Driven outputs merged with externally driven inputs
    fn pins(&self) -> u8 {
        (self.output & self.direction) | (self.input & !self.direction)
    }
}

/// Motorola 6821 peripheral interface adapter.
///
/// Register 0 is port A data/direction, 1 is CRA, 2 is port B data/direction, 3 is CRB.
/// Rising edges on CB2 shift the current CA2 level into the CVSD decoder.
#[derive(Debug, Clone, Default)]
pub struct Pia {
    a: PortState,
    b: PortState,
    cvsd: Cvsd,
}

impl Pia {
    /// A PIA after reset: every register zero, all pins inputs
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a register as the CPU does, with side effects
    pub fn read(&mut self, reg: u8) -> u8 {
        match reg & 0x03 {
            0 => self.a.read_data(),
            1 => self.a.control,
            2 => self.b.read_data(),
            _ => self.b.control,
        }
    }

    /// Read a register without clearing interrupt flags
    pub fn peek(&self, reg: u8) -> u8 {
        match reg & 0x03 {
            0 => self.a.peek_data(),
            1 => self.a.control,
            2 => self.b.peek_data(),
            _ => self.b.control,
        }
    }

    /// Write a register as the CPU does
    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x03 {
            0 => self.a.write_data(value),
            1 => {
                self.a.write_control(value);
            }
            2 => self.b.write_data(value),
            _ => {
                if self.b.write_control(value) {
                    debug!("CB2 rising edge, CA2 = {}", self.a.c2);
                    self.cvsd.add_bit(self.a.c2);
                }
            }
        }
    }

    /// Latch a value on a port's input pins and assert its interrupt
    pub fn drive(&mut self, port: Port, value: u8) {
        let state = self.port_mut(port);
        state.input = value;
        state.irq = true;
    }

    /// Change the level of the Cx1 input line
    pub fn set_control_line_1(&mut self, port: Port, level: bool) {
        let state = self.port_mut(port);
        let rising_active = state.control & CX1_RISING != 0;
        let active = if rising_active {
            level && !state.c1
        } else {
            !level && state.c1
        };
        state.c1 = level;
        if active {
            state.control |= IRQ1_FLAG;
            if state.control & CX1_IRQ_ENABLE != 0 {
                state.irq = true;
            }
        }
    }

    /// Interrupt latch of a port
    pub fn irq(&self, port: Port) -> bool {
        self.port(port).irq
    }

    /// What the CPU drives on a port's output pins
    pub fn output(&self, port: Port) -> u8 {
        let state = self.port(port);
        state.output & state.direction
    }

    /// Last level seen on a port's Cx1 input
    pub fn control_line_1(&self, port: Port) -> bool {
        self.port(port).c1
    }

    /// Level a port drives on Cx2 when it is an output
    pub fn control_line_2(&self, port: Port) -> bool {
        self.port(port).c2
    }

    /// The speech decoder clocked by CB2
    pub fn cvsd(&self) -> &Cvsd {
        &self.cvsd
    }

    /// Mutable access to the speech decoder
    pub fn cvsd_mut(&mut self) -> &mut Cvsd {
        &mut self.cvsd
    }

    /// Clear both ports and the speech decoder
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn port(&self, port: Port) -> &PortState {
        match port {
            Port::A => &self.a,
            Port::B => &self.b,
        }
    }

    fn port_mut(&mut self, port: Port) -> &mut PortState {
        match port {
            Port::A => &mut self.a,
            Port::B => &mut self.b,
        }
    }
}

impl fmt::Display for Pia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ORA/ORB: {:02X}/{:02X} ; DDRA/DDRB: {:02X}/{:02X} ; CRA/CRB: 0x{:08b}/0x{:08b} ; \
             IRQA/IRQB: {}/{} ; CA1/CA2/CB1/CB2: {}/{}/{}/{}",
            self.a.output,
            self.b.output,
            self.a.direction,
            self.b.direction,
            self.a.control,
            self.b.control,
            self.a.irq,
            self.b.irq,
            self.a.c1,
            self.a.c2,
            self.b.c1,
            self.b.c2
        )
    }
}
