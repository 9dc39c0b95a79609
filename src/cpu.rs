use crate::bus::Bus;
use crate::error::{BusFault, CpuError, Fault};
use crate::opcode::*;
use bitflags::bitflags;
use std::fmt;

// Interrupt vector addresses, big-endian words
pub const IRQ_VECTOR: u16 = 0xFFF8;
pub const SWI_VECTOR: u16 = 0xFFFA;
pub const NMI_VECTOR: u16 = 0xFFFC;
pub const RESET_VECTOR: u16 = 0xFFFE;

/// Cost of pushing the frame and fetching a vector for IRQ and NMI
pub const INTERRUPT_CYCLES: u8 = 12;
/// Cost of leaving WAI, the frame is already on the stack
pub const WAKE_CYCLES: u8 = 4;
/// Cycles accounted per step while parked in WAI
pub const WAIT_CYCLES: u8 = 1;

bitflags! {
    /// Condition code register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        const CARRY = 0b0000_0001;
        const OVERFLOW = 0b0000_0010;
        const ZERO = 0b0000_0100;
        const NEGATIVE = 0b0000_1000;
        const INTERRUPT = 0b0001_0000;
        const HALF_CARRY = 0b0010_0000;
        /// Bits 6 and 7 are tied high
        const HIGH = 0b1100_0000;
    }
}

/// Copy of the programmer-visible registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub pc: u16,
    pub x: u16,
    pub a: u8,
    pub b: u8,
    pub sp: u16,
    pub cc: Flags,
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PC: ${:04X} ; X:${:04X} ; A:0x{:02X} ; B:0x{:02X} ; CC:0x{:08b} ; SP:${:04X}",
            self.pc,
            self.x,
            self.a,
            self.b,
            self.cc.bits(),
            self.sp
        )
    }
}

/// Motorola 6800/6802 CPU
pub struct Cpu {
    /// Accumulator A
    pub a: u8,
    /// Accumulator B
    pub b: u8,
    /// Index register
    pub x: u16,
    /// Stack pointer, points at the next free byte
    pub sp: u16,
    /// Program counter
    pub pc: u16,
    /// Condition codes
    /// Bit 7-6: always 1
    /// Bit 5: H (half carry)
    /// Bit 4: I (interrupt mask)
    /// Bit 3: N (negative)
    /// Bit 2: Z (zero)
    /// Bit 1: V (overflow)
    /// Bit 0: C (carry)
    pub cc: Flags,
    /// Opcode set used to decide which bytes are illegal
    pub variant: Variant,
    /// Total cycles executed since reset
    pub total_cycles: u64,
    nmi_pending: bool,
    waiting: bool,
}

impl Cpu {
    /// Create a CPU with cleared registers and interrupts masked
    pub fn new(variant: Variant) -> Self {
        Self {
            a: 0,
            b: 0,
            x: 0,
            sp: 0,
            pc: 0,
            cc: Flags::HIGH | Flags::INTERRUPT,
            variant,
            total_cycles: 0,
            nmi_pending: false,
            waiting: false,
        }
    }

    /// Mask interrupts and load PC from the reset vector
    pub fn reset(&mut self, bus: &mut Bus) -> Result<(), CpuError> {
        self.cc = Flags::HIGH | Flags::INTERRUPT;
        self.nmi_pending = false;
        self.waiting = false;
        self.total_cycles = 0;
        let registers = self.registers();
        self.pc = bus.read_word(RESET_VECTOR).map_err(|fault| CpuError {
            fault: fault.into(),
            registers,
        })?;
        Ok(())
    }

    /// Snapshot of the programmer-visible registers
    pub fn registers(&self) -> Registers {
        Registers {
            pc: self.pc,
            x: self.x,
            a: self.a,
            b: self.b,
            sp: self.sp,
            cc: self.cc,
        }
    }

    /// Replace the condition codes; bits 6 and 7 stay set
    pub fn set_cc(&mut self, value: u8) {
        self.cc = Flags::from_bits_retain(value) | Flags::HIGH;
    }

    /// Latch a non-maskable interrupt, taken before the next instruction
    pub fn raise_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// True while parked in WAI
    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Execute one instruction, or enter a pending interrupt, and return the cycles consumed
    pub fn step(&mut self, bus: &mut Bus) -> Result<u8, CpuError> {
        let registers = self.registers();
        match self.run_opcode(bus) {
            Ok(cycles) => {
                self.total_cycles += cycles as u64;
                Ok(cycles)
            }
            Err(fault) => Err(CpuError { fault, registers }),
        }
    }

    fn run_opcode(&mut self, bus: &mut Bus) -> Result<u8, Fault> {
        if self.nmi_pending {
            self.nmi_pending = false;
            return Ok(self.interrupt(bus, NMI_VECTOR)?);
        }
        if !self.cc.contains(Flags::INTERRUPT) && bus.irq_asserted() {
            return Ok(self.interrupt(bus, IRQ_VECTOR)?);
        }
        if self.waiting {
            return Ok(WAIT_CYCLES);
        }

        let code = self.fetch_byte(bus)?;
        let op = describe(code);
        if !op.is_valid_for(self.variant) {
            return Err(Fault::IllegalOpcode(code));
        }
        if !op.is_valid_for(Variant::M6800) {
            return Err(Fault::UnimplementedOpcode(code));
        }

        match code {
            NOP => {}
            TAP => self.set_cc(self.a),
            TPA => self.a = self.cc.bits(),
            INX => {
                self.x = self.x.wrapping_add(1);
                self.cc.set(Flags::ZERO, self.x == 0);
            }
            DEX => {
                self.x = self.x.wrapping_sub(1);
                self.cc.set(Flags::ZERO, self.x == 0);
            }
            CLV => self.cc.remove(Flags::OVERFLOW),
            SEV => self.cc.insert(Flags::OVERFLOW),
            CLC => self.cc.remove(Flags::CARRY),
            SEC => self.cc.insert(Flags::CARRY),
            CLI => self.cc.remove(Flags::INTERRUPT),
            SEI => self.cc.insert(Flags::INTERRUPT),
            SBA => self.a = self.sub(self.a, self.b, false),
            CBA => {
                self.sub(self.a, self.b, false);
            }
            TAB => {
                self.b = self.a;
                self.update_nz_clear_v(self.b);
            }
            TBA => {
                self.a = self.b;
                self.update_nz_clear_v(self.a);
            }
            DAA => self.daa(),
            ABA => self.a = self.add(self.a, self.b, false),
            BRA..=BLE => {
                let offset = self.fetch_byte(bus)? as i8;
                if self.branch_taken(code) {
                    self.branch(offset);
                }
            }
            TSX => self.x = self.sp.wrapping_add(1),
            INS => self.sp = self.sp.wrapping_add(1),
            PULA => self.a = self.pull_byte(bus)?,
            PULB => self.b = self.pull_byte(bus)?,
            DES => self.sp = self.sp.wrapping_sub(1),
            TXS => self.sp = self.x.wrapping_sub(1),
            PSHA => self.push_byte(bus, self.a)?,
            PSHB => self.push_byte(bus, self.b)?,
            RTS => self.pc = self.pull_word(bus)?,
            RTI => self.return_from_interrupt(bus)?,
            WAI => {
                self.push_frame(bus)?;
                self.waiting = true;
            }
            SWI => {
                self.push_frame(bus)?;
                self.cc.insert(Flags::INTERRUPT);
                self.pc = bus.read_word(SWI_VECTOR)?;
            }
            0x40..=0x7F => self.unary(bus, code, op.mode)?,
            BSR => {
                let offset = self.fetch_byte(bus)? as i8;
                self.push_word(bus, self.pc)?;
                self.branch(offset);
            }
            JSR_IDX | JSR_EXT => {
                let target = self.effective_address(bus, op.mode)?;
                self.push_word(bus, self.pc)?;
                self.pc = target;
            }
            0x80..=0xFF => self.accumulator_op(bus, code, op.mode)?,
            _ => return Err(Fault::UnimplementedOpcode(code)),
        }

        Ok(op.cycles)
    }

    /// Enter an interrupt through `vector`
    fn interrupt(&mut self, bus: &mut Bus, vector: u16) -> Result<u8, BusFault> {
        let cycles = if self.waiting {
            self.waiting = false;
            WAKE_CYCLES
        } else {
            self.push_frame(bus)?;
            INTERRUPT_CYCLES
        };
        self.cc.insert(Flags::INTERRUPT);
        self.pc = bus.read_word(vector)?;
        Ok(cycles)
    }

    /// Save the machine state. From SP-6 up to SP the stack then holds CC, B, A, Xh, Xl, Ph, Pl.
    fn push_frame(&mut self, bus: &mut Bus) -> Result<(), BusFault> {
        self.push_word(bus, self.pc)?;
        self.push_word(bus, self.x)?;
        self.push_byte(bus, self.a)?;
        self.push_byte(bus, self.b)?;
        self.push_byte(bus, self.cc.bits())
    }

    fn return_from_interrupt(&mut self, bus: &mut Bus) -> Result<(), BusFault> {
        let cc = self.pull_byte(bus)?;
        self.set_cc(cc);
        self.b = self.pull_byte(bus)?;
        self.a = self.pull_byte(bus)?;
        self.x = self.pull_word(bus)?;
        self.pc = self.pull_word(bus)?;
        Ok(())
    }

    /// NEG through CLR plus JMP, on A (0x4x), B (0x5x) or memory (0x6x indexed, 0x7x extended)
    fn unary(&mut self, bus: &mut Bus, code: u8, mode: AddressingMode) -> Result<(), Fault> {
        let kind = code & 0x0F;
        match code & 0xF0 {
            0x40 => self.a = self.modify(kind, self.a),
            0x50 => self.b = self.modify(kind, self.b),
            _ => {
                let addr = self.effective_address(bus, mode)?;
                match kind {
                    // JMP
                    0x0E => self.pc = addr,
                    // TST
                    0x0D => {
                        let value = bus.read_byte(addr)?;
                        self.modify(kind, value);
                    }
                    _ => {
                        let value = bus.read_byte(addr)?;
                        let result = self.modify(kind, value);
                        bus.write_byte(addr, result)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn modify(&mut self, kind: u8, value: u8) -> u8 {
        match kind {
            0x00 => self.neg(value),
            0x03 => self.com(value),
            0x04 => self.lsr(value),
            0x06 => self.ror(value),
            0x07 => self.asr(value),
            0x08 => self.asl(value),
            0x09 => self.rol(value),
            0x0A => self.dec(value),
            0x0C => self.inc(value),
            0x0D => {
                self.update_nz_clear_v(value);
                self.cc.remove(Flags::CARRY);
                value
            }
            0x0F => {
                self.cc.remove(Flags::NEGATIVE | Flags::OVERFLOW | Flags::CARRY);
                self.cc.insert(Flags::ZERO);
                0
            }
            _ => value,
        }
    }

    /// Two-operand instructions of rows 0x80-0xFF. Bit 6 of the opcode selects B over A.
    fn accumulator_op(
        &mut self,
        bus: &mut Bus,
        code: u8,
        mode: AddressingMode,
    ) -> Result<(), Fault> {
        let use_b = code & 0x40 != 0;
        let acc = if use_b { self.b } else { self.a };

        match code & 0x0F {
            0x00 => {
                let m = self.operand8(bus, mode)?;
                let r = self.sub(acc, m, false);
                self.set_accumulator(use_b, r);
            }
            0x01 => {
                let m = self.operand8(bus, mode)?;
                self.sub(acc, m, false);
            }
            0x02 => {
                let m = self.operand8(bus, mode)?;
                let r = self.sub(acc, m, true);
                self.set_accumulator(use_b, r);
            }
            0x04 => {
                let r = acc & self.operand8(bus, mode)?;
                self.update_nz_clear_v(r);
                self.set_accumulator(use_b, r);
            }
            0x05 => {
                let r = acc & self.operand8(bus, mode)?;
                self.update_nz_clear_v(r);
            }
            0x06 => {
                let r = self.operand8(bus, mode)?;
                self.update_nz_clear_v(r);
                self.set_accumulator(use_b, r);
            }
            0x07 => {
                let addr = self.effective_address(bus, mode)?;
                bus.write_byte(addr, acc)?;
                self.update_nz_clear_v(acc);
            }
            0x08 => {
                let r = acc ^ self.operand8(bus, mode)?;
                self.update_nz_clear_v(r);
                self.set_accumulator(use_b, r);
            }
            0x09 => {
                let m = self.operand8(bus, mode)?;
                let r = self.add(acc, m, true);
                self.set_accumulator(use_b, r);
            }
            0x0A => {
                let r = acc | self.operand8(bus, mode)?;
                self.update_nz_clear_v(r);
                self.set_accumulator(use_b, r);
            }
            0x0B => {
                let m = self.operand8(bus, mode)?;
                let r = self.add(acc, m, false);
                self.set_accumulator(use_b, r);
            }
            // CPX, only in the A rows
            0x0C if !use_b => {
                let m = self.operand16(bus, mode)?;
                self.cpx(m);
            }
            // LDS / LDX
            0x0E => {
                let value = self.operand16(bus, mode)?;
                if use_b {
                    self.x = value;
                } else {
                    self.sp = value;
                }
                self.update_nz16_clear_v(value);
            }
            // STS / STX
            0x0F => {
                let addr = self.effective_address(bus, mode)?;
                let value = if use_b { self.x } else { self.sp };
                bus.write_word(addr, value)?;
                self.update_nz16_clear_v(value);
            }
            _ => return Err(Fault::UnimplementedOpcode(code)),
        }
        Ok(())
    }

    fn set_accumulator(&mut self, use_b: bool, value: u8) {
        if use_b {
            self.b = value;
        } else {
            self.a = value;
        }
    }

    /// Resolve the operand address, consuming operand bytes. Immediate operands resolve to
    /// their own location after the opcode.
    fn effective_address(&mut self, bus: &mut Bus, mode: AddressingMode) -> Result<u16, BusFault> {
        match mode {
            AddressingMode::Direct => Ok(self.fetch_byte(bus)? as u16),
            AddressingMode::Extended => self.fetch_word(bus),
            AddressingMode::Indexed => {
                let offset = self.fetch_byte(bus)?;
                Ok(self.x.wrapping_add(offset as u16))
            }
            _ => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(mode.operand_len());
                Ok(addr)
            }
        }
    }

    fn operand8(&mut self, bus: &mut Bus, mode: AddressingMode) -> Result<u8, BusFault> {
        let addr = self.effective_address(bus, mode)?;
        bus.read_byte(addr)
    }

    fn operand16(&mut self, bus: &mut Bus, mode: AddressingMode) -> Result<u16, BusFault> {
        let addr = self.effective_address(bus, mode)?;
        bus.read_word(addr)
    }

    fn fetch_byte(&mut self, bus: &mut Bus) -> Result<u8, BusFault> {
        let value = bus.read_byte(self.pc)?;
        self.pc = self.pc.wrapping_add(1);
        Ok(value)
    }

    fn fetch_word(&mut self, bus: &mut Bus) -> Result<u16, BusFault> {
        let value = bus.read_word(self.pc)?;
        self.pc = self.pc.wrapping_add(2);
        Ok(value)
    }

    fn push_byte(&mut self, bus: &mut Bus, value: u8) -> Result<(), BusFault> {
        bus.write_byte(self.sp, value)?;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    /// Low byte first, leaving the word big-endian in memory
    fn push_word(&mut self, bus: &mut Bus, value: u16) -> Result<(), BusFault> {
        let [hi, lo] = value.to_be_bytes();
        self.push_byte(bus, lo)?;
        self.push_byte(bus, hi)
    }

    fn pull_byte(&mut self, bus: &mut Bus) -> Result<u8, BusFault> {
        self.sp = self.sp.wrapping_add(1);
        bus.read_byte(self.sp)
    }

    fn pull_word(&mut self, bus: &mut Bus) -> Result<u16, BusFault> {
        let hi = self.pull_byte(bus)?;
        let lo = self.pull_byte(bus)?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    fn branch_taken(&self, code: u8) -> bool {
        let c = self.cc.contains(Flags::CARRY);
        let z = self.cc.contains(Flags::ZERO);
        let n = self.cc.contains(Flags::NEGATIVE);
        let v = self.cc.contains(Flags::OVERFLOW);
        match code {
            BRA => true,
            BHI => !c && !z,
            BLS => c || z,
            BCC => !c,
            BCS => c,
            BNE => !z,
            BEQ => z,
            BVC => !v,
            BVS => v,
            BPL => !n,
            BMI => n,
            BGE => n == v,
            BLT => n != v,
            BGT => !z && n == v,
            BLE => z || n != v,
            _ => false,
        }
    }

    /// Apply a signed displacement to PC, which already points past the offset byte
    fn branch(&mut self, offset: i8) {
        let displacement = i16::from(offset);
        self.pc = self.pc.wrapping_add_signed(displacement);
    }

    fn update_nz(&mut self, value: u8) {
        self.cc.set(Flags::ZERO, value == 0);
        self.cc.set(Flags::NEGATIVE, value & 0x80 != 0);
    }

    fn update_nz_clear_v(&mut self, value: u8) {
        self.update_nz(value);
        self.cc.remove(Flags::OVERFLOW);
    }

    fn update_nz16_clear_v(&mut self, value: u16) {
        self.cc.set(Flags::ZERO, value == 0);
        self.cc.set(Flags::NEGATIVE, value & 0x8000 != 0);
        self.cc.remove(Flags::OVERFLOW);
    }

    /// 8-bit addition for ADD, ADC and ABA. Sets H, N, Z, V and C.
    pub fn add(&mut self, augend: u8, addend: u8, with_carry: bool) -> u8 {
        let carry = (with_carry && self.cc.contains(Flags::CARRY)) as u8;
        let sum = augend as u16 + addend as u16 + carry as u16;
        let result = sum as u8;

        self.cc
            .set(Flags::HALF_CARRY, (augend & 0x0F) + (addend & 0x0F) + carry > 0x0F);
        self.cc.set(Flags::CARRY, sum > 0xFF);
        self.cc.set(
            Flags::OVERFLOW,
            !(augend ^ addend) & (augend ^ result) & 0x80 != 0,
        );
        self.update_nz(result);
        result
    }

    /// 8-bit subtraction for SUB, SBC, CMP, SBA and CBA. Sets N, Z, V and C (borrow).
    pub fn sub(&mut self, minuend: u8, subtrahend: u8, with_carry: bool) -> u8 {
        let borrow = (with_carry && self.cc.contains(Flags::CARRY)) as u8;
        let result = minuend.wrapping_sub(subtrahend).wrapping_sub(borrow);

        self.cc.set(
            Flags::CARRY,
            (minuend as u16) < subtrahend as u16 + borrow as u16,
        );
        self.cc.set(
            Flags::OVERFLOW,
            (minuend ^ subtrahend) & (minuend ^ result) & 0x80 != 0,
        );
        self.update_nz(result);
        result
    }

    fn cpx(&mut self, value: u16) {
        let result = self.x.wrapping_sub(value);
        self.cc.set(Flags::ZERO, result == 0);
        self.cc.set(Flags::NEGATIVE, result & 0x8000 != 0);
        self.cc.set(
            Flags::OVERFLOW,
            (self.x ^ value) & (self.x ^ result) & 0x8000 != 0,
        );
    }

    fn neg(&mut self, value: u8) -> u8 {
        let result = 0u8.wrapping_sub(value);
        self.cc.set(Flags::CARRY, result != 0);
        self.cc.set(Flags::OVERFLOW, result == 0x80);
        self.update_nz(result);
        result
    }

    fn com(&mut self, value: u8) -> u8 {
        let result = !value;
        self.update_nz_clear_v(result);
        self.cc.insert(Flags::CARRY);
        result
    }

    fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.cc.set(Flags::OVERFLOW, value == 0x7F);
        self.update_nz(result);
        result
    }

    fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.cc.set(Flags::OVERFLOW, value == 0x80);
        self.update_nz(result);
        result
    }

    /// Flags shared by the shift family: C from the bit shifted out, V = N xor C
    fn shifted(&mut self, result: u8, carry: bool) -> u8 {
        self.cc.set(Flags::CARRY, carry);
        self.update_nz(result);
        let n = self.cc.contains(Flags::NEGATIVE);
        self.cc.set(Flags::OVERFLOW, n != carry);
        result
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.shifted(value << 1, value & 0x80 != 0)
    }

    fn asr(&mut self, value: u8) -> u8 {
        self.shifted((value >> 1) | (value & 0x80), value & 0x01 != 0)
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.shifted(value >> 1, value & 0x01 != 0)
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = self.cc.contains(Flags::CARRY) as u8;
        self.shifted((value << 1) | carry_in, value & 0x80 != 0)
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = (self.cc.contains(Flags::CARRY) as u8) << 7;
        self.shifted((value >> 1) | carry_in, value & 0x01 != 0)
    }

    fn daa(&mut self) {
        let low = self.a & 0x0F;
        let high = self.a & 0xF0;
        let mut correction = 0u8;
        if self.cc.contains(Flags::HALF_CARRY) || low > 0x09 {
            correction |= 0x06;
        }
        if self.cc.contains(Flags::CARRY) || high > 0x90 || (high > 0x80 && low > 0x09) {
            correction |= 0x60;
        }
        self.a = self.a.wrapping_add(correction);
        if correction & 0x60 != 0 {
            self.cc.insert(Flags::CARRY);
        }
        self.update_nz_clear_v(self.a);
    }
}
