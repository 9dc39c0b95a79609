use crate::bus::Bus;
use crate::error::BusFault;
use crate::opcode::{AddressingMode, Variant, describe};
use std::fmt;

/// One decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub mode: AddressingMode,
    operands: [u8; 2],
    /// Instruction length in bytes, 1 for invalid opcodes
    pub length: u16,
    /// False when the opcode is not an instruction on the decoding variant
    pub is_valid: bool,
}

impl Decoded {
    /// Operand bytes following the opcode
    pub fn operand_bytes(&self) -> &[u8] {
        &self.operands[..self.length as usize - 1]
    }
}

/// Decode the instruction at `pc` without side effects
pub fn decode_one(bus: &Bus, pc: u16, variant: Variant) -> Result<Decoded, BusFault> {
    let opcode = bus.peek_byte(pc)?;
    let op = describe(opcode);
    let is_valid = op.is_valid_for(variant);

    let mut operands = [0u8; 2];
    let length = if is_valid { op.length() } else { 1 };
    for i in 1..length {
        operands[i as usize - 1] = bus.peek_byte(pc.wrapping_add(i))?;
    }

    Ok(Decoded {
        opcode,
        mnemonic: op.mnemonic,
        mode: op.mode,
        operands,
        length,
        is_valid,
    })
}

/// A decoded instruction at its address, printable as a listing line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listing {
    pub pc: u16,
    pub decoded: Decoded,
}

impl Listing {
    /// Decode the instruction at `pc` without side effects on the bus
    pub fn at(bus: &Bus, pc: u16, variant: Variant) -> Result<Self, BusFault> {
        Ok(Self {
            pc,
            decoded: decode_one(bus, pc, variant)?,
        })
    }

    /// Address of the following instruction
    pub fn next_pc(&self) -> u16 {
        self.pc.wrapping_add(self.decoded.length)
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.decoded;
        if !d.is_valid {
            return write!(f, "0x{:04X}    --  ill", self.pc);
        }
        let bytes = d.operand_bytes();
        let word = || u16::from_be_bytes([bytes[0], bytes[1]]);
        write!(f, "0x{:04X}    {:<5} ", self.pc, d.mnemonic)?;
        match d.mode {
            AddressingMode::Inherent | AddressingMode::StackByte => Ok(()),
            AddressingMode::Relative => {
                let target = self
                    .pc
                    .wrapping_add(2)
                    .wrapping_add_signed(i16::from(bytes[0] as i8));
                write!(f, "${:04X}", target)
            }
            AddressingMode::ByteImmediate => write!(f, "#${:02X}", bytes[0]),
            AddressingMode::WordImmediate => write!(f, "#${:04X}", word()),
            AddressingMode::Direct => write!(f, "${:02X}", bytes[0]),
            AddressingMode::Extended => write!(f, "${:04X}", word()),
            AddressingMode::Indexed => write!(f, "${:02X},x", bytes[0]),
            AddressingMode::ImmediateDirect => write!(f, "#${:02X},${:02X}", bytes[0], bytes[1]),
            AddressingMode::ImmediateIndexed => {
                write!(f, "#${:02X},${:02X},x", bytes[0], bytes[1])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus_with(program: &[u8]) -> Bus {
        let mut bus = Bus::new();
        bus.mount_ram(0x0000, 0x2000).unwrap();
        bus.load(0x1000, program).unwrap();
        bus
    }

    fn line(bus: &Bus, pc: u16) -> String {
        Listing::at(bus, pc, Variant::M6800).unwrap().to_string()
    }

    #[test]
    fn test_decode_lengths_and_operands() {
        let bus = bus_with(&[0xCE, 0x12, 0x34, 0x01, 0x86, 0x05]);
        let d = decode_one(&bus, 0x1000, Variant::M6800).unwrap();
        assert_eq!(d.mnemonic, "ldx");
        assert_eq!(d.mode, AddressingMode::WordImmediate);
        assert_eq!(d.operand_bytes(), &[0x12, 0x34]);
        assert_eq!(d.length, 3);

        let d = decode_one(&bus, 0x1003, Variant::M6800).unwrap();
        assert_eq!(d.mnemonic, "nop");
        assert!(d.operand_bytes().is_empty());

        let d = decode_one(&bus, 0x1004, Variant::M6800).unwrap();
        assert_eq!(d.operand_bytes(), &[0x05]);
    }

    #[test]
    fn test_invalid_opcode_is_one_byte() {
        let bus = bus_with(&[0x3D, 0x00]);
        let d = decode_one(&bus, 0x1000, Variant::M6800).unwrap();
        assert!(!d.is_valid);
        assert_eq!(d.length, 1);
        assert_eq!(line(&bus, 0x1000), "0x1000    --  ill");

        let d = decode_one(&bus, 0x1000, Variant::M6801).unwrap();
        assert!(d.is_valid);
        assert_eq!(d.mnemonic, "mul");
    }

    #[test]
    fn test_listing_formats() {
        let bus = bus_with(&[
            0x86, 0x05, // lda #$05
            0x97, 0x10, // sta $10
            0xB7, 0x04, 0x02, // sta $0402
            0xA6, 0x03, // lda $03,x
            0x20, 0xFE, // bra *
            0x8E, 0x00, 0x7F, // lds #$007F
            0x39, // rts
        ]);
        assert_eq!(line(&bus, 0x1000), "0x1000    lda   #$05");
        assert_eq!(line(&bus, 0x1002), "0x1002    sta   $10");
        assert_eq!(line(&bus, 0x1004), "0x1004    sta   $0402");
        assert_eq!(line(&bus, 0x1007), "0x1007    lda   $03,x");
        assert_eq!(line(&bus, 0x1009), "0x1009    bra   $1009");
        assert_eq!(line(&bus, 0x100B), "0x100B    lds   #$007F");
        assert_eq!(line(&bus, 0x100E), "0x100E    rts   ");
    }

    #[test]
    fn test_next_pc_walks_program() {
        let bus = bus_with(&[0x86, 0x05, 0x97, 0x10, 0x01]);
        let mut pc = 0x1000;
        let mut mnemonics = Vec::new();
        for _ in 0..3 {
            let listing = Listing::at(&bus, pc, Variant::M6800).unwrap();
            mnemonics.push(listing.decoded.mnemonic);
            pc = listing.next_pc();
        }
        assert_eq!(mnemonics, vec!["lda", "sta", "nop"]);
        assert_eq!(pc, 0x1005);
    }

    #[test]
    fn test_decode_unmapped_faults() {
        let bus = bus_with(&[]);
        assert!(decode_one(&bus, 0x4000, Variant::M6800).is_err());
        // operand past the end of RAM
        let mut bus = Bus::new();
        bus.mount_ram(0x0000, 0x10).unwrap();
        bus.load(0x000F, &[0x86]).unwrap();
        assert!(decode_one(&bus, 0x000F, Variant::M6800).is_err());
    }
}
