use bitflags::bitflags;

/// Operand encodings of the 680x family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// No operand bytes
    Inherent,
    /// One signed offset byte, relative to the following instruction
    Relative,
    /// One immediate byte
    ByteImmediate,
    /// Two immediate bytes, big-endian
    WordImmediate,
    /// One byte, zero-extended to an address in the first page
    Direct,
    /// HD63701: immediate byte followed by a direct address
    ImmediateDirect,
    /// Two bytes forming a full address
    Extended,
    /// One unsigned byte added to X
    Indexed,
    /// HD63701: immediate byte followed by an X offset
    ImmediateIndexed,
    /// HD63701 undocumented: byte at SP+1
    StackByte,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode
    pub const fn operand_len(self) -> u16 {
        match self {
            AddressingMode::Inherent | AddressingMode::StackByte => 0,
            AddressingMode::Relative
            | AddressingMode::ByteImmediate
            | AddressingMode::Direct
            | AddressingMode::Indexed => 1,
            AddressingMode::WordImmediate
            | AddressingMode::Extended
            | AddressingMode::ImmediateDirect
            | AddressingMode::ImmediateIndexed => 2,
        }
    }
}

bitflags! {
    /// Set of CPU variants, used to mark where an opcode does not exist
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Variants: u8 {
        /// 6800, 6802, 6808
        const M6800 = 0b0000_0001;
        /// 6801, 6803
        const M6801 = 0b0000_0010;
        /// Hitachi HD63701
        const HD63701 = 0b0000_0100;
    }
}

/// The CPU a program is decoded for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    M6800,
    M6801,
    Hd63701,
}

impl Variant {
    /// The bit this variant occupies in an opcode's invalid mask
    pub const fn mask(self) -> Variants {
        match self {
            Variant::M6800 => Variants::M6800,
            Variant::M6801 => Variants::M6801,
            Variant::Hd63701 => Variants::HD63701,
        }
    }
}

/// One entry of the opcode table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpCode {
    /// The opcode byte value
    pub code: u8,
    /// Lowercase mnemonic, "ill" for bytes that decode to nothing on any variant
    pub mnemonic: &'static str,
    pub mode: AddressingMode,
    /// Cycle cost on the 6800, 0 where the 6800 core never executes the opcode
    pub cycles: u8,
    /// Variants on which this opcode is not a valid instruction
    pub invalid: Variants,
}

impl OpCode {
    const fn new(
        code: u8,
        mnemonic: &'static str,
        mode: AddressingMode,
        cycles: u8,
        invalid: Variants,
    ) -> Self {
        Self {
            code,
            mnemonic,
            mode,
            cycles,
            invalid,
        }
    }

    /// True if `variant` executes this byte as an instruction
    pub fn is_valid_for(&self, variant: Variant) -> bool {
        !self.invalid.intersects(variant.mask())
    }

    /// Instruction length in bytes, opcode included
    pub fn length(&self) -> u16 {
        1 + self.mode.operand_len()
    }
}

/// Descriptor for an opcode byte. Every byte has one.
pub fn describe(code: u8) -> &'static OpCode {
    &OPCODE_TABLE[code as usize]
}

// Opcode constants for use in match patterns
pub const NOP: u8 = 0x01;
pub const TAP: u8 = 0x06;
pub const TPA: u8 = 0x07;
pub const INX: u8 = 0x08;
pub const DEX: u8 = 0x09;
pub const CLV: u8 = 0x0A;
pub const SEV: u8 = 0x0B;
pub const CLC: u8 = 0x0C;
pub const SEC: u8 = 0x0D;
pub const CLI: u8 = 0x0E;
pub const SEI: u8 = 0x0F;
pub const SBA: u8 = 0x10;
pub const CBA: u8 = 0x11;
pub const TAB: u8 = 0x16;
pub const TBA: u8 = 0x17;
pub const DAA: u8 = 0x19;
pub const ABA: u8 = 0x1B;
pub const BRA: u8 = 0x20;
pub const BRN: u8 = 0x21;
pub const BHI: u8 = 0x22;
pub const BLS: u8 = 0x23;
pub const BCC: u8 = 0x24;
pub const BCS: u8 = 0x25;
pub const BNE: u8 = 0x26;
pub const BEQ: u8 = 0x27;
pub const BVC: u8 = 0x28;
pub const BVS: u8 = 0x29;
pub const BPL: u8 = 0x2A;
pub const BMI: u8 = 0x2B;
pub const BGE: u8 = 0x2C;
pub const BLT: u8 = 0x2D;
pub const BGT: u8 = 0x2E;
pub const BLE: u8 = 0x2F;
pub const TSX: u8 = 0x30;
pub const INS: u8 = 0x31;
pub const PULA: u8 = 0x32;
pub const PULB: u8 = 0x33;
pub const DES: u8 = 0x34;
pub const TXS: u8 = 0x35;
pub const PSHA: u8 = 0x36;
pub const PSHB: u8 = 0x37;
pub const RTS: u8 = 0x39;
pub const RTI: u8 = 0x3B;
pub const WAI: u8 = 0x3E;
pub const SWI: u8 = 0x3F;
pub const LDAA_IMM: u8 = 0x86;
pub const BSR: u8 = 0x8D;
pub const STAA_DIR: u8 = 0x97;
pub const JSR_IDX: u8 = 0xAD;
pub const JSR_EXT: u8 = 0xBD;
pub const LDAB_IMM: u8 = 0xC6;

const INH: AddressingMode = AddressingMode::Inherent;
const REL: AddressingMode = AddressingMode::Relative;
const IMB: AddressingMode = AddressingMode::ByteImmediate;
const IMW: AddressingMode = AddressingMode::WordImmediate;
const DIR: AddressingMode = AddressingMode::Direct;
const IMD: AddressingMode = AddressingMode::ImmediateDirect;
const EXT: AddressingMode = AddressingMode::Extended;
const IDX: AddressingMode = AddressingMode::Indexed;
const IMX: AddressingMode = AddressingMode::ImmediateIndexed;
const SX1: AddressingMode = AddressingMode::StackByte;

const NONE: Variants = Variants::empty();
const M6800: Variants = Variants::M6800;
const M6800_M6801: Variants = Variants::M6800.union(Variants::M6801);
const ALL: Variants = Variants::all();

/// Opcode table indexed by opcode byte
pub static OPCODE_TABLE: [OpCode; 256] = [
    // 00
    OpCode::new(0x00, "ill", INH, 0, ALL),
    OpCode::new(0x01, "nop", INH, 2, NONE),
    OpCode::new(0x02, "ill", INH, 0, ALL),
    OpCode::new(0x03, "ill", INH, 0, ALL),
    OpCode::new(0x04, "lsrd", INH, 0, M6800),
    OpCode::new(0x05, "asld", INH, 0, M6800),
    OpCode::new(0x06, "tap", INH, 2, NONE),
    OpCode::new(0x07, "tpa", INH, 2, NONE),
    OpCode::new(0x08, "inx", INH, 4, NONE),
    OpCode::new(0x09, "dex", INH, 4, NONE),
    OpCode::new(0x0A, "clv", INH, 2, NONE),
    OpCode::new(0x0B, "sev", INH, 2, NONE),
    OpCode::new(0x0C, "clc", INH, 2, NONE),
    OpCode::new(0x0D, "sec", INH, 2, NONE),
    OpCode::new(0x0E, "cli", INH, 2, NONE),
    OpCode::new(0x0F, "sei", INH, 2, NONE),
    // 10
    OpCode::new(0x10, "sba", INH, 2, NONE),
    OpCode::new(0x11, "cba", INH, 2, NONE),
    OpCode::new(0x12, "asx1", SX1, 0, ALL),
    OpCode::new(0x13, "asx2", SX1, 0, ALL),
    OpCode::new(0x14, "ill", INH, 0, ALL),
    OpCode::new(0x15, "ill", INH, 0, ALL),
    OpCode::new(0x16, "tab", INH, 2, NONE),
    OpCode::new(0x17, "tba", INH, 2, NONE),
    OpCode::new(0x18, "xgdx", INH, 0, M6800_M6801),
    OpCode::new(0x19, "daa", INH, 2, NONE),
    OpCode::new(0x1A, "ill", INH, 0, ALL),
    OpCode::new(0x1B, "aba", INH, 2, NONE),
    OpCode::new(0x1C, "ill", INH, 0, ALL),
    OpCode::new(0x1D, "ill", INH, 0, ALL),
    OpCode::new(0x1E, "ill", INH, 0, ALL),
    OpCode::new(0x1F, "ill", INH, 0, ALL),
    // 20
    OpCode::new(0x20, "bra", REL, 4, NONE),
    OpCode::new(0x21, "brn", REL, 0, M6800),
    OpCode::new(0x22, "bhi", REL, 4, NONE),
    OpCode::new(0x23, "bls", REL, 4, NONE),
    OpCode::new(0x24, "bcc", REL, 4, NONE),
    OpCode::new(0x25, "bcs", REL, 4, NONE),
    OpCode::new(0x26, "bne", REL, 4, NONE),
    OpCode::new(0x27, "beq", REL, 4, NONE),
    OpCode::new(0x28, "bvc", REL, 4, NONE),
    OpCode::new(0x29, "bvs", REL, 4, NONE),
    OpCode::new(0x2A, "bpl", REL, 4, NONE),
    OpCode::new(0x2B, "bmi", REL, 4, NONE),
    OpCode::new(0x2C, "bge", REL, 4, NONE),
    OpCode::new(0x2D, "blt", REL, 4, NONE),
    OpCode::new(0x2E, "bgt", REL, 4, NONE),
    OpCode::new(0x2F, "ble", REL, 4, NONE),
    // 30
    OpCode::new(0x30, "tsx", INH, 4, NONE),
    OpCode::new(0x31, "ins", INH, 4, NONE),
    OpCode::new(0x32, "pula", INH, 4, NONE),
    OpCode::new(0x33, "pulb", INH, 4, NONE),
    OpCode::new(0x34, "des", INH, 4, NONE),
    OpCode::new(0x35, "txs", INH, 4, NONE),
    OpCode::new(0x36, "psha", INH, 4, NONE),
    OpCode::new(0x37, "pshb", INH, 4, NONE),
    OpCode::new(0x38, "pulx", INH, 0, M6800),
    OpCode::new(0x39, "rts", INH, 5, NONE),
    OpCode::new(0x3A, "abx", INH, 0, M6800),
    OpCode::new(0x3B, "rti", INH, 10, NONE),
    OpCode::new(0x3C, "pshx", INH, 0, M6800),
    OpCode::new(0x3D, "mul", INH, 0, M6800),
    OpCode::new(0x3E, "wai", INH, 9, NONE),
    OpCode::new(0x3F, "swi", INH, 12, NONE),
    // 40
    OpCode::new(0x40, "nega", INH, 2, NONE),
    OpCode::new(0x41, "ill", INH, 0, ALL),
    OpCode::new(0x42, "ill", INH, 0, ALL),
    OpCode::new(0x43, "coma", INH, 2, NONE),
    OpCode::new(0x44, "lsra", INH, 2, NONE),
    OpCode::new(0x45, "ill", INH, 0, ALL),
    OpCode::new(0x46, "rora", INH, 2, NONE),
    OpCode::new(0x47, "asra", INH, 2, NONE),
    OpCode::new(0x48, "asla", INH, 2, NONE),
    OpCode::new(0x49, "rola", INH, 2, NONE),
    OpCode::new(0x4A, "deca", INH, 2, NONE),
    OpCode::new(0x4B, "ill", INH, 0, ALL),
    OpCode::new(0x4C, "inca", INH, 2, NONE),
    OpCode::new(0x4D, "tsta", INH, 2, NONE),
    OpCode::new(0x4E, "ill", INH, 0, ALL),
    OpCode::new(0x4F, "clra", INH, 2, NONE),
    // 50
    OpCode::new(0x50, "negb", INH, 2, NONE),
    OpCode::new(0x51, "ill", INH, 0, ALL),
    OpCode::new(0x52, "ill", INH, 0, ALL),
    OpCode::new(0x53, "comb", INH, 2, NONE),
    OpCode::new(0x54, "lsrb", INH, 2, NONE),
    OpCode::new(0x55, "ill", INH, 0, ALL),
    OpCode::new(0x56, "rorb", INH, 2, NONE),
    OpCode::new(0x57, "asrb", INH, 2, NONE),
    OpCode::new(0x58, "aslb", INH, 2, NONE),
    OpCode::new(0x59, "rolb", INH, 2, NONE),
    OpCode::new(0x5A, "decb", INH, 2, NONE),
    OpCode::new(0x5B, "ill", INH, 0, ALL),
    OpCode::new(0x5C, "incb", INH, 2, NONE),
    OpCode::new(0x5D, "tstb", INH, 2, NONE),
    OpCode::new(0x5E, "ill", INH, 0, ALL),
    OpCode::new(0x5F, "clrb", INH, 2, NONE),
    // 60
    OpCode::new(0x60, "neg", IDX, 7, NONE),
    OpCode::new(0x61, "aim", IMX, 0, M6800_M6801),
    OpCode::new(0x62, "oim", IMX, 0, M6800_M6801),
    OpCode::new(0x63, "com", IDX, 7, NONE),
    OpCode::new(0x64, "lsr", IDX, 7, NONE),
    OpCode::new(0x65, "eim", IMX, 0, M6800_M6801),
    OpCode::new(0x66, "ror", IDX, 7, NONE),
    OpCode::new(0x67, "asr", IDX, 7, NONE),
    OpCode::new(0x68, "asl", IDX, 7, NONE),
    OpCode::new(0x69, "rol", IDX, 7, NONE),
    OpCode::new(0x6A, "dec", IDX, 7, NONE),
    OpCode::new(0x6B, "tim", IMX, 0, M6800_M6801),
    OpCode::new(0x6C, "inc", IDX, 7, NONE),
    OpCode::new(0x6D, "tst", IDX, 7, NONE),
    OpCode::new(0x6E, "jmp", IDX, 4, NONE),
    OpCode::new(0x6F, "clr", IDX, 7, NONE),
    // 70
    OpCode::new(0x70, "neg", EXT, 6, NONE),
    OpCode::new(0x71, "aim", IMD, 0, M6800_M6801),
    OpCode::new(0x72, "oim", IMD, 0, M6800_M6801),
    OpCode::new(0x73, "com", EXT, 6, NONE),
    OpCode::new(0x74, "lsr", EXT, 6, NONE),
    OpCode::new(0x75, "eim", IMD, 0, M6800_M6801),
    OpCode::new(0x76, "ror", EXT, 6, NONE),
    OpCode::new(0x77, "asr", EXT, 6, NONE),
    OpCode::new(0x78, "asl", EXT, 6, NONE),
    OpCode::new(0x79, "rol", EXT, 6, NONE),
    OpCode::new(0x7A, "dec", EXT, 6, NONE),
    OpCode::new(0x7B, "tim", IMD, 0, M6800_M6801),
    OpCode::new(0x7C, "inc", EXT, 6, NONE),
    OpCode::new(0x7D, "tst", EXT, 6, NONE),
    OpCode::new(0x7E, "jmp", EXT, 3, NONE),
    OpCode::new(0x7F, "clr", EXT, 6, NONE),
    // 80
    OpCode::new(0x80, "suba", IMB, 2, NONE),
    OpCode::new(0x81, "cmpa", IMB, 2, NONE),
    OpCode::new(0x82, "sbca", IMB, 2, NONE),
    OpCode::new(0x83, "subd", IMW, 0, M6800),
    OpCode::new(0x84, "anda", IMB, 2, NONE),
    OpCode::new(0x85, "bita", IMB, 2, NONE),
    OpCode::new(0x86, "lda", IMB, 2, NONE),
    OpCode::new(0x87, "sta", IMB, 0, ALL),
    OpCode::new(0x88, "eora", IMB, 2, NONE),
    OpCode::new(0x89, "adca", IMB, 2, NONE),
    OpCode::new(0x8A, "ora", IMB, 2, NONE),
    OpCode::new(0x8B, "adda", IMB, 2, NONE),
    OpCode::new(0x8C, "cmpx", IMW, 3, NONE),
    OpCode::new(0x8D, "bsr", REL, 8, NONE),
    OpCode::new(0x8E, "lds", IMW, 3, NONE),
    OpCode::new(0x8F, "sts", IMW, 0, ALL),
    // 90
    OpCode::new(0x90, "suba", DIR, 3, NONE),
    OpCode::new(0x91, "cmpa", DIR, 3, NONE),
    OpCode::new(0x92, "sbca", DIR, 3, NONE),
    OpCode::new(0x93, "subd", DIR, 0, M6800),
    OpCode::new(0x94, "anda", DIR, 3, NONE),
    OpCode::new(0x95, "bita", DIR, 3, NONE),
    OpCode::new(0x96, "lda", DIR, 3, NONE),
    OpCode::new(0x97, "sta", DIR, 4, NONE),
    OpCode::new(0x98, "eora", DIR, 3, NONE),
    OpCode::new(0x99, "adca", DIR, 3, NONE),
    OpCode::new(0x9A, "ora", DIR, 3, NONE),
    OpCode::new(0x9B, "adda", DIR, 3, NONE),
    OpCode::new(0x9C, "cmpx", DIR, 4, NONE),
    OpCode::new(0x9D, "jsr", DIR, 0, M6800),
    OpCode::new(0x9E, "lds", DIR, 4, NONE),
    OpCode::new(0x9F, "sts", DIR, 5, NONE),
    // A0
    OpCode::new(0xA0, "suba", IDX, 5, NONE),
    OpCode::new(0xA1, "cmpa", IDX, 5, NONE),
    OpCode::new(0xA2, "sbca", IDX, 5, NONE),
    OpCode::new(0xA3, "subd", IDX, 0, M6800),
    OpCode::new(0xA4, "anda", IDX, 5, NONE),
    OpCode::new(0xA5, "bita", IDX, 5, NONE),
    OpCode::new(0xA6, "lda", IDX, 5, NONE),
    OpCode::new(0xA7, "sta", IDX, 6, NONE),
    OpCode::new(0xA8, "eora", IDX, 5, NONE),
    OpCode::new(0xA9, "adca", IDX, 5, NONE),
    OpCode::new(0xAA, "ora", IDX, 5, NONE),
    OpCode::new(0xAB, "adda", IDX, 5, NONE),
    OpCode::new(0xAC, "cmpx", IDX, 6, NONE),
    OpCode::new(0xAD, "jsr", IDX, 8, NONE),
    OpCode::new(0xAE, "lds", IDX, 6, NONE),
    OpCode::new(0xAF, "sts", IDX, 7, NONE),
    // B0
    OpCode::new(0xB0, "suba", EXT, 4, NONE),
    OpCode::new(0xB1, "cmpa", EXT, 4, NONE),
    OpCode::new(0xB2, "sbca", EXT, 4, NONE),
    OpCode::new(0xB3, "subd", EXT, 0, M6800),
    OpCode::new(0xB4, "anda", EXT, 4, NONE),
    OpCode::new(0xB5, "bita", EXT, 4, NONE),
    OpCode::new(0xB6, "lda", EXT, 4, NONE),
    OpCode::new(0xB7, "sta", EXT, 5, NONE),
    OpCode::new(0xB8, "eora", EXT, 4, NONE),
    OpCode::new(0xB9, "adca", EXT, 4, NONE),
    OpCode::new(0xBA, "ora", EXT, 4, NONE),
    OpCode::new(0xBB, "adda", EXT, 4, NONE),
    OpCode::new(0xBC, "cmpx", EXT, 5, NONE),
    OpCode::new(0xBD, "jsr", EXT, 9, NONE),
    OpCode::new(0xBE, "lds", EXT, 5, NONE),
    OpCode::new(0xBF, "sts", EXT, 6, NONE),
    // C0
    OpCode::new(0xC0, "subb", IMB, 2, NONE),
    OpCode::new(0xC1, "cmpb", IMB, 2, NONE),
    OpCode::new(0xC2, "sbcb", IMB, 2, NONE),
    OpCode::new(0xC3, "addd", IMW, 0, M6800),
    OpCode::new(0xC4, "andb", IMB, 2, NONE),
    OpCode::new(0xC5, "bitb", IMB, 2, NONE),
    OpCode::new(0xC6, "ldb", IMB, 2, NONE),
    OpCode::new(0xC7, "stb", IMB, 0, ALL),
    OpCode::new(0xC8, "eorb", IMB, 2, NONE),
    OpCode::new(0xC9, "adcb", IMB, 2, NONE),
    OpCode::new(0xCA, "orb", IMB, 2, NONE),
    OpCode::new(0xCB, "addb", IMB, 2, NONE),
    OpCode::new(0xCC, "ldd", IMW, 0, M6800),
    OpCode::new(0xCD, "_std", IMW, 0, M6800),
    OpCode::new(0xCE, "ldx", IMW, 3, NONE),
    OpCode::new(0xCF, "stx", IMW, 0, ALL),
    // D0
    OpCode::new(0xD0, "subb", DIR, 3, NONE),
    OpCode::new(0xD1, "cmpb", DIR, 3, NONE),
    OpCode::new(0xD2, "sbcb", DIR, 3, NONE),
    OpCode::new(0xD3, "addd", DIR, 0, M6800),
    OpCode::new(0xD4, "andb", DIR, 3, NONE),
    OpCode::new(0xD5, "bitb", DIR, 3, NONE),
    OpCode::new(0xD6, "ldb", DIR, 3, NONE),
    OpCode::new(0xD7, "stb", DIR, 4, NONE),
    OpCode::new(0xD8, "eorb", DIR, 3, NONE),
    OpCode::new(0xD9, "adcb", DIR, 3, NONE),
    OpCode::new(0xDA, "orb", DIR, 3, NONE),
    OpCode::new(0xDB, "addb", DIR, 3, NONE),
    OpCode::new(0xDC, "ldd", DIR, 0, M6800),
    OpCode::new(0xDD, "_std", DIR, 0, M6800),
    OpCode::new(0xDE, "ldx", DIR, 4, NONE),
    OpCode::new(0xDF, "stx", DIR, 5, NONE),
    // E0
    OpCode::new(0xE0, "subb", IDX, 5, NONE),
    OpCode::new(0xE1, "cmpb", IDX, 5, NONE),
    OpCode::new(0xE2, "sbcb", IDX, 5, NONE),
    OpCode::new(0xE3, "addd", IDX, 0, M6800),
    OpCode::new(0xE4, "andb", IDX, 5, NONE),
    OpCode::new(0xE5, "bitb", IDX, 5, NONE),
    OpCode::new(0xE6, "ldb", IDX, 5, NONE),
    OpCode::new(0xE7, "stb", IDX, 6, NONE),
    OpCode::new(0xE8, "eorb", IDX, 5, NONE),
    OpCode::new(0xE9, "adcb", IDX, 5, NONE),
    OpCode::new(0xEA, "orb", IDX, 5, NONE),
    OpCode::new(0xEB, "addb", IDX, 5, NONE),
    OpCode::new(0xEC, "ldd", IDX, 0, M6800),
    OpCode::new(0xED, "_std", IDX, 0, M6800),
    OpCode::new(0xEE, "ldx", IDX, 6, NONE),
    OpCode::new(0xEF, "stx", IDX, 7, NONE),
    // F0
    OpCode::new(0xF0, "subb", EXT, 4, NONE),
    OpCode::new(0xF1, "cmpb", EXT, 4, NONE),
    OpCode::new(0xF2, "sbcb", EXT, 4, NONE),
    OpCode::new(0xF3, "addd", EXT, 0, M6800),
    OpCode::new(0xF4, "andb", EXT, 4, NONE),
    OpCode::new(0xF5, "bitb", EXT, 4, NONE),
    OpCode::new(0xF6, "ldb", EXT, 4, NONE),
    OpCode::new(0xF7, "stb", EXT, 5, NONE),
    OpCode::new(0xF8, "eorb", EXT, 4, NONE),
    OpCode::new(0xF9, "adcb", EXT, 4, NONE),
    OpCode::new(0xFA, "orb", EXT, 4, NONE),
    OpCode::new(0xFB, "addb", EXT, 4, NONE),
    OpCode::new(0xFC, "ldd", EXT, 0, M6800),
    OpCode::new(0xFD, "_std", EXT, 0, M6800),
    OpCode::new(0xFE, "ldx", EXT, 5, NONE),
    OpCode::new(0xFF, "stx", EXT, 6, NONE),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_code() {
        for (i, op) in OPCODE_TABLE.iter().enumerate() {
            assert_eq!(op.code as usize, i, "entry {} has code {:02X}", i, op.code);
        }
    }

    #[test]
    fn test_describe_lda_immediate() {
        let op = describe(LDAA_IMM);
        assert_eq!(op.mnemonic, "lda");
        assert_eq!(op.mode, AddressingMode::ByteImmediate);
        assert_eq!(op.cycles, 2);
        assert_eq!(op.length(), 2);
        assert!(op.is_valid_for(Variant::M6800));
    }

    #[test]
    fn test_illegal_entries_are_invalid_everywhere() {
        let op = describe(0x00);
        assert_eq!(op.mnemonic, "ill");
        assert!(!op.is_valid_for(Variant::M6800));
        assert!(!op.is_valid_for(Variant::M6801));
        assert!(!op.is_valid_for(Variant::Hd63701));
    }

    #[test]
    fn test_6801_extensions_are_invalid_on_6800() {
        for code in [0x04, 0x05, 0x21, 0x38, 0x3A, 0x3C, 0x3D, 0x83, 0x9D, 0xC3, 0xCC, 0xDD] {
            let op = describe(code);
            assert!(!op.is_valid_for(Variant::M6800), "{:02X}", code);
            assert!(op.is_valid_for(Variant::M6801), "{:02X}", code);
        }
    }

    #[test]
    fn test_6800_has_197_instructions() {
        let valid = OPCODE_TABLE
            .iter()
            .filter(|op| op.is_valid_for(Variant::M6800))
            .count();
        assert_eq!(valid, 197);
    }

    #[test]
    fn test_every_valid_6800_opcode_has_a_cycle_cost() {
        for op in OPCODE_TABLE.iter().filter(|op| op.is_valid_for(Variant::M6800)) {
            assert!(op.cycles > 0, "{:02X} {}", op.code, op.mnemonic);
        }
    }

    #[test]
    fn test_operand_lengths() {
        assert_eq!(describe(NOP).length(), 1);
        assert_eq!(describe(BRA).length(), 2);
        assert_eq!(describe(0xCE).length(), 3); // ldx #
        assert_eq!(describe(JSR_EXT).length(), 3);
        assert_eq!(describe(JSR_IDX).length(), 2);
        assert_eq!(describe(STAA_DIR).length(), 2);
    }

    #[test]
    fn test_cycle_costs_of_control_flow() {
        assert_eq!(describe(BSR).cycles, 8);
        assert_eq!(describe(JSR_EXT).cycles, 9);
        assert_eq!(describe(RTS).cycles, 5);
        assert_eq!(describe(RTI).cycles, 10);
        assert_eq!(describe(SWI).cycles, 12);
        assert_eq!(describe(WAI).cycles, 9);
    }

    #[test]
    fn test_store_immediate_is_illegal() {
        for code in [0x87, 0x8F, 0xC7, 0xCF] {
            assert!(!describe(code).is_valid_for(Variant::M6800));
        }
    }

    #[test]
    fn test_hd63701_modes_only_on_hd63701_entries() {
        for op in OPCODE_TABLE.iter() {
            if matches!(
                op.mode,
                AddressingMode::ImmediateDirect | AddressingMode::ImmediateIndexed
            ) {
                assert!(!op.is_valid_for(Variant::M6800));
                assert!(op.is_valid_for(Variant::Hd63701));
            }
        }
    }
}
