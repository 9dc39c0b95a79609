use crate::error::{Access, BusFault, MountError};
use crate::pia::{Pia, Port};

/// Number of PIA registers decoded by a PIA window
pub const PIA_WINDOW: usize = 4;

const ADDRESS_SPACE: usize = 0x10000;

/// What backs a mounted address range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Ram,
    Rom,
    Pia,
}

#[derive(Debug, Clone)]
struct Region {
    base: u16,
    size: usize,
    kind: RegionKind,
    data: Vec<u8>,
}

impl Region {
    fn contains(&self, addr: u16) -> bool {
        let addr = addr as usize;
        addr >= self.base as usize && addr < self.base as usize + self.size
    }

    fn offset(&self, addr: u16) -> usize {
        (addr - self.base) as usize
    }
}

/// Snapshot of one address for heat maps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heat {
    pub addr: u16,
    /// None when the address is unmapped
    pub value: Option<u8>,
    pub reads: u32,
    pub writes: u32,
}

/// The 6800's 64KB address space, routed to RAM, ROM and the PIA
pub struct Bus {
    regions: Vec<Region>,
    pia: Pia,
    reads: Vec<u32>,
    writes: Vec<u32>,
}

impl Bus {
    /// Create a bus with nothing mounted
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            pia: Pia::new(),
            reads: vec![0; ADDRESS_SPACE],
            writes: vec![0; ADDRESS_SPACE],
        }
    }

    /// Mount zero-filled RAM
    pub fn mount_ram(&mut self, base: u16, size: usize) -> Result<(), MountError> {
        self.mount(base, size, RegionKind::Ram, vec![0; size])
    }

    /// Mount RAM with initial contents
    pub fn mount_ram_with(&mut self, base: u16, contents: Vec<u8>) -> Result<(), MountError> {
        self.mount(base, contents.len(), RegionKind::Ram, contents)
    }

    /// Mount a read-only image
    pub fn mount_rom(&mut self, base: u16, image: &[u8]) -> Result<(), MountError> {
        self.mount(base, image.len(), RegionKind::Rom, image.to_vec())
    }

    /// Mount the PIA's four registers at `base`
    pub fn mount_pia(&mut self, base: u16) -> Result<(), MountError> {
        self.mount(base, PIA_WINDOW, RegionKind::Pia, Vec::new())
    }

    fn mount(
        &mut self,
        base: u16,
        size: usize,
        kind: RegionKind,
        data: Vec<u8>,
    ) -> Result<(), MountError> {
        if size == 0 {
            return Err(MountError::Empty { base });
        }
        let end = base as usize + size;
        if end > ADDRESS_SPACE {
            return Err(MountError::OutOfRange { base, size });
        }
        for region in &self.regions {
            let existing_end = region.base as usize + region.size;
            if (base as usize) < existing_end && end > region.base as usize {
                return Err(MountError::Overlap {
                    base,
                    size,
                    existing_base: region.base,
                    existing_size: region.size,
                });
            }
        }
        self.regions.push(Region {
            base,
            size,
            kind,
            data,
        });
        Ok(())
    }

    /// Mounted regions as (base, size, kind), in mount order
    pub fn regions(&self) -> impl Iterator<Item = (u16, usize, RegionKind)> + '_ {
        self.regions.iter().map(|r| (r.base, r.size, r.kind))
    }

    fn find(&self, addr: u16) -> Option<usize> {
        self.regions.iter().position(|r| r.contains(addr))
    }

    /// Read a byte as the CPU does, counting the access
    pub fn read_byte(&mut self, addr: u16) -> Result<u8, BusFault> {
        let index = self.find(addr).ok_or(BusFault::Unmapped {
            addr,
            access: Access::Read,
        })?;
        self.reads[addr as usize] = self.reads[addr as usize].saturating_add(1);

        let region = &self.regions[index];
        let offset = region.offset(addr);
        Ok(match region.kind {
            RegionKind::Ram | RegionKind::Rom => region.data[offset],
            RegionKind::Pia => self.pia.read(offset as u8),
        })
    }

    /// Write a byte as the CPU does, counting the access
    pub fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), BusFault> {
        let index = self.find(addr).ok_or(BusFault::Unmapped {
            addr,
            access: Access::Write,
        })?;
        self.writes[addr as usize] = self.writes[addr as usize].saturating_add(1);

        let region = &mut self.regions[index];
        let offset = region.offset(addr);
        match region.kind {
            RegionKind::Ram => region.data[offset] = value,
            RegionKind::Rom => return Err(BusFault::ReadOnly { addr, value }),
            RegionKind::Pia => self.pia.write(offset as u8, value),
        }
        Ok(())
    }

    /// Read a big-endian word: high byte at `addr`, low byte at `addr + 1`
    pub fn read_word(&mut self, addr: u16) -> Result<u16, BusFault> {
        let hi = self.read_byte(addr)?;
        let lo = self.read_byte(addr.wrapping_add(1))?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    /// Write a big-endian word
    pub fn write_word(&mut self, addr: u16, value: u16) -> Result<(), BusFault> {
        let [hi, lo] = value.to_be_bytes();
        self.write_byte(addr, hi)?;
        self.write_byte(addr.wrapping_add(1), lo)
    }

    /// Read a byte without counting it or touching device state
    pub fn peek_byte(&self, addr: u16) -> Result<u8, BusFault> {
        let index = self.find(addr).ok_or(BusFault::Unmapped {
            addr,
            access: Access::Read,
        })?;
        let region = &self.regions[index];
        let offset = region.offset(addr);
        Ok(match region.kind {
            RegionKind::Ram | RegionKind::Rom => region.data[offset],
            RegionKind::Pia => self.pia.peek(offset as u8),
        })
    }

    /// Read a big-endian word without counting it or touching device state
    pub fn peek_word(&self, addr: u16) -> Result<u16, BusFault> {
        let hi = self.peek_byte(addr)?;
        let lo = self.peek_byte(addr.wrapping_add(1))?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    /// Store bytes into RAM or ROM regardless of write protection. Counters are untouched.
    pub fn load(&mut self, addr: u16, bytes: &[u8]) -> Result<(), BusFault> {
        for (i, &byte) in bytes.iter().enumerate() {
            let target = addr.wrapping_add(i as u16);
            let index = self.find(target).ok_or(BusFault::Unmapped {
                addr: target,
                access: Access::Write,
            })?;
            let region = &mut self.regions[index];
            let offset = region.offset(target);
            match region.kind {
                RegionKind::Ram | RegionKind::Rom => region.data[offset] = byte,
                RegionKind::Pia => self.pia.write(offset as u8, byte),
            }
        }
        Ok(())
    }

    /// Access counts for an address as (reads, writes)
    pub fn counts(&self, addr: u16) -> (u32, u32) {
        (self.reads[addr as usize], self.writes[addr as usize])
    }

    /// Values and access counts for `start..=end`. Each call halves the counters it reports,
    /// so repeated polling shows recent activity.
    pub fn heat(&mut self, start: u16, end: u16) -> Vec<Heat> {
        let mut out = Vec::with_capacity(end.saturating_sub(start) as usize + 1);
        for addr in start..=end {
            let i = addr as usize;
            out.push(Heat {
                addr,
                value: self.peek_byte(addr).ok(),
                reads: self.reads[i],
                writes: self.writes[i],
            });
            self.reads[i] /= 2;
            self.writes[i] /= 2;
        }
        out
    }

    /// Zero every read and write counter
    pub fn reset_counters(&mut self) {
        self.reads.fill(0);
        self.writes.fill(0);
    }

    /// The PIA, whether or not it is mounted
    pub fn pia(&self) -> &Pia {
        &self.pia
    }

    /// Mutable PIA access for driving inputs from outside the CPU
    pub fn pia_mut(&mut self) -> &mut Pia {
        &mut self.pia
    }

    /// True while either PIA port holds an interrupt
    pub fn irq_asserted(&self) -> bool {
        self.pia.irq(Port::A) || self.pia.irq(Port::B)
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
