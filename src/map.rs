use crate::bus::Bus;
use crate::config::RamInit;
use crate::error::MountError;
use log::warn;
use rand::Rng;

/// Something placed at a fixed address on a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
    Ram { size: usize },
    Rom { slot: &'static str, size: usize },
    Pia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mount {
    pub base: u16,
    pub kind: MountKind,
}

/// Address layout of a sound board. ROM images are supplied when the bus is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryMap {
    mounts: Vec<Mount>,
}

impl MemoryMap {
    /// An empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `size` bytes of RAM at `base`
    pub fn ram(mut self, base: u16, size: usize) -> Self {
        self.mounts.push(Mount {
            base,
            kind: MountKind::Ram { size },
        });
        self
    }

    /// Add a ROM socket named `slot` that takes an image of exactly `size` bytes
    pub fn rom(mut self, slot: &'static str, base: u16, size: usize) -> Self {
        self.mounts.push(Mount {
            base,
            kind: MountKind::Rom { slot, size },
        });
        self
    }

    /// Add the PIA's four registers at `base`
    pub fn pia(mut self, base: u16) -> Self {
        self.mounts.push(Mount {
            base,
            kind: MountKind::Pia,
        });
        self
    }

    /// Williams System 6/7 sound board as fitted to Firepower: the 6802's 128 bytes of
    /// internal RAM, the PIA at $0400 and four sockets for the sound and speech ROMs.
    pub fn firepower() -> Self {
        Self::new()
            .ram(0x0000, 0x80)
            .pia(0x0400)
            .rom("IC7", 0xB000, 0x1000)
            .rom("IC5", 0xC000, 0x1000)
            .rom("IC6", 0xD000, 0x1000)
            .rom("IC12", 0xF800, 0x0800)
    }

    /// Everything in the layout, in declaration order
    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// ROM sockets as (slot, base, size), in the order images are expected
    pub fn rom_slots(&self) -> impl Iterator<Item = (&'static str, u16, usize)> + '_ {
        self.mounts.iter().filter_map(|m| match m.kind {
            MountKind::Rom { slot, size } => Some((slot, m.base, size)),
            _ => None,
        })
    }

    /// Mount everything on a fresh bus. `images` fill the ROM sockets in declaration order.
    pub fn build(&self, images: &[&[u8]], ram_init: RamInit) -> Result<Bus, MountError> {
        let mut bus = Bus::new();
        let mut images = images.iter();

        for mount in &self.mounts {
            match mount.kind {
                MountKind::Ram { size } => {
                    let mut contents = vec![0u8; size];
                    if ram_init == RamInit::Random {
                        rand::rng().fill(&mut contents[..]);
                    }
                    bus.mount_ram_with(mount.base, contents)?;
                }
                MountKind::Rom { slot, size } => {
                    let image = images.next().ok_or(MountError::MissingImage { slot })?;
                    if image.len() != size {
                        return Err(MountError::RomSize {
                            slot,
                            expected: size,
                            actual: image.len(),
                        });
                    }
                    bus.mount_rom(mount.base, image)?;
                }
                MountKind::Pia => bus.mount_pia(mount.base)?,
            }
        }

        let extra = images.count();
        if extra > 0 {
            warn!("{} ROM image(s) left over after filling every socket", extra);
        }
        Ok(bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::RegionKind;

    fn firepower_images() -> Vec<Vec<u8>> {
        vec![
            vec![0x07; 0x1000],
            vec![0x05; 0x1000],
            vec![0x06; 0x1000],
            vec![0x12; 0x0800],
        ]
    }

    #[test]
    fn test_firepower_layout() {
        let images = firepower_images();
        let refs: Vec<&[u8]> = images.iter().map(|i| i.as_slice()).collect();
        let bus = MemoryMap::firepower().build(&refs, RamInit::Zero).unwrap();

        assert_eq!(bus.peek_byte(0xB000).unwrap(), 0x07);
        assert_eq!(bus.peek_byte(0xCFFF).unwrap(), 0x05);
        assert_eq!(bus.peek_byte(0xD800).unwrap(), 0x06);
        assert_eq!(bus.peek_byte(0xFFFF).unwrap(), 0x12);
        assert_eq!(bus.peek_byte(0x007F).unwrap(), 0x00);
        assert!(bus.peek_byte(0x0080).is_err());
        assert!(bus.peek_byte(0xE000).is_err());

        let kinds: Vec<RegionKind> = bus.regions().map(|(_, _, kind)| kind).collect();
        assert_eq!(kinds[1], RegionKind::Pia);
    }

    #[test]
    fn test_rom_slot_order() {
        let slots: Vec<&str> = MemoryMap::firepower()
            .rom_slots()
            .map(|(slot, _, _)| slot)
            .collect();
        assert_eq!(slots, vec!["IC7", "IC5", "IC6", "IC12"]);
    }

    #[test]
    fn test_wrong_rom_size_is_rejected() {
        let mut images = firepower_images();
        images[3] = vec![0; 0x1000];
        let refs: Vec<&[u8]> = images.iter().map(|i| i.as_slice()).collect();
        assert_eq!(
            MemoryMap::firepower().build(&refs, RamInit::Zero).err(),
            Some(MountError::RomSize {
                slot: "IC12",
                expected: 0x800,
                actual: 0x1000
            })
        );
    }

    #[test]
    fn test_missing_image_is_rejected() {
        let images = firepower_images();
        let refs: Vec<&[u8]> = images.iter().take(2).map(|i| i.as_slice()).collect();
        assert_eq!(
            MemoryMap::firepower().build(&refs, RamInit::Zero).err(),
            Some(MountError::MissingImage { slot: "IC6" })
        );
    }

    #[test]
    fn test_overlapping_layout_is_rejected() {
        let map = MemoryMap::new().ram(0x0000, 0x100).pia(0x0080);
        assert!(matches!(
            map.build(&[], RamInit::Zero),
            Err(MountError::Overlap { .. })
        ));
    }

    #[test]
    fn test_random_ram_is_mounted() {
        let map = MemoryMap::new().ram(0x0000, 0x80);
        let bus = map.build(&[], RamInit::Random).unwrap();
        assert!(bus.peek_byte(0x007F).is_ok());
    }
}
