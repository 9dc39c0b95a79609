//! Host playback of a sound board
//!
//! The SDL2 audio thread owns the sample clock and pulls mono f32 samples from it. Key
//! presses reach the board through the clock's `Keypad`.

use crate::clock::SampleClock;
use log::{info, warn};
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

pub struct SoundOutput {
    device: AudioDevice<ClockCallback>,
}

impl SoundOutput {
    /// Open a mono playback device at `sample_rate` and hand it the clock.
    ///
    /// The device starts paused.
    ///
    /// # Errors
    /// Returns SDL's message if the audio subsystem or the device cannot be opened
    pub fn new(
        sdl_context: &sdl2::Sdl,
        clock: SampleClock,
        sample_rate: i32,
    ) -> Result<Self, String> {
        let audio_subsystem = sdl_context.audio()?;

        let desired_spec = AudioSpecDesired {
            freq: Some(sample_rate),
            channels: Some(1),
            samples: None,
        };

        let device = audio_subsystem.open_playback(None, &desired_spec, |spec| {
            info!(
                "audio device opened: {} Hz, {} channel(s), {} samples per buffer",
                spec.freq, spec.channels, spec.samples
            );
            if spec.freq != sample_rate {
                warn!(
                    "device runs at {} Hz instead of {} Hz, pitch will be off",
                    spec.freq, sample_rate
                );
            }
            ClockCallback { clock }
        })?;

        Ok(Self { device })
    }

    /// Start pulling samples
    pub fn resume(&self) {
        self.device.resume();
    }

    /// Stop pulling samples; the clock keeps its state
    pub fn pause(&self) {
        self.device.pause();
    }

    /// Run `f` against the clock while the audio thread is locked out
    pub fn with_clock<R>(&mut self, f: impl FnOnce(&mut SampleClock) -> R) -> R {
        let mut guard = self.device.lock();
        f(&mut guard.clock)
    }
}

struct ClockCallback {
    clock: SampleClock,
}

impl AudioCallback for ClockCallback {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        self.clock.fill(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::bus::Bus;
    use crate::config::Config;
    use serial_test::serial;

    fn idle_clock() -> SampleClock {
        let mut rom = vec![0u8; 0x800];
        rom[0] = 0x20;
        rom[1] = 0xFE;
        rom[0x7FE] = 0xF8;
        let mut bus = Bus::new();
        bus.mount_ram(0x0000, 0x80).unwrap();
        bus.mount_pia(0x0400).unwrap();
        bus.mount_rom(0xF800, &rom).unwrap();
        let config = Config::default();
        SampleClock::new(Board::new(bus, &config).unwrap(), &config).unwrap()
    }

    #[test]
    #[serial]
    fn test_audio_creation_and_control() {
        // Hosts without a sound device have nothing to test
        let Ok(sdl_context) = sdl2::init() else {
            return;
        };
        let Ok(mut audio) = SoundOutput::new(&sdl_context, idle_clock(), 44_100) else {
            return;
        };

        audio.resume();
        audio.pause();
        let keypad = audio.with_clock(|clock| {
            assert!(clock.fault().is_none());
            clock.keypad()
        });
        assert!(keypad.press(0x01));
    }
}
