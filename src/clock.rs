use crate::board::Board;
use crate::config::Config;
use crate::error::{ConfigError, CpuError};
use crate::pia::Port;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::{debug, error, warn};

/// Cloneable handle for queueing key codes from any thread
#[derive(Debug, Clone)]
pub struct Keypad {
    sender: Sender<u8>,
}

impl Keypad {
    /// Queue a code for PIA port B without blocking. Returns false if it was dropped.
    pub fn press(&self, code: u8) -> bool {
        match self.sender.try_send(code) {
            Ok(()) => true,
            Err(TrySendError::Full(code)) => {
                warn!("key queue full, dropping 0x{:02X}", code);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Cumulative counters of a sample clock
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClockStats {
    pub cycles: u64,
    pub samples: u64,
    /// Cycles run ahead of the emitted samples
    pub jitter: f64,
}

/// Runs the board in step with an audio device that pulls samples.
///
/// `jitter` holds how far the CPU has run ahead of the samples emitted so far. Each sample
/// charges one sample period against it and the CPU then runs until it is paid off, so the
/// lead stays between zero and one instruction.
pub struct SampleClock {
    board: Board,
    cycles_per_sample: f64,
    jitter: f64,
    dac_gain: f32,
    cvsd_gain: f32,
    keys: Receiver<u8>,
    keypad: Keypad,
    fault: Option<CpuError>,
    cycles: u64,
    samples: u64,
}

impl SampleClock {
    /// Clock `board` at the rates in `config`.
    ///
    /// # Errors
    /// Returns a `ConfigError` for a zero sample rate or an unusable CPU clock
    pub fn new(board: Board, config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let (sender, keys) = bounded(config.key_queue_capacity.max(1));
        Ok(Self {
            board,
            cycles_per_sample: config.cycles_per_sample(),
            jitter: 0.0,
            dac_gain: config.dac_gain,
            cvsd_gain: config.cvsd_gain,
            keys,
            keypad: Keypad { sender },
            fault: None,
            cycles: 0,
            samples: 0,
        })
    }

    /// Handle for another thread to press keys with
    pub fn keypad(&self) -> Keypad {
        self.keypad.clone()
    }

    /// Queue a key code from the owning thread
    pub fn press(&self, code: u8) -> bool {
        self.keypad.press(code)
    }

    /// Fill `buffer` with mono samples. After a CPU fault the remainder, and every later
    /// buffer, is silence.
    pub fn fill(&mut self, buffer: &mut [f32]) {
        let cycles_before = self.cycles;
        let samples_before = self.samples;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;

        for slot in buffer.iter_mut() {
            if self.fault.is_some() {
                *slot = 0.0;
                continue;
            }
            match self.next_sample() {
                Ok(sample) => {
                    min = min.min(sample);
                    max = max.max(sample);
                    *slot = sample;
                }
                Err(err) => {
                    error!("CPU halted\n{}", self.board.report(&err));
                    self.fault = Some(err);
                    *slot = 0.0;
                }
            }
        }

        let emitted = self.samples - samples_before;
        if emitted > 0 {
            debug!(
                "{}cyc, {}samp, jitter {:.4}, {:.3}..{:.3}",
                self.cycles - cycles_before,
                emitted,
                self.jitter,
                min,
                max
            );
        } else {
            debug!(
                "{}cyc, no samples emitted, jitter {:.4}",
                self.cycles - cycles_before,
                self.jitter
            );
        }
    }

    fn next_sample(&mut self) -> Result<f32, CpuError> {
        // one code per sample so the ROM sees every press
        if let Ok(code) = self.keys.try_recv() {
            debug!("driving key 0x{:02X} into port B", code);
            // the board's inputs are active low
            self.board.bus_mut().pia_mut().drive(Port::B, !code);
        }

        self.jitter -= self.cycles_per_sample;
        while self.jitter < 0.0 {
            match self.board.step() {
                Ok(cycles) => {
                    self.jitter += cycles as f64;
                    self.cycles += cycles as u64;
                }
                Err(err) => {
                    // no sample is emitted, so the period is not owed
                    self.jitter += self.cycles_per_sample;
                    return Err(err);
                }
            }
        }
        self.samples += 1;
        Ok(self.current_level())
    }

    /// Output level from the port A DAC and the CVSD decoder
    fn current_level(&self) -> f32 {
        let pia = self.board.bus().pia();
        let dac = pia.output(Port::A) as f32 / 256.0 - 0.5;
        self.dac_gain * dac + self.cvsd_gain * pia.cvsd().state()
    }

    /// The fault that stopped emission, if any
    pub fn fault(&self) -> Option<&CpuError> {
        self.fault.as_ref()
    }

    /// Clear a fault and reset the board. The counters restart from zero with the CPU.
    pub fn restart(&mut self) -> Result<(), CpuError> {
        self.fault = None;
        self.jitter = 0.0;
        self.cycles = 0;
        self.samples = 0;
        self.board.reset()
    }

    /// Counters since construction or the last `restart`
    pub fn stats(&self) -> ClockStats {
        ClockStats {
            cycles: self.cycles,
            samples: self.samples,
            jitter: self.jitter,
        }
    }

    /// CPU cycles charged per emitted sample
    pub fn cycles_per_sample(&self) -> f64 {
        self.cycles_per_sample
    }

    /// The clocked board
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access to the clocked board, for debuggers and tests
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;

    // BRA * at $F800
    fn idle_board() -> Board {
        let mut rom = vec![0u8; 0x800];
        rom[0] = 0x20;
        rom[1] = 0xFE;
        rom[0x7FE] = 0xF8;
        rom[0x7FF] = 0x00;
        let mut bus = Bus::new();
        bus.mount_ram(0x0000, 0x80).unwrap();
        bus.mount_pia(0x0400).unwrap();
        bus.mount_rom(0xF800, &rom).unwrap();
        Board::new(bus, &Config::default()).unwrap()
    }

    #[test]
    fn test_fill_runs_cpu_for_each_sample() {
        let config = Config {
            sample_rate: 8_950,
            ..Config::default()
        };
        let mut clock = SampleClock::new(idle_board(), &config).unwrap();
        let mut buffer = [1.0f32; 10];
        clock.fill(&mut buffer);

        // 100 cycles per sample, 4 per BRA
        let stats = clock.stats();
        assert_eq!(stats.samples, 10);
        assert_eq!(stats.cycles, 1000);
        assert_eq!(stats.jitter, 0.0);
        // port A idle: DAC sits at -0.5
        assert!(buffer.iter().all(|&s| s == -0.5));
    }

    #[test]
    fn test_keypress_reaches_port_b() {
        let mut clock = SampleClock::new(idle_board(), &Config::default()).unwrap();
        assert!(clock.press(0x0F));
        let mut buffer = [0.0f32; 1];
        clock.fill(&mut buffer);
        let pia = clock.board().bus().pia();
        assert!(pia.irq(Port::B));
        assert_eq!(pia.peek(2), 0x00);
        clock.board_mut().bus_mut().write_byte(0x0403, 0x04).unwrap();
        assert_eq!(clock.board().bus().pia().peek(2), 0xF0);
    }

    #[test]
    fn test_full_queue_drops_codes() {
        let config = Config {
            key_queue_capacity: 2,
            ..Config::default()
        };
        let clock = SampleClock::new(idle_board(), &config).unwrap();
        let keypad = clock.keypad();
        assert!(keypad.press(1));
        assert!(keypad.press(2));
        assert!(!keypad.press(3));
    }

    #[test]
    fn test_keypad_works_across_threads() {
        let clock = SampleClock::new(idle_board(), &Config::default()).unwrap();
        let keypad = clock.keypad();
        let handle = std::thread::spawn(move || keypad.press(0x21));
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_fault_silences_rest_of_buffer() {
        let mut rom = vec![0u8; 0x800];
        // NOP ; then illegal 0x00
        rom[0] = 0x01;
        rom[0x7FE] = 0xF8;
        let mut bus = Bus::new();
        bus.mount_ram(0x0000, 0x80).unwrap();
        bus.mount_pia(0x0400).unwrap();
        bus.mount_rom(0xF800, &rom).unwrap();
        let board = Board::new(bus, &Config::default()).unwrap();

        let mut clock = SampleClock::new(board, &Config::default()).unwrap();
        let mut buffer = [9.0f32; 16];
        clock.fill(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 0.0));
        let fault = clock.fault().unwrap();
        assert_eq!(fault.registers.pc, 0xF801);

        let mut buffer = [9.0f32; 4];
        clock.fill(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 0.0));
        assert_eq!(clock.stats().samples, 0);
    }

    #[test]
    fn test_restart_clears_fault() {
        let mut clock = SampleClock::new(idle_board(), &Config::default()).unwrap();
        clock.board_mut().cpu_mut().pc = 0x0000;
        let mut buffer = [0.0f32; 4];
        clock.fill(&mut buffer);
        assert!(clock.fault().is_some());

        clock.restart().unwrap();
        assert!(clock.fault().is_none());
        clock.fill(&mut buffer);
        assert!(clock.fault().is_none());
        assert_eq!(clock.board().cpu().pc, 0xF800);
    }

    #[test]
    fn test_zero_sample_rate_is_rejected() {
        let config = Config {
            sample_rate: 0,
            ..Config::default()
        };
        assert_eq!(
            SampleClock::new(idle_board(), &config).err(),
            Some(ConfigError::ZeroSampleRate)
        );

        let config = Config {
            cpu_clock_hz: f64::NAN,
            ..Config::default()
        };
        assert!(SampleClock::new(idle_board(), &config).is_err());
    }

    fn assert_consistent(clock: &SampleClock) {
        let stats = clock.stats();
        let lead = stats.cycles as f64 - stats.samples as f64 * clock.cycles_per_sample();
        assert!((stats.jitter - lead).abs() < 1e-9, "{} vs {}", stats.jitter, lead);
        assert_eq!(clock.board().cpu().total_cycles, stats.cycles);
    }

    #[test]
    fn test_stats_stay_consistent_across_fault_and_restart() {
        let mut clock = SampleClock::new(idle_board(), &Config::default()).unwrap();
        let mut buffer = [0.0f32; 8];
        clock.fill(&mut buffer);
        assert_consistent(&clock);

        // fault part way through a sample
        clock.board_mut().cpu_mut().pc = 0x0000;
        clock.fill(&mut buffer);
        assert!(clock.fault().is_some());
        assert_eq!(clock.stats().samples, 8);
        assert_consistent(&clock);

        clock.restart().unwrap();
        assert_eq!(clock.stats(), ClockStats::default());
        clock.fill(&mut buffer);
        assert_eq!(clock.stats().samples, 8);
        assert_consistent(&clock);
    }
}
