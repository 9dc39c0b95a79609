use crate::error::ConfigError;
use crate::opcode::Variant;

/// E clock of a 6802 running from a 3.58 MHz crystal
pub const DEFAULT_CPU_CLOCK_HZ: f64 = 3_580_000.0 / 4.0;
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Contents of RAM at power-on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RamInit {
    #[default]
    Zero,
    /// Random bytes, like real static RAM after power-up
    Random,
}

/// Board and playback settings
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub cpu_clock_hz: f64,
    pub sample_rate: u32,
    pub variant: Variant,
    pub ram_init: RamInit,
    /// Weight of the port A DAC in the output
    pub dac_gain: f32,
    /// Weight of the CVSD decoder in the output
    pub cvsd_gain: f32,
    /// Key codes that may wait for the audio thread before new ones are dropped
    pub key_queue_capacity: usize,
    /// Register snapshots kept for fault reports
    pub lookback: usize,
}

impl Config {
    /// Reject settings that would stall the sample clock
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if !self.cpu_clock_hz.is_finite() || self.cpu_clock_hz <= 0.0 {
            return Err(ConfigError::CpuClock(self.cpu_clock_hz));
        }
        Ok(())
    }

    /// CPU cycles that elapse during one output sample
    pub fn cycles_per_sample(&self) -> f64 {
        self.cpu_clock_hz / self.sample_rate as f64
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cpu_clock_hz: DEFAULT_CPU_CLOCK_HZ,
            sample_rate: DEFAULT_SAMPLE_RATE,
            variant: Variant::M6800,
            ram_init: RamInit::Zero,
            dac_gain: 1.0,
            cvsd_gain: 2.0,
            key_queue_capacity: 16,
            lookback: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_clock() {
        let config = Config::default();
        assert_eq!(config.cpu_clock_hz, 895_000.0);
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.variant, Variant::M6800);
    }

    #[test]
    fn test_validate() {
        assert_eq!(Config::default().validate(), Ok(()));

        let config = Config {
            sample_rate: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSampleRate));

        for hz in [0.0, -895_000.0, f64::INFINITY] {
            let config = Config {
                cpu_clock_hz: hz,
                ..Config::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::CpuClock(hz)));
        }
        let config = Config {
            cpu_clock_hz: f64::NAN,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::CpuClock(_))));
    }

    #[test]
    fn test_cycles_per_sample() {
        let config = Config::default();
        let cps = config.cycles_per_sample();
        assert!((cps - 20.294_784).abs() < 1e-5);

        let config = Config {
            sample_rate: 8_950,
            ..Config::default()
        };
        assert_eq!(config.cycles_per_sample(), 100.0);
    }
}
