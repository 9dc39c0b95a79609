use sndboard::audio::SoundOutput;
use sndboard::{Board, Config, MemoryMap, SampleClock};
use std::io::BufRead;

/// Parse a key code typed as decimal, `$xx` or `0xXX`
fn parse_code(text: &str) -> Option<u8> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix('$') {
        u8::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let map = MemoryMap::firepower();
    let paths: Vec<String> = std::env::args().skip(1).collect();
    let slots: Vec<&str> = map.rom_slots().map(|(slot, _, _)| slot).collect();
    if paths.len() != slots.len() {
        return Err(format!("usage: sndboard <{}>", slots.join("> <")).into());
    }

    let images = paths
        .iter()
        .map(|path| std::fs::read(path).map_err(|e| format!("{}: {}", path, e)))
        .collect::<Result<Vec<_>, _>>()?;
    let images: Vec<&[u8]> = images.iter().map(|image| image.as_slice()).collect();

    let config = Config::default();
    let bus = map.build(&images, config.ram_init)?;
    let board = Board::new(bus, &config)?;
    let clock = SampleClock::new(board, &config)?;
    let keypad = clock.keypad();

    let sdl_context = sdl2::init()?;
    let sample_rate = i32::try_from(config.sample_rate)?;
    let mut output = SoundOutput::new(&sdl_context, clock, sample_rate)?;
    output.resume();

    println!("enter key codes (decimal, $xx or 0xXX), empty line to quit");
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        match parse_code(&line) {
            Some(code) => {
                if !keypad.press(code) {
                    eprintln!("dropped 0x{:02X}", code);
                }
            }
            None => eprintln!("not a key code: {}", line.trim()),
        }
    }

    output.pause();
    output.with_clock(|clock| {
        let stats = clock.stats();
        println!("{} cycles over {} samples", stats.cycles, stats.samples);
        if let Some(fault) = clock.fault() {
            println!("stopped by {}", fault);
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code("12"), Some(12));
        assert_eq!(parse_code(" $1F "), Some(0x1F));
        assert_eq!(parse_code("0x2a"), Some(0x2A));
        assert_eq!(parse_code("0XFF"), Some(0xFF));
        assert_eq!(parse_code("256"), None);
        assert_eq!(parse_code("$"), None);
        assert_eq!(parse_code("bell"), None);
    }
}
