/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// Effects are plain values (`Sfx`): a sine tone or a noise burst with a
/// duration. The stock effects are rendered into in-memory WAV buffers at
/// init time; playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

use babagrid::sim::event::GameEvent;

pub const SAMPLE_RATE: u32 = 22050;

/// Peak amplitude of generated samples before the volume gain.
const AMPLITUDE: f32 = 0.3;

/// Linear fade-out length at the end of every tone, in samples.
const FADE_SAMPLES: usize = 441;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Sfx {
    Tone { freq_hz: f32, duration_ms: u32 },
    Noise { duration_ms: u32 },
}

impl Sfx {
    pub const MOVE: Sfx = Sfx::Tone { freq_hz: 440.0, duration_ms: 200 };
    pub const PUSH: Sfx = Sfx::Tone { freq_hz: 220.0, duration_ms: 150 };
    pub const WIN: Sfx = Sfx::Tone { freq_hz: 880.0, duration_ms: 300 };
    pub const DEATH: Sfx = Sfx::Noise { duration_ms: 400 };

    pub const STOCK: [Sfx; 4] = [Sfx::MOVE, Sfx::PUSH, Sfx::WIN, Sfx::DEATH];

    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::Moved => Some(Sfx::MOVE),
            GameEvent::Pushed | GameEvent::Absorbed { .. } => Some(Sfx::PUSH),
            GameEvent::Won => Some(Sfx::WIN),
            GameEvent::Died => Some(Sfx::DEATH),
            GameEvent::RulesChanged | GameEvent::LevelLoaded { .. } => None,
        }
    }

    /// The single effect for one update's events: win, then death, then
    /// push, then plain movement.
    pub fn for_events(events: &[GameEvent]) -> Option<Sfx> {
        const PRIORITY: [Sfx; 4] = [Sfx::MOVE, Sfx::PUSH, Sfx::DEATH, Sfx::WIN];
        let rank = |s: &Sfx| PRIORITY.iter().position(|p| p == s).unwrap_or(0);
        events
            .iter()
            .filter_map(Sfx::for_event)
            .max_by_key(rank)
    }

    pub fn duration_ms(self) -> u32 {
        match self {
            Sfx::Tone { duration_ms, .. } | Sfx::Noise { duration_ms } => duration_ms,
        }
    }

    pub fn sample_count(self) -> usize {
        (SAMPLE_RATE as u64 * self.duration_ms() as u64 / 1000) as usize
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples in -1.0..=1.0
    // ════════════════════════════════════════════════════════════

    pub fn samples(self) -> Vec<f32> {
        let n = self.sample_count();
        match self {
            Sfx::Tone { freq_hz, .. } => (0..n)
                .map(|i| {
                    let t = i as f32 / SAMPLE_RATE as f32;
                    let env = ((n - i) as f32 / FADE_SAMPLES as f32).min(1.0);
                    (t * freq_hz * 2.0 * std::f32::consts::PI).sin() * env * AMPLITUDE
                })
                .collect(),
            Sfx::Noise { .. } => {
                let mut rng: u32 = 12345;
                (0..n)
                    .map(|i| {
                        // Simple LCG noise with a linear decay
                        rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                        let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                        let env = 1.0 - i as f32 / n as f32;
                        noise * env * AMPLITUDE
                    })
                    .collect()
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  WAV encoder: wraps f32 samples into a valid WAV buffer
// ════════════════════════════════════════════════════════════

pub fn make_wav(samples: &[f32]) -> Vec<u8> {
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
    let block_align = num_channels * bits_per_sample / 8;
    let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());

    for &s in samples {
        let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        buf.extend_from_slice(&val.to_le_bytes());
    }

    buf
}

/// Stock effects paired with their rendered WAV bytes.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn stock_wavs() -> Vec<(Sfx, Vec<u8>)> {
    Sfx::STOCK.iter().map(|&sfx| (sfx, make_wav(&sfx.samples()))).collect()
}

/// WAV bytes for `sfx`: a copy of the cached buffer, or rendered on demand.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn wav_for(cache: &[(Sfx, Vec<u8>)], sfx: Sfx) -> Vec<u8> {
    match cache.iter().find(|(s, _)| *s == sfx) {
        Some((_, buf)) => buf.clone(),
        None => make_wav(&sfx.samples()),
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;

    use log::{info, warn};
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{stock_wavs, wav_for, Sfx};

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        /// Pre-rendered WAV buffers for the stock effects.
        cache: Vec<(Sfx, Vec<u8>)>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("[Sound] no output device: {e}");
                    return None;
                }
            };

            let cache = stock_wavs();
            info!("[Sound] audio output ready");

            Some(SoundEngine { _stream: stream, handle, cache })
        }

        /// Play `sfx` at linear `gain` (0.0 = silent).
        pub fn play(&self, sfx: Sfx, gain: f32) {
            if gain <= 0.0 { return; }
            let buf = wav_for(&self.cache, sfx);
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(Cursor::new(buf)) {
                    sink.set_volume(gain);
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx, _gain: f32) {}
}
