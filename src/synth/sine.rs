//! Default audible backend: additive sine voices over cpal.
//!
//! The session side pushes `Begin` commands into an rtrb ring buffer; the
//! audio callback pops them and owns the voices from then on. Release
//! shaping never crosses the ring: each voice carries an
//! `Arc<VoiceControl>` of atomics that the [`SineHandle`] writes and the
//! callback reads, so `cancel_scheduled` / `ramp_level_to` are wait-free
//! on both sides.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::config::EngineConfig;
use crate::synth::{Clock, ToneGenerator, ToneHandle};

const COMMAND_CAPACITY: usize = 256;

/// Shared control block for one sounding voice.
///
/// `ramp_at` / `ramp_target` hold the pending linear ramp as raw bits;
/// `ramp_pending` is the publish flag and is stored last.
pub struct VoiceControl {
    ramp_target: AtomicU32,
    ramp_at: AtomicU64,
    ramp_pending: AtomicBool,
}

impl VoiceControl {
    fn new() -> Self {
        Self {
            ramp_target: AtomicU32::new(0),
            ramp_at: AtomicU64::new(0),
            ramp_pending: AtomicBool::new(false),
        }
    }

    fn pending_ramp(&self) -> Option<(f32, f64)> {
        if !self.ramp_pending.load(Ordering::Acquire) {
            return None;
        }
        let target = f32::from_bits(self.ramp_target.load(Ordering::Relaxed));
        let at = f64::from_bits(self.ramp_at.load(Ordering::Relaxed));
        Some((target, at))
    }
}

/// Handle returned by [`SineSynth::begin_tone`].
pub struct SineHandle {
    control: Arc<VoiceControl>,
}

impl ToneHandle for SineHandle {
    fn cancel_scheduled(&mut self, _at: f64) {
        self.control.ramp_pending.store(false, Ordering::Release);
    }

    fn ramp_level_to(&mut self, level: f32, at: f64) {
        self.control.ramp_target.store(level.to_bits(), Ordering::Relaxed);
        self.control.ramp_at.store(at.to_bits(), Ordering::Relaxed);
        self.control.ramp_pending.store(true, Ordering::Release);
    }
}

struct Begin {
    control: Arc<VoiceControl>,
    program: u8,
    note: u8,
    velocity: u8,
    attack: f64,
}

/// Errors from bringing up the audio device.
#[derive(Debug)]
pub enum SynthError {
    NoOutputDevice,
    OutputConfig(cpal::DefaultStreamConfigError),
    BuildStream(cpal::BuildStreamError),
    PlayStream(cpal::PlayStreamError),
}

impl std::fmt::Display for SynthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthError::NoOutputDevice => write!(f, "no default audio output device"),
            SynthError::OutputConfig(e) => write!(f, "failed to fetch output config: {}", e),
            SynthError::BuildStream(e) => write!(f, "failed to build output stream: {}", e),
            SynthError::PlayStream(e) => write!(f, "failed to start output stream: {}", e),
        }
    }
}

impl std::error::Error for SynthError {}

/// Clock shared between the session and the audio callback.
#[derive(Clone)]
pub struct SynthClock {
    origin: Arc<Instant>,
}

impl Clock for SynthClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// cpal-backed tone generator.
pub struct SineSynth {
    tx: Producer<Begin>,
    clock: SynthClock,
    // Dropping the stream stops audio; hold it for the synth's lifetime.
    _stream: cpal::Stream,
}

impl SineSynth {
    /// Open the default output device and start rendering.
    pub fn start(config: &EngineConfig) -> Result<Self, SynthError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(SynthError::NoOutputDevice)?;
        let stream_config = device
            .default_output_config()
            .map_err(SynthError::OutputConfig)?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;
        let master_level = config.master_level;

        let (tx, rx) = RingBuffer::<Begin>::new(COMMAND_CAPACITY);
        let clock = SynthClock { origin: Arc::new(Instant::now()) };

        let mut renderer = Renderer {
            rx,
            voices: Vec::new(),
            sample_rate,
            clock: clock.clone(),
        };

        let stream = device
            .build_output_stream(
                &stream_config.into(),
                move |data: &mut [f32], _| {
                    renderer.render(data, channels, master_level);
                },
                |err| eprintln!("Audio error: {}", err),
                None,
            )
            .map_err(SynthError::BuildStream)?;
        stream.play().map_err(SynthError::PlayStream)?;

        Ok(Self { tx, clock, _stream: stream })
    }

    /// The audio clock tones are scheduled against.
    pub fn clock(&self) -> SynthClock {
        self.clock.clone()
    }
}

impl ToneGenerator for SineSynth {
    type Handle = SineHandle;

    fn begin_tone(
        &mut self,
        program: u8,
        _start: f64,
        note: u8,
        velocity: u8,
        attack: f64,
    ) -> Self::Handle {
        let control = Arc::new(VoiceControl::new());
        // A full ring means the callback is hopelessly behind; the tone
        // is dropped, matching fire-and-forget semantics.
        let _ = self.tx.push(Begin {
            control: Arc::clone(&control),
            program,
            note,
            velocity,
            attack,
        });
        SineHandle { control }
    }
}

/// Relative partial amplitudes per program family. Bowed strings get a
/// brighter, saw-leaning recipe than the piano.
fn partials(program: u8) -> [f32; 3] {
    match program {
        40..=47 => [1.0, 0.5, 0.33],
        _ => [1.0, 0.25, 0.1],
    }
}

fn note_frequency(note: u8) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}

struct AudioVoice {
    control: Arc<VoiceControl>,
    phase: f32,
    frequency: f32,
    partials: [f32; 3],
    level: f32,
    peak: f32,
    attack_step: f32,
    releasing: bool,
}

struct Renderer {
    rx: Consumer<Begin>,
    voices: Vec<AudioVoice>,
    sample_rate: f32,
    clock: SynthClock,
}

impl Renderer {
    fn render(&mut self, data: &mut [f32], channels: usize, master_level: f32) {
        while let Ok(begin) = self.rx.pop() {
            let peak = begin.velocity as f32 / 127.0;
            let attack_samples = (begin.attack as f32 * self.sample_rate).max(1.0);
            self.voices.push(AudioVoice {
                control: begin.control,
                phase: 0.0,
                frequency: note_frequency(begin.note),
                partials: partials(begin.program),
                level: 0.0,
                peak,
                attack_step: peak / attack_samples,
                releasing: false,
            });
        }

        let now = self.clock.now();
        let frames = data.len() / channels;
        data.fill(0.0);

        for voice in &mut self.voices {
            let ramp = voice.control.pending_ramp();
            let ramp_step = ramp.map(|(target, at)| {
                let remaining = ((at - now) * self.sample_rate as f64).max(1.0) as f32;
                (target - voice.level) / remaining
            });
            if ramp.is_some() {
                voice.releasing = true;
            }

            for frame in 0..frames {
                match ramp_step {
                    Some(step) => {
                        let target = ramp.map(|(t, _)| t).unwrap_or(0.0);
                        voice.level += step;
                        if (step <= 0.0 && voice.level <= target)
                            || (step > 0.0 && voice.level >= target)
                        {
                            voice.level = target;
                        }
                    }
                    None => {
                        if !voice.releasing && voice.level < voice.peak {
                            voice.level = (voice.level + voice.attack_step).min(voice.peak);
                        }
                    }
                }

                let mut sample = 0.0;
                for (i, &amp) in voice.partials.iter().enumerate() {
                    let harmonic = (i + 1) as f32;
                    sample += amp * (voice.phase * harmonic * std::f32::consts::TAU).sin();
                }
                voice.phase += voice.frequency / self.sample_rate;
                if voice.phase >= 1.0 {
                    voice.phase -= 1.0;
                }

                let out = sample * voice.level * master_level * 0.25;
                for ch in 0..channels {
                    data[frame * channels + ch] += out;
                }
            }
        }

        // Voices that finished their release are done for good.
        self.voices.retain(|v| !(v.releasing && v.level <= 0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a440_reference_pitch() {
        assert!((note_frequency(69) - 440.0).abs() < 1e-3);
        assert!((note_frequency(81) - 880.0).abs() < 1e-2);
    }

    #[test]
    fn handle_publishes_ramp_to_control() {
        let control = Arc::new(VoiceControl::new());
        let mut handle = SineHandle { control: Arc::clone(&control) };

        assert_eq!(control.pending_ramp(), None);
        handle.ramp_level_to(0.0, 1.5);
        assert_eq!(control.pending_ramp(), Some((0.0, 1.5)));

        handle.cancel_scheduled(1.0);
        assert_eq!(control.pending_ramp(), None);
    }

    #[test]
    fn string_programs_are_brighter() {
        assert!(partials(40)[1] > partials(0)[1]);
        assert_eq!(partials(41), partials(42));
    }
}
