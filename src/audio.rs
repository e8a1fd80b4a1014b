//! Sound cues for game events.
//!
//! The session only talks to [`AudioNotifier`]. [`ToneNotifier`] turns each
//! cue into a short sequence of synthesized [`Tone`]s and hands them to a
//! [`ToneSink`]; a sink failure is logged and dropped so playback can never
//! interrupt a move.

use log::{debug, warn};
use std::fmt;

use crate::engine::Tile;
use crate::storage::{Storage, DEFAULT_VOLUME};

/// Fire-and-forget sound interface. Implementations must not panic.
pub trait AudioNotifier {
    fn play_move(&mut self);
    fn play_merge(&mut self, value: Tile);
    fn play_win(&mut self);
    fn play_game_over(&mut self);
    fn play_button(&mut self);

    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
}

/// A single oscillator note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Hz.
    pub frequency: f32,
    /// Seconds.
    pub duration: f32,
    pub waveform: Waveform,
    /// Offset from the start of the cue, in seconds.
    pub delay: f32,
    /// Starting gain; decays over `duration`.
    pub gain: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Move,
    Merge(Tile),
    Win,
    GameOver,
    Button,
}

const WIN_NOTES: [f32; 4] = [523.25, 659.25, 783.99, 1046.50];
const GAME_OVER_NOTES: [f32; 4] = [440.0, 349.23, 293.66, 220.0];

impl Sound {
    /// Notes making up this cue at the given volume.
    pub fn tones(self, volume: f32) -> Vec<Tone> {
        let gain = volume.clamp(0.0, 1.0) * 0.3;
        let note = |frequency: f32, duration: f32, waveform: Waveform, delay: f32| Tone {
            frequency,
            duration,
            waveform,
            delay,
            gain,
        };
        match self {
            Sound::Move => vec![note(200.0, 0.05, Waveform::Sine, 0.0)],
            Sound::Merge(value) => {
                let freq = 300.0 + (value.max(1) as f32).log2() * 100.0;
                vec![note(freq, 0.15, Waveform::Triangle, 0.0)]
            }
            Sound::Win => WIN_NOTES
                .iter()
                .enumerate()
                .map(|(i, &f)| note(f, 0.3, Waveform::Sine, i as f32 * 0.1))
                .collect(),
            Sound::GameOver => GAME_OVER_NOTES
                .iter()
                .enumerate()
                .map(|(i, &f)| note(f, 0.4, Waveform::Sawtooth, i as f32 * 0.15))
                .collect(),
            Sound::Button => vec![note(800.0, 0.05, Waveform::Sine, 0.0)],
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("audio device unavailable")]
    Unavailable,
    #[error("playback failed: {0}")]
    Playback(String),
}

/// Output device for synthesized tones.
pub trait ToneSink {
    fn play(&mut self, tones: &[Tone]) -> Result<(), AudioError>;
}

/// Writes every cue to the debug log. Used by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ToneSink for LogSink {
    fn play(&mut self, tones: &[Tone]) -> Result<(), AudioError> {
        for t in tones {
            debug!(
                "tone {:.2}Hz {:?} {:.0}ms +{:.0}ms gain {:.3}",
                t.frequency,
                t.waveform,
                t.duration * 1000.0,
                t.delay * 1000.0,
                t.gain
            );
        }
        Ok(())
    }
}

/// Synthesizes cues onto a [`ToneSink`].
pub struct ToneNotifier<S> {
    sink: S,
    enabled: bool,
    volume: f32,
}

impl<S: ToneSink> ToneNotifier<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, enabled: true, volume: DEFAULT_VOLUME }
    }

    /// Pick up the persisted enabled flag and volume.
    pub fn from_storage(sink: S, storage: &Storage) -> Self {
        Self { sink, enabled: storage.sound_enabled(), volume: storage.volume() }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn play(&mut self, sound: Sound) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.sink.play(&sound.tones(self.volume)) {
            warn!("sound {sound:?} failed: {e}");
        }
    }
}

impl<S> fmt::Debug for ToneNotifier<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToneNotifier")
            .field("enabled", &self.enabled)
            .field("volume", &self.volume)
            .finish_non_exhaustive()
    }
}

impl<S: ToneSink> AudioNotifier for ToneNotifier<S> {
    fn play_move(&mut self) {
        self.play(Sound::Move);
    }

    fn play_merge(&mut self, value: Tile) {
        self.play(Sound::Merge(value));
    }

    fn play_win(&mut self) {
        self.play(Sound::Win);
    }

    fn play_game_over(&mut self) {
        self.play(Sound::GameOver);
    }

    fn play_button(&mut self) {
        self.play(Sound::Button);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { DEFAULT_VOLUME };
    }
}

/// Silent notifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioNotifier for NullAudio {
    fn play_move(&mut self) {}
    fn play_merge(&mut self, _value: Tile) {}
    fn play_win(&mut self) {}
    fn play_game_over(&mut self) {}
    fn play_button(&mut self) {}

    fn is_enabled(&self) -> bool {
        false
    }

    fn set_enabled(&mut self, _enabled: bool) {}

    fn volume(&self) -> f32 {
        0.0
    }

    fn set_volume(&mut self, _volume: f32) {}
}
