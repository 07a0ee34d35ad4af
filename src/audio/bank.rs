//! Sound cue playback
//!
//! Maps simulation [`SoundCue`]s to decoded audio and plays them
//! fire-and-forget. Gameplay code never touches the device: it posts
//! events, and the host drains them into the bank once per frame.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, mixer::Mixer};
use rustc_hash::FxHashMap;

use crate::core::{Events, GameEvent, SoundCue};

/// Audio failure
#[derive(Debug, Clone)]
pub enum AudioError {
    /// No output device available
    NoDevice,
    /// File could not be read
    Io(String),
    /// Bytes could not be decoded as audio
    Decode(String),
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDevice => write!(f, "no audio output device available"),
            Self::Io(msg) => write!(f, "audio io error: {msg}"),
            Self::Decode(msg) => write!(f, "audio decode error: {msg}"),
        }
    }
}

impl std::error::Error for AudioError {}

/// Cue-keyed sound bank
pub struct CueBank {
    /// The output stream (must be kept alive)
    _stream: OutputStream,
    mixer: Mixer,
    cues: FxHashMap<SoundCue, Arc<[u8]>>,
    master_volume: f32,
}

impl CueBank {
    /// Open the default audio device
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::NoDevice`] when no output device exists;
    /// callers run silent in that case rather than failing.
    pub fn new() -> Result<Self, AudioError> {
        let stream = OutputStreamBuilder::from_default_device()
            .map_err(|_| AudioError::NoDevice)?
            .open_stream()
            .map_err(|_| AudioError::NoDevice)?;
        let mixer = stream.mixer().clone();

        Ok(Self {
            _stream: stream,
            mixer,
            cues: FxHashMap::default(),
            master_volume: 1.0,
        })
    }

    /// Load a cue's audio from a file.
    ///
    /// The bytes are decoded once up front so a bad file fails at load
    /// time, not mid-game.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded
    pub fn load(&mut self, cue: SoundCue, path: impl AsRef<Path>) -> Result<(), AudioError> {
        let bytes: Arc<[u8]> = fs::read(path.as_ref())
            .map_err(|e| AudioError::Io(e.to_string()))?
            .into();
        Decoder::new(Cursor::new(bytes.clone())).map_err(|e| AudioError::Decode(e.to_string()))?;
        self.cues.insert(cue, bytes);
        Ok(())
    }

    /// Set the master volume multiplier
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.max(0.0);
    }

    /// Play a cue fire-and-forget.
    ///
    /// Unloaded cues degrade silently; a missing sound is not an error.
    pub fn post(&self, cue: SoundCue) {
        let Some(bytes) = self.cues.get(&cue) else {
            log::debug!("sound cue {cue:?} not loaded, skipping");
            return;
        };
        match Decoder::new(Cursor::new(bytes.clone())) {
            Ok(source) => {
                let sink = Sink::connect_new(&self.mixer);
                sink.set_volume(self.master_volume);
                sink.append(source);
                sink.detach();
            }
            Err(e) => log::warn!("sound cue {cue:?} failed to decode: {e}"),
        }
    }

    /// Play every sound event in the processed queue
    pub fn drain(&self, events: &Events) {
        for event in events.iter() {
            if let GameEvent::Sound { cue, .. } = event {
                self.post(*cue);
            }
        }
    }
}
