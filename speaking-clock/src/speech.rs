use thiserror::Error;
use tts::{Features, Tts};
use tracing::debug;

use crate::options::Options;

pub use tts::Error as TtsError;

/// Utterance is the descriptor handed to a [Speaker] for every announcement. It is built once
/// from [Options] and reused, only the text and the live volume change between announcements.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<String>,
    pub volume: f32,
    pub pitch: f32,
    pub rate: f32,
    pub lang: String,
}

impl Utterance {
    pub fn new(options: &Options) -> Self {
        Self {
            text: String::new(),
            voice: options.voice.clone(),
            volume: options.volume,
            pitch: options.pitch,
            rate: options.rate,
            lang: options.lang.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Speech backend failed")]
    Backend(#[from] TtsError),
    #[error("Speech backend rejected the utterance: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum UnavailableBackendError {
    #[error("No speech backend available")]
    Speech(#[source] TtsError),
    #[error("Failed to start the timer")]
    Timer(#[source] std::io::Error),
}

/// Speaker is the speech output service. Implementations render the utterance asynchronously;
/// whether a new utterance interrupts or queues behind the previous one is up to them.
pub trait Speaker: Send {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), SpeechError>;
}

impl<S: Speaker + ?Sized> Speaker for Box<S> {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), SpeechError> {
        (**self).speak(utterance)
    }
}

/// TtsSpeaker renders utterances with the platform's speech backend. Volume, pitch and rate are
/// given in the normalized ranges of [Options] and mapped onto the backend's own ranges.
/// Parameters the backend doesn't support are skipped.
#[derive(Clone)]
pub struct TtsSpeaker {
    tts: Tts,
    features: Features,
    interrupt: bool,
    voice: Option<String>,
}

impl TtsSpeaker {
    /// Connect to the default backend of the platform. Fails if none is available.
    pub fn new() -> Result<Self, UnavailableBackendError> {
        let tts = Tts::default().map_err(UnavailableBackendError::Speech)?;
        Ok(Self::from_tts(tts))
    }

    pub fn from_tts(tts: Tts) -> Self {
        let features = tts.supported_features();
        Self {
            tts,
            features,
            interrupt: true,
            voice: None,
        }
    }

    /// Whether a new utterance cuts off the one currently being spoken. Defaults to true.
    pub fn with_interrupt(mut self, interrupt: bool) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Block until the backend has nothing left to say.
    pub fn finish_speaking(&self) -> Result<(), TtsError> {
        if !self.features.is_speaking {
            return Ok(());
        }
        while self.tts.is_speaking()? {
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        Ok(())
    }

    fn apply(&mut self, utterance: &Utterance) -> Result<(), TtsError> {
        if self.features.volume {
            let volume = scale(
                utterance.volume,
                (0., 1.),
                (self.tts.min_volume(), self.tts.max_volume()),
            );
            self.tts.set_volume(volume)?;
        }
        if self.features.pitch {
            let pitch = scale_around_normal(
                utterance.pitch,
                (0., 1., 2.),
                (
                    self.tts.min_pitch(),
                    self.tts.normal_pitch(),
                    self.tts.max_pitch(),
                ),
            );
            self.tts.set_pitch(pitch)?;
        }
        if self.features.rate {
            let rate = scale_around_normal(
                utterance.rate,
                (0.1, 1., 10.),
                (
                    self.tts.min_rate(),
                    self.tts.normal_rate(),
                    self.tts.max_rate(),
                ),
            );
            self.tts.set_rate(rate)?;
        }
        if self.features.voice {
            self.apply_voice(utterance)?;
        }
        Ok(())
    }

    fn apply_voice(&mut self, utterance: &Utterance) -> Result<(), TtsError> {
        let wanted = utterance
            .voice
            .clone()
            .unwrap_or_else(|| format!("lang:{}", utterance.lang));
        if self.voice.as_deref() == Some(wanted.as_str()) {
            return Ok(());
        }

        let voices = self.tts.voices()?;
        let voice = match &utterance.voice {
            Some(voice) => voices
                .iter()
                .find(|v| v.id() == *voice || v.name() == *voice),
            None => voices
                .iter()
                .find(|v| v.language().as_str().eq_ignore_ascii_case(&utterance.lang)),
        };
        match voice {
            Some(voice) => {
                debug!(voice = %voice.name(), "selected voice");
                self.tts.set_voice(voice)?;
            }
            None => debug!(wanted = %wanted, "no matching voice, keeping backend default"),
        }
        self.voice = Some(wanted);
        Ok(())
    }
}

impl Speaker for TtsSpeaker {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), SpeechError> {
        self.apply(utterance)?;
        self.tts
            .speak(utterance.text.as_str(), self.interrupt)
            .map(|_| ())?;
        Ok(())
    }
}

fn scale(value: f32, (from_min, from_max): (f32, f32), (to_min, to_max): (f32, f32)) -> f32 {
    to_min + (value - from_min) / (from_max - from_min) * (to_max - to_min)
}

/// Like [scale], but maps the normal point of the input range onto the normal point of the
/// output range, scaling each side separately.
fn scale_around_normal(value: f32, from: (f32, f32, f32), to: (f32, f32, f32)) -> f32 {
    if value <= from.1 {
        scale(value, (from.0, from.1), (to.0, to.1))
    } else {
        scale(value, (from.1, from.2), (to.1, to.2))
    }
}
