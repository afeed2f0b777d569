use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use thiserror::Error;
use tracing::{debug, info, warn};

use clock::{announcement, Clock, SystemClock};
use options::{validate_interval, validate_lang, validate_pitch, validate_rate, validate_volume};
use speech::{Speaker, SpeechError, UnavailableBackendError, Utterance};
use timer::{ScheduleHandle, ThreadTimer, Timer};

pub mod clock;
pub mod options;
pub mod speech;
pub mod timer;

pub use options::{units, ConfigurationError, Options};
pub use speech::TtsSpeaker;

#[derive(Error, Debug)]
pub enum AnnouncerError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Backend unavailable: {0}")]
    Unavailable(#[from] UnavailableBackendError),
    #[error("Failed to speak: {0}")]
    Speech(#[from] SpeechError),
}

type TickErrorHook = Box<dyn Fn(&SpeechError) + Send>;

/// State shared between the announcer and the ticks of its schedule.
struct Shared {
    options: Options,
    utterance: Utterance,
    muted: bool,
    speaker: Box<dyn Speaker>,
    clock: Box<dyn Clock>,
    on_tick_error: Option<TickErrorHook>,
}

impl Shared {
    fn tell_time(&mut self) -> Result<(), SpeechError> {
        let now = self.clock.now();
        self.utterance.text = announcement(&now, &self.options.lang, self.options.tell_date);
        debug!(utterance = ?self.utterance, "announcing");
        self.speaker.speak(&self.utterance)
    }

    fn rebuild_utterance(&mut self) {
        let text = std::mem::take(&mut self.utterance.text);
        self.utterance = Utterance {
            text,
            ..Utterance::new(&self.options)
        };
        if self.muted {
            self.utterance.volume = 0.;
        }
    }
}

/// Announcer speaks the current time at a fixed interval. It can be built with
/// [Announcer::build], which uses the system clock and a thread per schedule, or with
/// [Announcer::with_parts] to supply every collaborator.
///
/// The schedule only runs between [Announcer::start] and [Announcer::stop] (or when
/// [Options::autostart] is set). At most one schedule is active at a time, and dropping the
/// announcer stops it.
pub struct Announcer {
    shared: Arc<Mutex<Shared>>,
    timer: Box<dyn Timer>,
    schedule: Option<Box<dyn ScheduleHandle>>,
}

impl Announcer {
    pub fn build(
        options: Options,
        speaker: impl Speaker + 'static,
    ) -> Result<Self, AnnouncerError> {
        Self::with_parts(options, speaker, SystemClock, ThreadTimer)
    }

    pub fn with_parts(
        options: Options,
        speaker: impl Speaker + 'static,
        clock: impl Clock + 'static,
        timer: impl Timer + 'static,
    ) -> Result<Self, AnnouncerError> {
        options.validate()?;

        let utterance = Utterance::new(&options);
        let autostart = options.autostart;
        let mut announcer = Self {
            shared: Arc::new(Mutex::new(Shared {
                options,
                utterance,
                muted: false,
                speaker: Box::new(speaker),
                clock: Box::new(clock),
                on_tick_error: None,
            })),
            timer: Box::new(timer),
            schedule: None,
        };

        if autostart {
            announcer.start()?;
        }
        Ok(announcer)
    }

    /// A copy of the current options.
    pub fn options(&self) -> Options {
        self.lock().options.clone()
    }

    /// Announce the current time right away, independently of the schedule.
    pub fn tell_time(&self) -> Result<(), AnnouncerError> {
        self.lock().tell_time()?;
        Ok(())
    }

    /// Silence announcements without touching the configured volume.
    pub fn mute(&self) {
        let mut shared = self.lock();
        shared.muted = true;
        shared.utterance.volume = 0.;
    }

    /// Restore the configured volume.
    pub fn unmute(&self) {
        let mut shared = self.lock();
        shared.muted = false;
        shared.utterance.volume = shared.options.volume;
    }

    pub fn is_muted(&self) -> bool {
        self.lock().muted
    }

    /// Override the volume of upcoming announcements. The configured volume is kept, so
    /// [Announcer::unmute] goes back to it.
    pub fn set_volume(&self, volume: f32) -> Result<(), ConfigurationError> {
        validate_volume(volume)?;
        let mut shared = self.lock();
        shared.muted = false;
        shared.utterance.volume = volume;
        Ok(())
    }

    /// Change the time between announcements, in milliseconds, and restart the schedule so the
    /// next announcement comes one new interval from now.
    pub fn set_interval(&mut self, interval: u64) -> Result<(), AnnouncerError> {
        validate_interval(interval)?;
        self.lock().options.interval = interval;
        self.start()
    }

    pub fn set_pitch(&self, pitch: f32) -> Result<(), ConfigurationError> {
        validate_pitch(pitch)?;
        self.update(|options| options.pitch = pitch);
        Ok(())
    }

    pub fn set_rate(&self, rate: f32) -> Result<(), ConfigurationError> {
        validate_rate(rate)?;
        self.update(|options| options.rate = rate);
        Ok(())
    }

    pub fn set_lang(&self, lang: impl Into<String>) -> Result<(), ConfigurationError> {
        let lang = lang.into();
        validate_lang(&lang)?;
        self.update(|options| options.lang = lang);
        Ok(())
    }

    pub fn set_voice(&self, voice: Option<String>) {
        self.update(|options| options.voice = voice);
    }

    pub fn set_tell_date(&self, tell_date: bool) {
        self.lock().options.tell_date = tell_date;
    }

    /// Replace every option at once. A running schedule is restarted if the interval changed.
    pub fn set_options(&mut self, options: Options) -> Result<(), AnnouncerError> {
        options.validate()?;
        let interval_changed = {
            let mut shared = self.lock();
            let interval_changed = shared.options.interval != options.interval;
            shared.options = options;
            shared.rebuild_utterance();
            interval_changed
        };
        if interval_changed && self.is_running() {
            self.start()?;
        }
        Ok(())
    }

    /// Install a callback for announcements of the schedule that fail. Failures are logged
    /// either way and never stop the schedule.
    pub fn on_tick_error(&self, hook: impl Fn(&SpeechError) + Send + 'static) {
        self.lock().on_tick_error = Some(Box::new(hook));
    }

    /// (Re)start the schedule. Any running schedule is cancelled first.
    pub fn start(&mut self) -> Result<(), AnnouncerError> {
        self.stop();

        let interval = self.lock().options.interval;
        let shared = Arc::clone(&self.shared);
        let handle = self.timer.schedule(
            Duration::from_millis(interval),
            Box::new(move || {
                let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(e) = shared.tell_time() {
                    warn!(error = %e, "scheduled announcement failed");
                    if let Some(hook) = &shared.on_tick_error {
                        hook(&e);
                    }
                }
            }),
        )?;
        self.schedule = Some(handle);

        info!(interval_ms = interval, "announcements started");
        Ok(())
    }

    /// Cancel the schedule. Does nothing if it isn't running.
    pub fn stop(&mut self) {
        if let Some(mut schedule) = self.schedule.take() {
            schedule.cancel();
            info!("announcements stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.schedule.is_some()
    }

    fn update(&self, apply: impl FnOnce(&mut Options)) {
        let mut shared = self.lock();
        apply(&mut shared.options);
        shared.rebuild_utterance();
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Announcer {
    fn drop(&mut self) {
        self.stop();
    }
}
