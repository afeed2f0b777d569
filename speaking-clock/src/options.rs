use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Time units in milliseconds, for building [Options::interval] values.
pub mod units {
    pub const SECOND: u64 = 1000;
    pub const MINUTE: u64 = SECOND * 60;
    pub const HOUR: u64 = MINUTE * 60;
    pub const DAY: u64 = HOUR * 24;
}

const FALLBACK_LANG: &str = "en-US";

/// Options configure an [crate::Announcer]. Start from [Options::default] and override the fields
/// you need with struct update syntax:
///
/// ```
/// use speaking_clock::Options;
///
/// let options = Options {
///     interval: 5000,
///     tell_date: true,
///     lang: "en-US".to_string(),
///     ..Options::default()
/// };
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Id or name of the backend voice. `None` uses the backend default.
    pub voice: Option<String>,
    /// Between 0 and 1.
    pub volume: f32,
    /// Between 0 and 2.
    pub pitch: f32,
    /// Between 0.1 and 10.
    pub rate: f32,
    /// BCP 47 language tag. Defaults to the language of the host.
    pub lang: String,
    /// Milliseconds between announcements.
    pub interval: u64,
    /// Announce the date along with the time.
    pub tell_date: bool,
    /// Start the schedule as soon as the announcer is built.
    pub autostart: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            voice: None,
            volume: 1.,
            pitch: 1.,
            rate: 1.,
            lang: host_lang(),
            interval: units::MINUTE,
            tell_date: false,
            autostart: false,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Volume must be between 0 and 1, got {0}")]
    Volume(f32),
    #[error("Pitch must be between 0 and 2, got {0}")]
    Pitch(f32),
    #[error("Rate must be between 0.1 and 10, got {0}")]
    Rate(f32),
    #[error("Interval must be a positive number of milliseconds")]
    Interval,
    #[error("Malformed language tag: {0:?}")]
    Lang(String),
}

impl Options {
    /// Check every field against its allowed range. Called by the announcer on construction and
    /// whenever the options are replaced.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_volume(self.volume)?;
        validate_pitch(self.pitch)?;
        validate_rate(self.rate)?;
        validate_interval(self.interval)?;
        validate_lang(&self.lang)?;
        Ok(())
    }
}

pub fn validate_volume(volume: f32) -> Result<(), ConfigurationError> {
    if (0. ..=1.).contains(&volume) {
        Ok(())
    } else {
        Err(ConfigurationError::Volume(volume))
    }
}

pub fn validate_pitch(pitch: f32) -> Result<(), ConfigurationError> {
    if (0. ..=2.).contains(&pitch) {
        Ok(())
    } else {
        Err(ConfigurationError::Pitch(pitch))
    }
}

pub fn validate_rate(rate: f32) -> Result<(), ConfigurationError> {
    if (0.1..=10.).contains(&rate) {
        Ok(())
    } else {
        Err(ConfigurationError::Rate(rate))
    }
}

pub fn validate_interval(interval: u64) -> Result<(), ConfigurationError> {
    if interval == 0 {
        return Err(ConfigurationError::Interval);
    }
    Ok(())
}

/// Well-formedness check for BCP 47 tags: a 2 to 8 letter primary language (or a private use
/// `x-` tag) followed by subtags of 1 to 8 ASCII alphanumerics.
pub fn validate_lang(tag: &str) -> Result<(), ConfigurationError> {
    let malformed = || ConfigurationError::Lang(tag.to_string());

    let mut subtags = tag.split('-');
    let primary = subtags.next().ok_or_else(malformed)?;
    let private_use = primary.eq_ignore_ascii_case("x");
    if !private_use
        && !((2..=8).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic()))
    {
        return Err(malformed());
    }

    let mut count = 0;
    for subtag in subtags {
        if !(1..=8).contains(&subtag.len()) || !subtag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed());
        }
        count += 1;
    }
    if private_use && count == 0 {
        return Err(malformed());
    }
    Ok(())
}

fn host_lang() -> String {
    sys_locale::get_locale()
        // POSIX style locales like "en_US.UTF-8" show up on some hosts
        .map(|locale| {
            let locale = locale.split('.').next().unwrap_or_default();
            locale.replace('_', "-")
        })
        .filter(|locale| validate_lang(locale).is_ok())
        .unwrap_or_else(|| FALLBACK_LANG.to_string())
}
