use chrono::{DateTime, FixedOffset, Local, Locale};
use pure_rust_locales::locale_match;
use tracing::debug;

/// Clock supplies the wall-clock time announcements are made from.
pub trait Clock: Send {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that always reads the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Format `time` the way a speaker of `lang` would write it: the locale's date representation
/// followed by its time representation when `tell_date` is set, otherwise just the time.
pub fn announcement(time: &DateTime<FixedOffset>, lang: &str, tell_date: bool) -> String {
    let locale = locale_for(lang);
    let format = if tell_date {
        format!("{}, {}", date_format(locale), time_format(locale))
    } else {
        time_format(locale)
    };
    time.format_localized(&format, locale).to_string()
}

fn date_format(locale: Locale) -> &'static str {
    locale_match!(locale => LC_TIME::D_FMT)
}

/// The locale's time representation. Locales whose time format is `%r` point to their 12-hour
/// format, which is spoken without a leading zero on the hour.
fn time_format(locale: Locale) -> String {
    let t_fmt: &str = locale_match!(locale => LC_TIME::T_FMT);
    let format = match t_fmt {
        "%r" => locale_match!(locale => LC_TIME::T_FMT_AMPM),
        _ => t_fmt,
    };
    match format {
        "" => "%H:%M:%S".to_string(),
        format => format.replace("%I", "%-I"),
    }
}

/// Resolve a BCP 47 tag to one of the locales chrono knows: `en-US` becomes `en_US`, a bare
/// language such as `de` is tried as `de_DE`, anything else falls back to POSIX.
pub fn locale_for(lang: &str) -> Locale {
    let mut subtags = lang.split('-');
    let language = subtags.next().unwrap_or_default().to_ascii_lowercase();
    let region = subtags
        .find(|subtag| subtag.len() == 2 && subtag.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|region| region.to_ascii_uppercase());

    let candidates = [
        region.map(|region| format!("{language}_{region}")),
        Some(format!("{language}_{}", language.to_ascii_uppercase())),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Ok(locale) = Locale::try_from(candidate.as_str()) {
            return locale;
        }
    }

    debug!(lang = %lang, "no locale data for language, using POSIX");
    Locale::POSIX
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn afternoon() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 15, 4, 5)
            .unwrap()
    }

    #[test]
    fn resolves_region_tags() {
        assert_eq!(locale_for("en-US"), Locale::en_US);
        assert_eq!(locale_for("fr-CA"), Locale::fr_CA);
        assert_eq!(locale_for("zh-Hant-TW"), Locale::zh_TW);
    }

    #[test]
    fn resolves_bare_languages() {
        assert_eq!(locale_for("de"), Locale::de_DE);
        assert_eq!(locale_for("FR"), Locale::fr_FR);
    }

    #[test]
    fn unknown_languages_fall_back_to_posix() {
        assert_eq!(locale_for("x-klingon"), Locale::POSIX);
        assert_eq!(locale_for("tlh"), Locale::POSIX);
    }

    #[test]
    fn time_only() {
        let text = announcement(&afternoon(), "de-DE", false);
        assert_eq!(text, "15:04:05");
    }

    #[test]
    fn twenty_four_hour_locales() {
        assert_eq!(announcement(&afternoon(), "en-GB", false), "15:04:05");
        assert_eq!(announcement(&afternoon(), "fr-FR", false), "15:04:05");

        let japanese = announcement(&afternoon(), "ja-JP", false);
        assert!(japanese.starts_with("15"), "{japanese}");
        assert!(!japanese.contains('午'), "{japanese}");
    }

    #[test]
    fn twelve_hour_locales() {
        assert_eq!(announcement(&afternoon(), "en-US", false), "3:04:05 PM");
    }

    #[test]
    fn date_and_time() {
        let text = announcement(&afternoon(), "en-US", true);
        assert!(text.starts_with("10/19/2026, "), "{text}");
        assert!(text.ends_with("3:04:05 PM"), "{text}");

        let time_only = announcement(&afternoon(), "en-US", false);
        assert!(!time_only.contains("2026"), "{time_only}");
    }

    #[test]
    fn fixed_clock_reads_its_instant() {
        assert_eq!(FixedClock(afternoon()).now(), afternoon());
    }
}
