use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, FixedOffset, TimeZone};
use speaking_clock::{
    clock::{announcement, Clock},
    speech::{Speaker, SpeechError, Utterance},
    timer::ManualTimer,
    units, Announcer, Options,
};

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Utterance>>>);

impl Speaker for Recorder {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), SpeechError> {
        self.0.lock().unwrap().push(utterance.clone());
        Ok(())
    }
}

/// Reads the virtual time of a [ManualTimer], so announcements carry the instant they fire at.
struct TimerClock {
    epoch: DateTime<FixedOffset>,
    timer: ManualTimer,
}

impl Clock for TimerClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.epoch + chrono::Duration::from_std(self.timer.elapsed()).unwrap()
    }
}

fn epoch() -> DateTime<FixedOffset> {
    FixedOffset::west_opt(5 * 3600)
        .unwrap()
        .with_ymd_and_hms(2026, 10, 19, 8, 59, 57)
        .unwrap()
}

fn setup(options: Options) -> (Announcer, Recorder, ManualTimer) {
    let recorder = Recorder::default();
    let timer = ManualTimer::new();
    let clock = TimerClock {
        epoch: epoch(),
        timer: timer.clone(),
    };
    let announcer =
        Announcer::with_parts(options, recorder.clone(), clock, timer.clone()).unwrap();
    (announcer, recorder, timer)
}

#[test]
fn announces_date_and_time_after_one_interval() {
    let (mut announcer, recorder, timer) = setup(Options {
        interval: 5 * units::SECOND,
        tell_date: true,
        lang: "en-US".to_string(),
        ..Options::default()
    });
    announcer.start().unwrap();

    timer.advance(Duration::from_millis(4999));
    assert!(recorder.0.lock().unwrap().is_empty());

    timer.advance(Duration::from_millis(1));
    let spoken = recorder.0.lock().unwrap().clone();
    assert_eq!(spoken.len(), 1);

    let fired_at = epoch() + chrono::Duration::milliseconds(5000);
    assert_eq!(spoken[0].text, announcement(&fired_at, "en-US", true));
    assert!(spoken[0].text.starts_with("10/19/2026, "), "{}", spoken[0].text);
    assert!(spoken[0].text.ends_with("9:00:02 AM"), "{}", spoken[0].text);
}

#[test]
fn default_options_tell_time_once() {
    let (announcer, recorder, timer) = setup(Options::default());
    announcer.tell_time().unwrap();

    assert_eq!(recorder.0.lock().unwrap().len(), 1);
    assert!(!announcer.is_running());
    assert_eq!(timer.active_schedules(), 0);

    timer.advance(Duration::from_millis(units::HOUR));
    assert_eq!(recorder.0.lock().unwrap().len(), 1);
}

#[test]
fn lifecycle() {
    let (mut announcer, recorder, timer) = setup(Options {
        interval: units::MINUTE,
        lang: "de-DE".to_string(),
        ..Options::default()
    });
    let count = || recorder.0.lock().unwrap().len();

    announcer.start().unwrap();
    announcer.start().unwrap();
    timer.advance(Duration::from_millis(2 * units::MINUTE));
    assert_eq!(count(), 2);

    announcer.set_interval(units::SECOND).unwrap();
    timer.advance(Duration::from_millis(10 * units::SECOND));
    assert_eq!(count(), 12);

    announcer.stop();
    timer.advance(Duration::from_millis(units::DAY));
    assert_eq!(count(), 12);
    assert_eq!(timer.active_schedules(), 0);

    let last = recorder.0.lock().unwrap().last().cloned().unwrap();
    let fired_at = epoch() + chrono::Duration::seconds(130);
    assert_eq!(last.text, announcement(&fired_at, "de-DE", false));
}
