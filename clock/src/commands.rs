use std::str::FromStr;

use thiserror::Error;

pub const HELP: &str = "\
commands:
  tell             announce the time now
  mute / unmute    silence or restore announcements
  volume <0..1>    override the volume
  interval <ms>    change the time between announcements
  date on|off      include the date in announcements
  start / stop     control the schedule
  options          show the current options
  help             show this message
  quit             stop the clock and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Tell,
    Mute,
    Unmute,
    Volume(f32),
    Interval(u64),
    TellDate(bool),
    Start,
    Stop,
    Options,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Unknown command {0:?}, try \"help\"")]
    Unknown(String),
    #[error("{0} expects {1}")]
    BadArgument(&'static str, &'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default();
        let argument = words.next();

        let command = match (name, argument) {
            ("tell", None) => Command::Tell,
            ("mute", None) => Command::Mute,
            ("unmute", None) => Command::Unmute,
            ("volume", Some(volume)) => Command::Volume(
                volume
                    .parse()
                    .map_err(|_| CommandError::BadArgument("volume", "a number"))?,
            ),
            ("volume", None) => return Err(CommandError::BadArgument("volume", "a number")),
            ("interval", Some(interval)) => Command::Interval(
                interval
                    .parse()
                    .map_err(|_| CommandError::BadArgument("interval", "milliseconds"))?,
            ),
            ("interval", None) => {
                return Err(CommandError::BadArgument("interval", "milliseconds"))
            }
            ("date", Some("on")) => Command::TellDate(true),
            ("date", Some("off")) => Command::TellDate(false),
            ("date", _) => return Err(CommandError::BadArgument("date", "on or off")),
            ("start", None) => Command::Start,
            ("stop", None) => Command::Stop,
            ("options", None) => Command::Options,
            ("help", None) => Command::Help,
            ("quit" | "exit", None) => Command::Quit,
            _ => return Err(CommandError::Unknown(line.trim().to_string())),
        };

        if words.next().is_some() {
            return Err(CommandError::Unknown(line.trim().to_string()));
        }
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("tell".parse::<Command>(), Ok(Command::Tell));
        assert_eq!("  mute ".parse::<Command>(), Ok(Command::Mute));
        assert_eq!("volume 0.5".parse::<Command>(), Ok(Command::Volume(0.5)));
        assert_eq!("interval 5000".parse::<Command>(), Ok(Command::Interval(5000)));
        assert_eq!("date on".parse::<Command>(), Ok(Command::TellDate(true)));
        assert_eq!("date off".parse::<Command>(), Ok(Command::TellDate(false)));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            "interval -5".parse::<Command>(),
            Err(CommandError::BadArgument("interval", "milliseconds"))
        );
        assert_eq!(
            "volume loud".parse::<Command>(),
            Err(CommandError::BadArgument("volume", "a number"))
        );
        assert_eq!(
            "date maybe".parse::<Command>(),
            Err(CommandError::BadArgument("date", "on or off"))
        );
        assert_eq!(
            "dance".parse::<Command>(),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            "tell me".parse::<Command>(),
            Err(CommandError::Unknown("tell me".to_string()))
        );
    }
}
