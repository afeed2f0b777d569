use std::{
    fs, io,
    path::{Path, PathBuf},
};

use speaking_clock::Options;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Load options from `path`, overlaid onto the defaults. A missing file is only an error when
/// `required` is set.
pub fn load(path: &Path, required: bool) -> Result<Options, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Options::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Fields left out of the file keep their defaults.
fn parse(content: &str) -> Result<Options, toml::de::Error> {
    toml::from_str::<Options>(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(parse("").unwrap(), Options::default());
    }

    #[test]
    fn present_fields_override_defaults() {
        let options = parse(
            r#"
            interval = 5000
            tell_date = true
            lang = "en-US"
            voice = "Samantha"
            "#,
        )
        .unwrap();
        assert_eq!(
            options,
            Options {
                interval: 5000,
                tell_date: true,
                lang: "en-US".to_string(),
                voice: Some("Samantha".to_string()),
                ..Options::default()
            }
        );
    }

    #[test]
    fn negative_interval_does_not_parse() {
        assert!(parse("interval = -5").is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(parse("intervall = 5000").is_err());
    }

    #[test]
    fn printed_options_are_a_valid_config() {
        let options = Options {
            voice: Some("Samantha".to_string()),
            volume: 0.5,
            interval: 5000,
            ..Options::default()
        };
        let printed = toml::to_string_pretty(&options).unwrap();
        assert_eq!(parse(&printed).unwrap(), options);
    }

    #[test]
    fn missing_optional_file_is_defaults() {
        let path = Path::new("/nonexistent/speaking-clock/clock.toml");
        assert_eq!(load(path, false).unwrap(), Options::default());
        assert!(matches!(load(path, true), Err(ConfigError::Read { .. })));
    }
}
