use std::{io::BufRead, path::PathBuf};

use clap::Parser;
use commands::{Command, HELP};
use speaking_clock::{Announcer, TtsSpeaker};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::dirs::default_config_file;

mod commands;
mod config;
mod dirs;

/// Announces the time out loud at a regular interval.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to read instead of the one in the user's config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Announce the time once and exit
    #[arg(long)]
    once: bool,
}

macro_rules! report {
    ($result:expr) => {
        if let Err(e) = $result {
            eprintln!("{}", e);
        }
    };
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let options = match args.config.as_deref() {
        Some(path) => config::load(path, true),
        None => match default_config_file() {
            Some(path) => config::load(&path, false),
            None => Ok(Default::default()),
        },
    }
    .expect("Failed to load config");

    let speaker = TtsSpeaker::new().expect("Failed to get TTS. Is a speech backend installed?");
    let mut announcer =
        Announcer::build(options, speaker.clone()).expect("Failed to build announcer");

    if args.once {
        announcer.tell_time().expect("Failed to announce the time");
        if let Err(e) = speaker.finish_speaking() {
            error!(error = %e, "failed waiting for speech to finish");
        }
        return;
    }

    if !announcer.is_running() {
        announcer.start().expect("Failed to start announcements");
    }
    println!(
        "Announcing the time every {} ms. Type \"help\" for commands.",
        announcer.options().interval
    );

    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match command {
            Command::Tell => report!(announcer.tell_time()),
            Command::Mute => announcer.mute(),
            Command::Unmute => announcer.unmute(),
            Command::Volume(volume) => report!(announcer.set_volume(volume)),
            Command::Interval(interval) => report!(announcer.set_interval(interval)),
            Command::TellDate(tell_date) => announcer.set_tell_date(tell_date),
            Command::Start => report!(announcer.start()),
            Command::Stop => announcer.stop(),
            Command::Options => {
                match toml::to_string_pretty(&announcer.options()) {
                    Ok(options) => print!("{}", options),
                    Err(e) => eprintln!("{}", e),
                }
                println!(
                    "running: {}, muted: {}",
                    announcer.is_running(),
                    announcer.is_muted()
                );
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    announcer.stop();
}
