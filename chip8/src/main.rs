use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::{App, Arg, ArgMatches};
use log::error;

use chip8_core::constants::DEFAULT_STEPS_PER_FRAME;

mod keymap;
mod run;

const DEFAULT_SCALE: u32 = 10;

/// Everything the driver needs to know before it opens a window
pub struct Config {
    pub rom: PathBuf,
    pub steps_per_frame: u32,
    pub scale: u32,
    pub seed: Option<u64>,
}

impl Config {
    fn from_args(args: &ArgMatches) -> Result<Self, String> {
        Ok(Config {
            rom: args.value_of("rom").map(PathBuf::from).ok_or("missing ROM path")?,
            steps_per_frame: parse(args, "steps_per_frame")?.unwrap_or(DEFAULT_STEPS_PER_FRAME),
            scale: parse(args, "scale")?.unwrap_or(DEFAULT_SCALE),
            seed: parse(args, "seed")?,
        })
    }
}

fn parse<T: std::str::FromStr>(args: &ArgMatches, name: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    args.value_of(name)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|e| format!("invalid {} '{}': {}", name, value, e))
        })
        .transpose()
}

fn cli() -> App<'static, 'static> {
    App::new("chip8")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs a CHIP-8 program")
        .arg(
            Arg::with_name("rom")
                .required(true)
                .help("Path to a raw program image"),
        )
        .arg(
            Arg::with_name("steps_per_frame")
                .short("s")
                .long("steps-per-frame")
                .takes_value(true)
                .help("Instructions executed per 60Hz frame [default: 10]"),
        )
        .arg(
            Arg::with_name("scale")
                .short("x")
                .long("scale")
                .takes_value(true)
                .help("Window pixels per display pixel [default: 10]"),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .help("Seed for the random number generator"),
        )
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_args(&cli().get_matches()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    run::run(config).inspect_err(|e| error!("{}", e))
}
