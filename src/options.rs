//! Parsing Options.
//! Command-line flags override values from the `--config` TOML file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

use crate::config::SimConfig;
use crate::net::Tokens;

fn make_options_parser() -> Command {
    Command::new("petri-sim")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Step an ordinary Petri net with bounded places")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("TOML file with default settings"),
        )
        .arg(
            Arg::new("places")
                .short('p')
                .long("places")
                .value_parser(value_parser!(usize))
                .help("Number of places"),
        )
        .arg(
            Arg::new("transitions")
                .short('t')
                .long("transitions")
                .value_parser(value_parser!(usize))
                .help("Number of transitions"),
        )
        .arg(
            Arg::new("max-tokens")
                .short('m')
                .long("max-tokens")
                .value_parser(value_parser!(Tokens))
                .help("Capacity of every place"),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Seed for the random source"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Load the net and marking from a text file"),
        )
        .arg(
            Arg::new("load")
                .long("load")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .conflicts_with("input")
                .help("Load the net and marking from a JSON or .ron snapshot"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Write the final state as text"),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Write the final state as a JSON snapshot"),
        )
        .arg(
            Arg::new("ron")
                .long("ron")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Write the final state as a RON snapshot"),
        )
        .arg(
            Arg::new("steps")
                .short('n')
                .long("steps")
                .value_parser(value_parser!(usize))
                .default_value("1")
                .help("Number of steps to perform"),
        )
        .arg(
            Arg::new("log")
                .short('l')
                .long("log")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Append a state snapshot to FILE after every change"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Do not print step results"),
        )
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Options {
    pub config: Option<PathBuf>,
    pub places: Option<usize>,
    pub transitions: Option<usize>,
    pub max_tokens: Option<Tokens>,
    pub seed: Option<u64>,
    pub input: Option<PathBuf>,
    pub load: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub ron: Option<PathBuf>,
    pub steps: usize,
    pub log: Option<PathBuf>,
    pub quiet: bool,
}

impl Options {
    pub fn parse_from_str(s: &str) -> Result<Self> {
        let flags = shellwords::split(s).context("Failed to split option string")?;
        Self::parse_from_args(&flags)
    }

    pub fn parse_from_args(flags: &[String]) -> Result<Self> {
        let matches = make_options_parser().try_get_matches_from(flags.iter())?;
        Ok(Self::from_matches(&matches))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Options {
            config: matches.get_one::<PathBuf>("config").cloned(),
            places: matches.get_one::<usize>("places").copied(),
            transitions: matches.get_one::<usize>("transitions").copied(),
            max_tokens: matches.get_one::<Tokens>("max-tokens").copied(),
            seed: matches.get_one::<u64>("seed").copied(),
            input: matches.get_one::<PathBuf>("input").cloned(),
            load: matches.get_one::<PathBuf>("load").cloned(),
            output: matches.get_one::<PathBuf>("output").cloned(),
            json: matches.get_one::<PathBuf>("json").cloned(),
            ron: matches.get_one::<PathBuf>("ron").cloned(),
            steps: matches.get_one::<usize>("steps").copied().unwrap_or(1),
            log: matches.get_one::<PathBuf>("log").cloned(),
            quiet: matches.get_flag("quiet"),
        }
    }

    /// Flags given on the command line win over the config file.
    pub fn apply(&self, config: &mut SimConfig) {
        if let Some(places) = self.places {
            config.places = places;
        }
        if let Some(transitions) = self.transitions {
            config.transitions = transitions;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.log.is_some() {
            config.log_file = self.log.clone();
        }
    }
}
