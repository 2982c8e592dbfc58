use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::debug;

use petri_sim::config::SimConfig;
use petri_sim::net::io::{read_snapshot, write_json, write_ron};
use petri_sim::options::Options;
use petri_sim::{FileObserver, LogObserver, Simulation};

fn main() -> ExitCode {
    if std::env::var("PETRI_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PETRI_LOG")
            .write_style("PETRI_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let options = match parse_options() {
        Ok(options) => options,
        Err(err) => match err.downcast::<clap::Error>() {
            Ok(clap_err) => clap_err.exit(),
            Err(err) => {
                eprintln!("error: {err:#}");
                return ExitCode::FAILURE;
            }
        },
    };
    debug!("petri-sim options: {:?}", options);

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// `PETRI_FLAGS` come first so that explicit arguments override them.
fn parse_options() -> Result<Options> {
    let mut flags = shellwords::split(&std::env::var("PETRI_FLAGS").unwrap_or_default())
        .context("PETRI_FLAGS has mismatched quotes")?;
    for (i, arg) in std::env::args_os().enumerate().skip(1) {
        let arg = arg
            .into_string()
            .map_err(|arg| anyhow::anyhow!("Argument {i} is not valid Unicode: {arg:?}"))?;
        flags.push(arg);
    }
    Options::parse_from_args(&flags)
}

fn run(options: &Options) -> Result<()> {
    let mut config = match &options.config {
        Some(path) => SimConfig::load_from_file(path)?,
        None => SimConfig::default(),
    };
    options.apply(&mut config);
    debug!("petri-sim config: {:?}", config);

    let mut sim = Simulation::seeded(
        config.places,
        config.transitions,
        config.max_tokens,
        config.seed,
    )
    .context("Failed to generate the initial net")?
    .with_observer(LogObserver::new(log::Level::Debug));

    if let Some(path) = &config.log_file {
        match FileObserver::create(path) {
            Ok(observer) => sim.add_observer(observer),
            Err(err) => log::warn!("cannot open log file {:?}: {err}", path),
        }
    }

    if let Some(path) = &options.input {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {:?}", path))?;
        sim.load_text(&text)
            .with_context(|| format!("Failed to load net from {:?}", path))?;
    }
    if let Some(path) = &options.load {
        let snapshot = read_snapshot(path)
            .with_context(|| format!("Failed to read snapshot: {:?}", path))?;
        sim.load_snapshot(snapshot)
            .with_context(|| format!("Failed to load snapshot from {:?}", path))?;
    }

    for _ in 0..options.steps {
        let outcome = sim.step()?;
        if !options.quiet {
            println!("{outcome}");
        }
        if outcome.is_blocked() {
            break;
        }
    }

    if let Some(path) = &options.output {
        fs::write(path, sim.to_text())
            .with_context(|| format!("Failed to write output file: {:?}", path))?;
    }
    if let Some(path) = &options.json {
        write_json(path, &sim.snapshot())
            .with_context(|| format!("Failed to write snapshot: {:?}", path))?;
    }
    if let Some(path) = &options.ron {
        write_ron(path, &sim.snapshot())
            .with_context(|| format!("Failed to write snapshot: {:?}", path))?;
    }
    let wrote_file = options.output.is_some() || options.json.is_some() || options.ron.is_some();
    if !wrote_file && !options.quiet {
        print!("{}", sim.to_text());
    }
    Ok(())
}
