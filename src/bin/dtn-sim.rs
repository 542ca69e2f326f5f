//! Thin headless driver: loads a scenario file, builds a `Simulation`
//! from it via `Simulation::from_config`, drives the clock to `end_time`,
//! and prints a summary. Owns no simulation logic of its own — the real
//! scenario-authored message/activation schedule (an `EventGenerator`)
//! is out of scope (§1), so this binary runs with `NoopEventGenerator`;
//! see `tests/scenarios.rs` for worked examples that inject messages.

use std::env;
use std::process::ExitCode;

use env_logger::Builder;
use log::{error, info, LevelFilter};

use dtn_sim_core::config::load_scenario;
use dtn_sim_core::event::NoopEventGenerator;
use dtn_sim_core::Simulation;

fn main() -> ExitCode {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Info).filter(Some("dtn_sim_core"), LevelFilter::Debug);
    if let Ok(rust_log) = env::var("RUST_LOG") {
        builder.parse_filters(&rust_log);
    }
    builder.init();

    let Some(path) = env::args().nth(1) else {
        error!("usage: dtn-sim <scenario.json>");
        return ExitCode::FAILURE;
    };

    let scenario = match load_scenario(&path) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to load scenario {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "loaded scenario \"{}\": end_time={}, update_interval={}, {} group(s)",
        scenario.name,
        scenario.end_time,
        scenario.update_interval,
        scenario.groups.len()
    );

    let mut sim = Simulation::from_config(&scenario);
    let mut gen = NoopEventGenerator;
    sim.run_until(scenario.end_time, scenario.update_interval, &mut gen);

    info!("ran to t={:.2} with {} host(s); message creation/activation events are left to the caller's EventGenerator", sim.now(), sim.hosts_len());

    ExitCode::SUCCESS
}
