//! # Quadrotor Teleoperation Executable
//!
//! Executable responsible for teleoperation of the quadrotor: it drives the
//! control loop, which streams video frames to the background analysis
//! worker, maps the resulting target signals into movement commands, and
//! dispatches them to the vehicle along with the operator's discrete
//! actions.
//!
//! Run with no arguments for an idle operator (the vehicle holds on the
//! analysis signal), or pass the path to a flight script to drive the run
//! from a file.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;

use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn, LevelFilter};

use tele_lib::{
    analysis::{worker_thread, LumaCentroidDetector},
    control_loop,
    data_store::DataStore,
    display::SessionDisplay,
    operator::{IdleOperator, OperatorInput, ScriptOperator},
    params::TeleExecParams,
    shared_state::SharedState,
    sim_link::SimVehicleLink,
};
use util::{
    host, logger::logger_init, module::State, params, script_interpreter::ScriptInterpreter,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    // Initialise error handling
    color_eyre::install()?;

    // ---- SESSION AND LOGGING ----

    let session =
        Session::new("tele_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise the logger")?;

    info!(
        "Quadrotor Teleoperation Executable, version {}",
        env!("CARGO_PKG_VERSION")
    );
    info!("");

    let host_info = host::get_host_info();
    info!(
        "Running on {} ({}, {})",
        host_info.os, host_info.arch, host_info.family
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- PARAMETERS ----

    let exec_params: TeleExecParams =
        params::load("tele_exec.toml").wrap_err("Failed to load executable parameters")?;

    // ---- OPERATOR SOURCE ----

    let args: Vec<String> = std::env::args().collect();

    let mut operator: Box<dyn OperatorInput> = match args.len() {
        1 => {
            info!("No flight script given, running with an idle operator");
            Box::new(IdleOperator)
        }
        2 => {
            let interpreter = ScriptInterpreter::new(&args[1])
                .wrap_err("Failed to load the flight script")?;
            info!(
                "Flight script loaded: {} ops over {:.1} s",
                interpreter.get_num_ops(),
                interpreter.get_duration()
            );
            Box::new(ScriptOperator::new(interpreter))
        }
        _ => {
            return Err(eyre!(
                "Expected at most one argument (the flight script path), got {}",
                args.len() - 1
            ))
        }
    };

    // ---- MODULE INIT ----

    let mut ds = DataStore::default();

    ds.cmd_mapper
        .init("cmd_mapper.toml", &session)
        .wrap_err("Failed to initialise the command mapper")?;

    info!("Module initialisation complete\n");

    // ---- VEHICLE CONNECTION ----

    // No recovery from a failed connection, it is fatal by design
    let mut link = SimVehicleLink::new(&exec_params.vehicle_addr, exec_params.sim_frame_period_s)
        .wrap_err("Failed to connect to the vehicle")?;

    // ---- ANALYSIS WORKER ----

    let shared = Arc::new(SharedState::new());
    let worker_run = Arc::new(AtomicBool::new(true));

    let worker_jh = {
        let shared = shared.clone();
        let worker_run = worker_run.clone();
        let detector = LumaCentroidDetector::default();
        let display = SessionDisplay::new(
            &session,
            exec_params.display_scale_factor,
            exec_params.display_max_rate_hz,
        );

        thread::Builder::new()
            .name(String::from("analysis"))
            .spawn(move || worker_thread(shared, detector, display, worker_run))
            .wrap_err("Failed to spawn the analysis worker")?
    };

    // ---- MAIN LOOP ----

    control_loop::run(&mut ds, &exec_params, &mut link, &mut operator, &shared);

    // ---- TEARDOWN ----

    worker_run.store(false, Ordering::Relaxed);
    if worker_jh.join().is_err() {
        warn!("The analysis worker panicked during the run");
    }

    // Releases the connection to the vehicle
    drop(link);

    session.exit();

    info!("End of execution");

    Ok(())
}
