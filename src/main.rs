mod app;

use anyhow::{Context, Result};
use app::{App, Outcome};
use encodex_experiment::{CONFIG_FILE, StudyStateMachine, load_or_default};
use encodex_render::{load_font, load_stimuli};
use encodex_session::{
    OutputStore, SessionError, ensure_fresh, load_conditions, prompt_session_info, resolve_seed,
    select_trials,
};
use encodex_timing::{AbortToken, HighPrecisionTimer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io;
use std::process::ExitCode;

fn run() -> Result<Outcome> {
    let config = load_or_default(CONFIG_FILE)?;

    let info = prompt_session_info(io::stdin().lock(), io::stdout())?;
    let output_path = info.output_path(&config.output_dir, &config.output_suffix);
    log::info!("Output file: {}", output_path.display());
    ensure_fresh(&output_path)?;

    let conditions = load_conditions(&config.conditions_path)?;
    let seed = resolve_seed(config.seed);
    log::info!("Trial order seed: {seed}");
    let trials = select_trials(
        &conditions,
        config.trial_count,
        &mut StdRng::seed_from_u64(seed),
    )?;

    let stimuli = load_stimuli(&config.image_dir, &trials)?;
    let font = load_font(config.font_path.as_deref())?;

    let store = OutputStore::create(&output_path)?;
    log::info!(
        "Subject {} session {}: {} trials",
        info.subject_id,
        info.session,
        trials.len()
    );

    let abort = AbortToken::new();
    let study = StudyStateMachine::new(
        config,
        trials,
        HighPrecisionTimer::new(),
        store,
        abort.clone(),
    );
    App::new(study, abort, font, stimuli)
        .run()
        .context("session terminated with an error")
}

fn main() -> ExitCode {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    match run() {
        Ok(Outcome::Completed) => ExitCode::SUCCESS,
        Ok(Outcome::Aborted) => {
            log::info!("Exiting after abort");
            ExitCode::SUCCESS
        }
        Err(err) => match err.downcast_ref::<SessionError>() {
            Some(e) if e.is_cancelled_intake() => {
                log::info!("Intake cancelled ({e}), nothing was written");
                ExitCode::SUCCESS
            }
            _ => {
                log::error!("{err:#}");
                ExitCode::FAILURE
            }
        },
    }
}
