//! Plan transitions from known durations.

use clipcast_common::config::AppConfig;
use clipcast_processing_core::{TimingInputs, TransitionPlanner};
use clipcast_render_engine::build_filter_complex;

pub fn run(
    config: &AppConfig,
    question_secs: Option<f64>,
    sound_secs: Option<f64>,
    total_secs: f64,
    filter: bool,
) -> anyhow::Result<()> {
    let planner = TransitionPlanner::new(config.timeline.clone());
    let plan = planner.plan(&TimingInputs {
        question_secs,
        transition_sound_secs: sound_secs,
        total_secs,
    })?;

    println!("{}", serde_json::to_string_pretty(&plan)?);

    if filter {
        println!();
        println!("{}", build_filter_complex(&plan.graph, None, None));
    }

    Ok(())
}
