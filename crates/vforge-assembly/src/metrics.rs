//! Assembly metrics.

use std::time::Duration;

use vforge_models::VisualMode;

pub fn record_scene_rendered(elapsed: Duration) {
    metrics::counter!("vforge_scenes_rendered_total").increment(1);
    metrics::histogram!("vforge_scene_render_seconds").record(elapsed.as_secs_f64());
}

/// `outcome` is "success" or an error kind.
pub fn record_run(outcome: &'static str) {
    metrics::counter!("vforge_assembly_runs_total", "outcome" => outcome).increment(1);
}

pub fn record_resolution(mode: VisualMode) {
    metrics::counter!("vforge_asset_resolutions_total", "mode" => mode.as_str()).increment(1);
}
