use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::error;
use tracing::info;

use super::bridge::Bridge;
use super::registry::Registry;
use super::target::TargetState;
use crate::integrations::hue;

/// Tally of one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub successes: usize,
    pub errors: usize,
    /// Entities already at the target.
    pub skipped: usize,
}

/// Push `target` to every managed light. Failures are logged and counted;
/// they neither stop the pass nor change a light's managed status.
pub async fn update_lights<B: Bridge + ?Sized>(
    bridge: &B,
    registry: &mut Registry,
    target: TargetState,
    transition: Duration,
    now: NaiveDateTime,
) -> DispatchReport {
    info!("Updating lights: {}", target);

    let mut report = DispatchReport::default();
    for light in registry.lights.values_mut().filter(|l| l.managed) {
        let Some((restricted, update)) = light.command_for(target, transition) else {
            report.skipped += 1;
            continue;
        };

        match bridge.update_light(&light.id, &update).await {
            Ok(()) => {
                light.commanded(restricted, now);
                report.successes += 1;
            }
            Err(e) => {
                error!("Error while updating light {}: {}", light.id, e);
                report.errors += 1;
            }
        }
    }

    info!(
        "Finished updating lights: {} successes, {} errors, {} unchanged",
        report.successes, report.errors, report.skipped
    );
    report
}

/// Rewrite every tracked scene so recalling it applies `target`.
pub async fn update_scenes<B: Bridge + ?Sized>(
    bridge: &B,
    registry: &mut Registry,
    target: TargetState,
    now: NaiveDateTime,
) -> DispatchReport {
    info!("Updating scenes: {}", target);

    let mut report = DispatchReport::default();
    let Registry { lights, scenes } = registry;
    for scene in scenes.values_mut() {
        if scene.last_commanded == Some(target) {
            report.skipped += 1;
            continue;
        }

        let actions = scene.rebuild_actions(target, lights);
        let update = hue::SceneUpdate {
            actions: Some(actions.clone()),
        };

        match bridge.update_scene(&scene.id, &update).await {
            Ok(()) => {
                scene.updated(target, actions, now);
                report.successes += 1;
            }
            Err(e) => {
                error!("Error while updating scene {}: {}", scene.id, e);
                report.errors += 1;
            }
        }
    }

    info!(
        "Finished updating scenes: {} successes, {} errors, {} unchanged",
        report.successes, report.errors, report.skipped
    );
    report
}
