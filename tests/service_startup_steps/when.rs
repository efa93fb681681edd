//! When steps for service startup BDD scenarios.

use super::world::{StartupWorld, run_async};
use mockable::DefaultClock;
use rstest_bdd_macros::when;

#[when("the services are started")]
fn services_started(world: &mut StartupWorld) {
    let result = run_async(world.launcher.start_all_into(
        &world.services,
        &world.specs,
        world.dry_run,
    ));
    world.started_pids = world
        .services
        .names()
        .iter()
        .filter_map(|name| world.services.pid_of(name))
        .collect();
    world.start_result = Some(result);
}

#[when("the services are stopped")]
fn services_stopped(world: &mut StartupWorld) {
    world.shutdown = Some(run_async(world.services.stop_all(&DefaultClock)));
}
