//! Given steps for service startup BDD scenarios.

use super::world::StartupWorld;
use crate::test_helpers::{closed_port, logged_service, open_port};
use rstest_bdd_macros::given;

#[given(r#"a service "{name}" listening on an open port"#)]
fn service_with_open_port(world: &mut StartupWorld, name: String) -> Result<(), eyre::Report> {
    let (listener, port) = open_port()?;
    world.listeners.push(listener);
    let spec = logged_service(&name, &world.log_path(), Some(port))?;
    world.specs.push(spec);
    Ok(())
}

#[given(r#"a service "{name}" whose port never opens"#)]
fn service_with_closed_port(world: &mut StartupWorld, name: String) -> Result<(), eyre::Report> {
    let port = closed_port()?;
    let spec = logged_service(&name, &world.log_path(), Some(port))?;
    world.specs.push(spec);
    Ok(())
}

#[given(r#"a service "{name}" without a health port"#)]
fn service_without_port(world: &mut StartupWorld, name: String) -> Result<(), eyre::Report> {
    let spec = logged_service(&name, &world.log_path(), None)?;
    world.specs.push(spec);
    Ok(())
}

#[given("dry run is enabled")]
fn dry_run_enabled(world: &mut StartupWorld) {
    world.dry_run = true;
}
