//! Then steps for service startup BDD scenarios.

use super::world::StartupWorld;
use crate::test_helpers::{entries_with_prefix, read_log};
use rstest_bdd_macros::then;

fn split_names(names: &str) -> Vec<String> {
    names.split(", ").map(str::to_owned).collect()
}

#[then(r#"startup succeeds with services "{names}""#)]
fn startup_succeeds(world: &StartupWorld, names: String) -> Result<(), eyre::Report> {
    let result = world
        .start_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("services were never started"))?;
    result
        .as_ref()
        .map_err(|err| eyre::eyre!("unexpected startup failure: {err}"))?;

    let started: Vec<String> = world.services.names().into_iter().map(String::from).collect();
    if started != split_names(&names) {
        return Err(eyre::eyre!("expected services {names}, found {started:?}"));
    }
    Ok(())
}

#[then(r#"startup fails naming service "{name}""#)]
fn startup_fails(world: &StartupWorld, name: String) -> Result<(), eyre::Report> {
    let result = world
        .start_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("services were never started"))?;
    let Err(err) = result else {
        return Err(eyre::eyre!("expected startup to fail"));
    };
    if err.service_name().as_str() != name {
        return Err(eyre::eyre!("expected failure for {name}, found {err}"));
    }
    if !err.command_line().starts_with("sh -c") {
        return Err(eyre::eyre!("error lacks command line: {}", err.command_line()));
    }
    Ok(())
}

#[then("every started service is running")]
fn every_service_running(world: &StartupWorld) -> Result<(), eyre::Report> {
    for name in world.services.names() {
        if !world.services.is_running(&name) {
            return Err(eyre::eyre!("service {name} is not running"));
        }
    }
    Ok(())
}

#[then(r#"the services stopped in the order "{order}""#)]
fn services_stopped_in_order(world: &StartupWorld, order: String) -> Result<(), eyre::Report> {
    let expected: Vec<String> = split_names(&order)
        .into_iter()
        .map(|name| format!("stop:{name}"))
        .collect();
    let stops = entries_with_prefix(&read_log(&world.log_path())?, "stop:");
    if stops != expected {
        return Err(eyre::eyre!("expected stops {expected:?}, found {stops:?}"));
    }
    if let Some(report) = &world.shutdown
        && !report.is_clean()
    {
        return Err(eyre::eyre!("shutdown reported failures"));
    }
    Ok(())
}

#[then(r#"service "{name}" was never started"#)]
fn service_never_started(world: &StartupWorld, name: String) -> Result<(), eyre::Report> {
    let log = read_log(&world.log_path())?;
    if log.contains(&format!("start:{name}")) {
        return Err(eyre::eyre!("service {name} was started: {log:?}"));
    }
    Ok(())
}

#[then("no service is running")]
fn no_service_running(world: &StartupWorld) -> Result<(), eyre::Report> {
    if !world.services.is_empty() {
        return Err(eyre::eyre!(
            "services still tracked: {:?}",
            world.services.names()
        ));
    }
    for pid in &world.started_pids {
        let raw = i32::try_from(*pid)?;
        if nix::sys::signal::kill(nix::unistd::Pid::from_raw(raw), None).is_ok() {
            return Err(eyre::eyre!("process {pid} is still alive"));
        }
    }
    Ok(())
}
