//! Then steps for cleanup registry BDD scenarios.

use super::world::{CleanupWorld, run_async};
use rstest_bdd_macros::then;

#[then(r#"the actions ran in the order "{order}""#)]
fn actions_ran_in_order(world: &CleanupWorld, order: String) -> Result<(), eyre::Report> {
    let expected: Vec<String> = order.split(", ").map(str::to_owned).collect();
    let executed = world.executed_labels();
    if executed != expected {
        return Err(eyre::eyre!(
            "expected execution order {expected:?}, found {executed:?}"
        ));
    }
    Ok(())
}

#[then("each action ran exactly once")]
fn each_action_ran_once(world: &CleanupWorld) -> Result<(), eyre::Report> {
    let executed = world.executed_labels();
    for label in &world.registered {
        let runs = executed.iter().filter(|entry| *entry == label).count();
        if runs != 1 {
            return Err(eyre::eyre!("action '{label}' ran {runs} times"));
        }
    }
    Ok(())
}

#[then("the last drain ran {count:usize} actions")]
fn last_drain_ran(world: &CleanupWorld, count: usize) -> Result<(), eyre::Report> {
    let report = world
        .reports
        .last()
        .ok_or_else(|| eyre::eyre!("the registry was never drained"))?;
    if report.executed() != count {
        return Err(eyre::eyre!(
            "expected {count} actions in the last drain, found {}",
            report.executed()
        ));
    }
    Ok(())
}

#[then(r#"the drain reported a failure for "{label}""#)]
fn drain_reported_failure(world: &CleanupWorld, label: String) -> Result<(), eyre::Report> {
    let report = world
        .reports
        .last()
        .ok_or_else(|| eyre::eyre!("the registry was never drained"))?;
    let failures: Vec<String> = report.failures().iter().map(ToString::to_string).collect();
    let [failure] = failures.as_slice() else {
        return Err(eyre::eyre!("expected one failure, found {failures:?}"));
    };
    if !failure.contains(&format!("'{label}'")) {
        return Err(eyre::eyre!("failure does not name '{label}': {failure}"));
    }
    Ok(())
}

#[then("the process exits with code {code:i32}")]
fn process_exits_with(world: &mut CleanupWorld, code: i32) -> Result<(), eyre::Report> {
    let receiver = world
        .exit_code
        .take()
        .ok_or_else(|| eyre::eyre!("no signal bridge is listening"))?;
    let exited = run_async(receiver).map_err(|_| eyre::eyre!("signal bridge never exited"))?;
    if exited != code {
        return Err(eyre::eyre!("expected exit code {code}, found {exited}"));
    }
    Ok(())
}
