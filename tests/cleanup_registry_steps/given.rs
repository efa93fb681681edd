//! Given steps for cleanup registry BDD scenarios.

use super::world::CleanupWorld;
use foreman::cleanup::{CleanupError, ShutdownSignal, SignalBridge};
use rstest_bdd_macros::given;
use std::sync::{Arc, PoisonError};
use tokio::sync::oneshot;

fn register_recording(world: &mut CleanupWorld, label: String, fails: bool) {
    let executions = Arc::clone(&world.executions);
    let recorded = label.clone();
    world.registry.register(label.clone(), move || {
        executions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded);
        if fails {
            return Err(CleanupError::from("action refused to run"));
        }
        Ok(())
    });
    world.registered.push(label);
}

#[given(r#"a cleanup action "{label}" is registered"#)]
fn cleanup_action_registered(world: &mut CleanupWorld, label: String) {
    register_recording(world, label, false);
}

#[given(r#"a failing cleanup action "{label}" is registered"#)]
fn failing_cleanup_action_registered(world: &mut CleanupWorld, label: String) {
    register_recording(world, label, true);
}

#[given("a signal bridge is listening")]
fn signal_bridge_listening(world: &mut CleanupWorld) {
    let (signal_tx, signal_rx) = oneshot::channel();
    let (exit_tx, exit_rx) = oneshot::channel();
    let bridge = SignalBridge::install_with(
        world.registry.clone(),
        async move { signal_rx.await.unwrap_or(ShutdownSignal::Terminate) },
        move |code| {
            exit_tx.send(code).ok();
        },
    );
    world.bridge = Some(bridge);
    world.signal = Some(signal_tx);
    world.exit_code = Some(exit_rx);
}
