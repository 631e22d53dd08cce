//! Background workers driving the submission lifecycle.

pub mod callback;
pub mod failure;
pub mod scheduler;
pub mod sdes;

pub use scheduler::Scheduler;

use crate::state::AppState;

/// Register all periodic workers on the scheduler.
pub fn spawn_all(scheduler: &mut Scheduler, state: AppState) {
    let workers = &state.config.workers;
    let initial_delay = workers.initial_delay();

    let sdes_state = state.clone();
    scheduler.spawn(
        "sdes-worker",
        initial_delay,
        workers.sdes_worker.interval(),
        move || sdes::run(sdes_state.clone()),
    );

    let callback_state = state.clone();
    scheduler.spawn(
        "processed-item-worker",
        initial_delay,
        workers.processed_item_worker.interval(),
        move || callback::run(callback_state.clone()),
    );

    let failure_state = state.clone();
    scheduler.spawn(
        "failed-item-worker",
        initial_delay,
        workers.failed_item_worker.interval(),
        move || failure::run(failure_state.clone()),
    );
}
