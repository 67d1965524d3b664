//! Object lifecycle tests
//!
//! Exercises the table protocol end to end over the simulated backend:
//! allocation order, name uniqueness, lookup round-trips, deletion, and
//! id reuse.

use osal::limits::{MAX_BIN_SEMAPHORES, MAX_NAME, MAX_TASKS};
use osal::{KernelBackend, Osal, OsalError, QueueWait};
use sim_backend::SimBackend;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn entry() {}

fn osal() -> Osal<SimBackend> {
    Osal::new(SimBackend::new())
}

#[test]
fn test_create_exhausts_table_capacity() {
    let osal = osal();

    for i in 0..MAX_TASKS {
        osal.tasks()
            .create(&format!("task_{i}"), entry, 1024, 10)
            .expect("create within capacity");
    }
    assert_eq!(
        osal.tasks().create("one_too_many", entry, 1024, 10),
        Err(OsalError::NoFreeIds)
    );
}

#[test]
fn test_semaphore_table_capacity_is_independent() {
    let osal = osal();

    for i in 0..MAX_BIN_SEMAPHORES {
        osal.bin_sems()
            .create(&format!("sem_{i}"), 0)
            .expect("create within capacity");
    }
    assert_eq!(
        osal.bin_sems().create("overflow", 0),
        Err(OsalError::NoFreeIds)
    );
    // The task table is untouched by semaphore exhaustion.
    assert!(osal.tasks().create("still_room", entry, 1024, 10).is_ok());
}

#[test]
fn test_duplicate_names_rejected_per_table() {
    let osal = osal();

    osal.queues().create("telemetry", 4, 16).unwrap();
    assert_eq!(
        osal.queues().create("telemetry", 8, 32),
        Err(OsalError::NameTaken)
    );
    // Same name in a different table is fine.
    assert!(osal.bin_sems().create("telemetry", 0).is_ok());
}

#[test]
fn test_name_length_boundary() {
    let osal = osal();

    let longest = "n".repeat(MAX_NAME - 1);
    assert!(osal.mutexes().create(&longest).is_ok());

    let too_long = "n".repeat(MAX_NAME);
    assert_eq!(
        osal.mutexes().create(&too_long),
        Err(OsalError::NameTooLong)
    );
    assert_eq!(
        osal.mutexes().get_id_by_name(&too_long),
        Err(OsalError::NameTooLong)
    );
}

#[test]
fn test_create_lookup_round_trip_preserves_creator() {
    let osal = osal();

    let parent = osal.tasks().create("parent", entry, 2048, 20).unwrap();
    let parent_native = osal.tasks().get_info(parent).unwrap().native;
    osal.backend().set_current_task(Some(parent_native));

    let child = osal.tasks().create("child", entry, 1024, 30).unwrap();
    let looked_up = osal.tasks().get_id_by_name("child").unwrap();
    assert_eq!(looked_up, child);

    let info = osal.tasks().get_info(looked_up).unwrap();
    assert_eq!(info.name.as_str(), "child");
    assert_eq!(info.creator, Some(parent));
    assert_eq!(info.stack_size, 1024);
    assert_eq!(info.priority, 30);
}

#[test]
fn test_creator_unresolvable_without_calling_context() {
    let osal = osal();

    let queue = osal.queues().create("orphan", 2, 8).unwrap();
    assert_eq!(osal.queues().get_info(queue).unwrap().creator, None);
}

#[test]
fn test_delete_invalidates_id_and_frees_index() {
    let osal = osal();

    let id = osal.bin_sems().create("gate", 1).unwrap();
    osal.bin_sems().delete(id).unwrap();

    assert_eq!(osal.bin_sems().get_info(id), Err(OsalError::InvalidId));
    assert_eq!(
        osal.bin_sems().get_id_by_name("gate"),
        Err(OsalError::NameNotFound)
    );

    // The index is reused, but the stale id stays dead.
    let reused = osal.bin_sems().create("gate2", 1).unwrap();
    assert_eq!(reused.index(), id.index());
    assert_ne!(reused, id);
    assert_eq!(osal.bin_sems().take(id), Err(OsalError::InvalidId));
    assert!(osal.bin_sems().take(reused).is_ok());
}

#[test]
fn test_double_delete_reports_invalid_id() {
    let osal = osal();

    let id = osal.queues().create("once", 2, 8).unwrap();
    osal.queues().delete(id).unwrap();
    assert_eq!(osal.queues().delete(id), Err(OsalError::InvalidId));
}

#[test]
fn test_queue_fill_drain_and_undersized_buffer() {
    let osal = osal();

    let queue = osal.queues().create("mailbox", 4, 16).unwrap();
    for i in 0..4u8 {
        osal.queues().put(queue, &[i; 16]).expect("put within depth");
    }
    assert_eq!(osal.queues().put(queue, &[9; 16]), Err(OsalError::QueueFull));

    let mut small = [0u8; 8];
    assert_eq!(
        osal.queues().get(queue, &mut small, QueueWait::Check),
        Err(OsalError::QueueInvalidSize)
    );

    let mut buffer = [0u8; 16];
    let copied = osal
        .queues()
        .get(queue, &mut buffer, QueueWait::Check)
        .unwrap();
    assert_eq!(copied, 16);
    assert_eq!(buffer, [0u8; 16]);

    // Room for exactly one more now.
    osal.queues().put(queue, &[9; 16]).unwrap();
}

#[test]
fn test_queue_get_timeout_modes() {
    let osal = osal();

    let queue = osal.queues().create("idle", 2, 4).unwrap();
    let mut buffer = [0u8; 4];

    assert_eq!(
        osal.queues().get(queue, &mut buffer, QueueWait::Check),
        Err(OsalError::QueueTimeout)
    );
    assert_eq!(
        osal.queues().get(queue, &mut buffer, QueueWait::Millis(5)),
        Err(OsalError::QueueTimeout)
    );
}

#[test]
fn test_bin_sem_initial_value_clamped() {
    let osal = osal();

    let sem = osal.bin_sems().create("clamped", 5).unwrap();
    // Effective initial value is 1: one take succeeds, the next bounded
    // wait times out.
    osal.bin_sems().take(sem).unwrap();
    assert_eq!(
        osal.bin_sems().timed_wait(sem, 10),
        Err(OsalError::SemTimeout)
    );
}

#[test]
fn test_bin_sem_give_take_cycle() {
    let osal = osal();

    let sem = osal.bin_sems().create("cycle", 0).unwrap();
    osal.bin_sems().give(sem).unwrap();
    // Already given: a second give cannot stack.
    assert_eq!(osal.bin_sems().give(sem), Err(OsalError::SemFailure));
    osal.bin_sems().take(sem).unwrap();
    assert!(osal.bin_sems().timed_wait(sem, 1).is_err());
}

#[test]
fn test_bin_sem_flush_terminates_at_saturation() {
    let osal = osal();

    let sem = osal.bin_sems().create("flushed", 0).unwrap();
    osal.bin_sems().flush(sem).unwrap();
    // Flush left the semaphore at its maximum; a take drains it.
    osal.bin_sems().take(sem).unwrap();
}

#[test]
fn test_count_sem_bounds_and_counting() {
    let osal = osal();

    assert_eq!(
        osal.count_sems().create("too_big", u32::MAX),
        Err(OsalError::InvalidSemValue)
    );

    let sem = osal.count_sems().create("jobs", 2).unwrap();
    osal.count_sems().take(sem).unwrap();
    osal.count_sems().take(sem).unwrap();
    assert_eq!(
        osal.count_sems().timed_wait(sem, 5),
        Err(OsalError::SemTimeout)
    );

    osal.count_sems().give(sem).unwrap();
    osal.count_sems().take(sem).unwrap();
}

#[test]
fn test_mutex_lock_cycle() {
    let osal = osal();

    let mutex = osal.mutexes().create("state_guard").unwrap();
    osal.mutexes().take(mutex).unwrap();
    osal.mutexes().give(mutex).unwrap();
    // Giving an unheld mutex is a backend-reported failure.
    assert_eq!(osal.mutexes().give(mutex), Err(OsalError::SemFailure));

    let info = osal.mutexes().get_info(mutex).unwrap();
    assert_eq!(info.name.as_str(), "state_guard");
}

#[test]
fn test_timer_start_zero_never_arms() {
    let osal = osal();

    let fired = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&fired);
    let timer = osal
        .timers()
        .create(
            "disarmed",
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    // Start of zero means "do not arm", interval notwithstanding.
    osal.timers().set(timer, 0, 1_000).unwrap();
    osal.backend().advance_time(100_000);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(osal.backend().timer_count(), 0);

    let info = osal.timers().get_info(timer).unwrap();
    assert_eq!(info.start_micros, 0);
    assert_eq!(info.interval_micros, 1_000);
}

#[test]
fn test_timer_periodic_fires_and_stops_on_delete() {
    let osal = osal();

    let fired = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&fired);
    let timer = osal
        .timers()
        .create(
            "heartbeat",
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    osal.timers().set(timer, 1_000, 1_000).unwrap();
    osal.backend().advance_time(3_500);
    assert_eq!(fired.load(Ordering::SeqCst), 3);

    osal.timers().delete(timer).unwrap();
    osal.backend().advance_time(10_000);
    assert_eq!(fired.load(Ordering::SeqCst), 3);
    assert_eq!(osal.backend().timer_count(), 0);
}

#[test]
fn test_timer_values_round_up_to_resolution() {
    let osal = osal();

    let timer = osal.timers().create("coarse", Arc::new(|| {})).unwrap();
    // Resolution in the simulator is 1000 us; sub-resolution values round
    // up, zero stays zero.
    osal.timers().set(timer, 250, 10).unwrap();

    let info = osal.timers().get_info(timer).unwrap();
    assert_eq!(info.start_micros, 1_000);
    assert_eq!(info.interval_micros, 1_000);
    assert_eq!(info.accuracy_micros, 1_000);

    osal.timers().delete(timer).unwrap();
}

#[test]
fn test_timer_reset_replaces_previous_schedule() {
    let osal = osal();

    let fired = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&fired);
    let timer = osal
        .timers()
        .create(
            "rescheduled",
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    osal.timers().set(timer, 1_000, 1_000).unwrap();
    osal.timers().set(timer, 5_000, 0).unwrap();
    // Only the one-shot from the second schedule remains.
    assert_eq!(osal.backend().timer_count(), 1);

    osal.backend().advance_time(20_000);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_delete_hook_runs_once_on_delete() {
    let osal = osal();

    let task = osal.tasks().create("hooked", entry, 1024, 10).unwrap();
    let native = osal.tasks().get_info(task).unwrap().native;
    osal.backend().set_current_task(Some(native));

    let ran = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&ran);
    osal.tasks()
        .install_delete_handler(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

    osal.tasks().delete(task).unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(osal.tasks().get_info(task), Err(OsalError::InvalidId));
}

#[test]
fn test_install_delete_handler_requires_registered_caller() {
    let osal = osal();

    osal.backend().set_current_task(None);
    assert_eq!(
        osal.tasks().install_delete_handler(Box::new(|| {})),
        Err(OsalError::InvalidId)
    );
}

#[test]
fn test_task_exit_cleans_table_and_backend() {
    let osal = osal();

    let task = osal.tasks().create("leaver", entry, 1024, 10).unwrap();
    let native = osal.tasks().get_info(task).unwrap().native;
    osal.backend().set_current_task(Some(native));

    let ran = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&ran);
    osal.tasks()
        .install_delete_handler(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

    osal.tasks().exit().unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(osal.tasks().get_info(task), Err(OsalError::InvalidId));
    assert_eq!(osal.backend().current_task(), None);
}

#[test]
fn test_set_priority_updates_stored_value() {
    let osal = osal();

    let task = osal.tasks().create("repriced", entry, 1024, 10).unwrap();
    let native = osal.tasks().get_info(task).unwrap().native;
    assert_eq!(osal.backend().task_is_active(native), Some(true));

    assert_eq!(
        osal.tasks().set_priority(task, 999),
        Err(OsalError::InvalidPriority)
    );
    osal.tasks().set_priority(task, 42).unwrap();
    assert_eq!(osal.tasks().get_info(task).unwrap().priority, 42);
    assert_eq!(osal.backend().task_priority(native), Some(42));
}

#[test]
fn test_tick_conversion_and_local_clock() {
    let osal = osal();

    // 1000 us ticks in the simulator: 10 ms is 10 ticks, and a 1 ms
    // request never rounds down to zero.
    assert_eq!(osal.ticks_to_micros(), 1_000);
    assert_eq!(osal.millis_to_ticks(10), 10);
    assert_eq!(osal.millis_to_ticks(1), 1);

    osal.clock().set_local_time(osal::LocalTime {
        seconds: 1_000,
        microsecs: 250_000,
    });
    osal.backend().advance_time(2_000_000);
    let now = osal.clock().local_time().unwrap();
    assert_eq!(now.seconds, 1_002);
    assert_eq!(now.microsecs, 250_000);
}
