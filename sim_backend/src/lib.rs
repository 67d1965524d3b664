//! # Simulated Backend
//!
//! This crate provides an in-process implementation of the kernel backend
//! trait.
//!
//! ## Purpose
//!
//! The simulated backend lets the abstraction layer be tested without a
//! real kernel:
//! - Runs under `cargo test`
//! - Deterministic (virtual time, no real concurrency)
//! - Inspectable (queue depths, semaphore counts, timer state)
//! - Faultable (any create/destroy/cancel can be made to fail on demand)
//!
//! ## Single-threaded semantics
//!
//! The simulator has no scheduler, so a wait that only another task could
//! satisfy can never complete. An unbounded wait on an unavailable object
//! reports [`BackendError::Failure`]; a timed or polling wait advances
//! virtual time and reports [`BackendError::Timeout`]. Tests drive timers
//! explicitly with [`SimBackend::advance_time`].

pub mod fault_injection;

use backend_api::{
    BackendError, KernelBackend, QueueWait, SignalOutcome, TaskEntry, TimerCallback,
};
use crate::fault_injection::FaultInjector;
use osal_types::NativeHandle;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Tick duration reported by the simulator, in microseconds.
const SIM_TICK_MICROS: u32 = 1_000;

/// Timer resolution reported by the simulator, in microseconds.
const SIM_CLOCK_ACCURACY_MICROS: u64 = 1_000;

struct SimTask {
    #[allow(dead_code)]
    entry: TaskEntry,
    #[allow(dead_code)]
    stack_size: u32,
    priority: u32,
    active: bool,
}

struct SimQueue {
    capacity_bytes: usize,
    used_bytes: usize,
    messages: VecDeque<Vec<u8>>,
}

struct SimSemaphore {
    count: u32,
    max: u32,
}

struct SimMutex {
    locked: bool,
}

struct SimTimer {
    callback: TimerCallback,
    next_fire: u64,
    interval_micros: u64,
    cancelled: bool,
}

struct SimState {
    now_micros: u64,
    next_handle: u64,
    current_task: Option<NativeHandle>,
    tasks: HashMap<u64, SimTask>,
    queues: HashMap<u64, SimQueue>,
    semaphores: HashMap<u64, SimSemaphore>,
    mutexes: HashMap<u64, SimMutex>,
    timers: HashMap<u64, SimTimer>,
    faults: FaultInjector,
}

impl SimState {
    fn mint_handle(&mut self) -> NativeHandle {
        let handle = NativeHandle::new(self.next_handle);
        self.next_handle += 1;
        handle
    }
}

/// Simulated kernel backend.
///
/// All state sits behind one internal lock so the backend is shareable
/// across the managers that hold it; no lock is held while a timer
/// callback runs.
pub struct SimBackend {
    state: Mutex<SimState>,
}

impl SimBackend {
    /// Creates a simulator with no pending faults.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                now_micros: 0,
                next_handle: 1,
                current_task: None,
                tasks: HashMap::new(),
                queues: HashMap::new(),
                semaphores: HashMap::new(),
                mutexes: HashMap::new(),
                timers: HashMap::new(),
                faults: FaultInjector::default(),
            }),
        }
    }

    /// Installs a fault injector.
    pub fn with_fault_injector(self, injector: FaultInjector) -> Self {
        self.state_mut().faults = injector;
        self
    }

    fn state_mut(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().expect("simulated backend state poisoned")
    }

    // ----- test support -----

    /// Declares which task the current execution context belongs to.
    ///
    /// Creator attribution and self-referential operations resolve the
    /// calling task through this register.
    pub fn set_current_task(&self, task: Option<NativeHandle>) {
        self.state_mut().current_task = task;
    }

    /// Advances virtual time, firing every timer that comes due. One-shot
    /// timers (zero interval) fire once; periodic timers are rescheduled
    /// until cancelled.
    pub fn advance_time(&self, delta_micros: u64) {
        let target = self.state_mut().now_micros + delta_micros;
        loop {
            let due = {
                let mut state = self.state_mut();
                let next = state
                    .timers
                    .iter()
                    .filter(|(_, t)| !t.cancelled && t.next_fire <= target)
                    .min_by_key(|(_, t)| t.next_fire)
                    .map(|(handle, t)| (*handle, t.next_fire));
                match next {
                    Some((handle, fire_at)) => {
                        state.now_micros = fire_at;
                        let timer = state
                            .timers
                            .get_mut(&handle)
                            .expect("due timer disappeared");
                        if timer.interval_micros > 0 {
                            timer.next_fire = fire_at + timer.interval_micros;
                        } else {
                            timer.cancelled = true;
                        }
                        Some(timer.callback.clone())
                    }
                    None => {
                        state.now_micros = target;
                        None
                    }
                }
            };
            match due {
                Some(callback) => callback(),
                None => break,
            }
        }
    }

    /// Returns a task's backend-side priority.
    pub fn task_priority(&self, task: NativeHandle) -> Option<u32> {
        self.state_mut().tasks.get(&task.raw()).map(|t| t.priority)
    }

    /// Returns whether a task has been activated.
    pub fn task_is_active(&self, task: NativeHandle) -> Option<bool> {
        self.state_mut().tasks.get(&task.raw()).map(|t| t.active)
    }

    /// Returns the number of messages queued on a queue.
    pub fn queue_depth(&self, queue: NativeHandle) -> Option<usize> {
        self.state_mut()
            .queues
            .get(&queue.raw())
            .map(|q| q.messages.len())
    }

    /// Returns a semaphore's current count.
    pub fn sem_count(&self, sem: NativeHandle) -> Option<u32> {
        self.state_mut()
            .semaphores
            .get(&sem.raw())
            .map(|s| s.count)
    }

    /// Returns the number of live (not destroyed) backend timers.
    pub fn timer_count(&self) -> usize {
        self.state_mut().timers.len()
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelBackend for SimBackend {
    fn task_create(
        &self,
        entry: TaskEntry,
        stack_size: u32,
        priority: u32,
    ) -> Result<NativeHandle, BackendError> {
        let mut state = self.state_mut();
        if state.faults.take_create_fault() {
            return Err(BackendError::Failure);
        }
        let handle = state.mint_handle();
        state.tasks.insert(
            handle.raw(),
            SimTask {
                entry,
                stack_size,
                priority,
                active: false,
            },
        );
        Ok(handle)
    }

    fn task_activate(&self, task: NativeHandle) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        match state.tasks.get_mut(&task.raw()) {
            Some(t) => {
                t.active = true;
                Ok(())
            }
            None => Err(BackendError::Failure),
        }
    }

    fn task_delete(&self, task: NativeHandle) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        if state.faults.take_destroy_fault() {
            return Err(BackendError::Failure);
        }
        match state.tasks.remove(&task.raw()) {
            Some(_) => {
                if state.current_task == Some(task) {
                    state.current_task = None;
                }
                Ok(())
            }
            None => Err(BackendError::Failure),
        }
    }

    fn task_set_priority(&self, task: NativeHandle, priority: u32) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        match state.tasks.get_mut(&task.raw()) {
            Some(t) => {
                t.priority = priority;
                Ok(())
            }
            None => Err(BackendError::Failure),
        }
    }

    fn task_exit(&self) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        let current = state.current_task.take().ok_or(BackendError::Failure)?;
        state.tasks.remove(&current.raw());
        Ok(())
    }

    fn task_sleep(&self, millis: u32) -> Result<(), BackendError> {
        self.state_mut().now_micros += u64::from(millis) * 1_000;
        Ok(())
    }

    fn current_task(&self) -> Option<NativeHandle> {
        self.state_mut().current_task
    }

    fn queue_create(&self, capacity_bytes: u32) -> Result<NativeHandle, BackendError> {
        let mut state = self.state_mut();
        if state.faults.take_create_fault() {
            return Err(BackendError::Failure);
        }
        let handle = state.mint_handle();
        state.queues.insert(
            handle.raw(),
            SimQueue {
                capacity_bytes: capacity_bytes as usize,
                used_bytes: 0,
                messages: VecDeque::new(),
            },
        );
        Ok(handle)
    }

    fn queue_delete(&self, queue: NativeHandle) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        if state.faults.take_destroy_fault() {
            return Err(BackendError::Failure);
        }
        state
            .queues
            .remove(&queue.raw())
            .map(|_| ())
            .ok_or(BackendError::Failure)
    }

    fn queue_send(&self, queue: NativeHandle, data: &[u8]) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        let q = state
            .queues
            .get_mut(&queue.raw())
            .ok_or(BackendError::Failure)?;
        if q.used_bytes + data.len() > q.capacity_bytes {
            return Err(BackendError::Timeout);
        }
        q.used_bytes += data.len();
        q.messages.push_back(data.to_vec());
        Ok(())
    }

    fn queue_receive(
        &self,
        queue: NativeHandle,
        buffer: &mut [u8],
        wait: QueueWait,
    ) -> Result<usize, BackendError> {
        let mut state = self.state_mut();
        let q = state
            .queues
            .get_mut(&queue.raw())
            .ok_or(BackendError::Failure)?;
        match q.messages.pop_front() {
            Some(message) => {
                q.used_bytes -= message.len();
                let copied = message.len().min(buffer.len());
                buffer[..copied].copy_from_slice(&message[..copied]);
                Ok(copied)
            }
            None => match wait {
                QueueWait::Check => Err(BackendError::Timeout),
                QueueWait::Millis(millis) => {
                    state.now_micros += u64::from(millis) * 1_000;
                    Err(BackendError::Timeout)
                }
                // Nothing else runs, so a pend could never be satisfied.
                QueueWait::Pend => Err(BackendError::Failure),
            },
        }
    }

    fn sem_create(&self, initial: u32, max: u32) -> Result<NativeHandle, BackendError> {
        let mut state = self.state_mut();
        if state.faults.take_create_fault() {
            return Err(BackendError::Failure);
        }
        if initial > max {
            return Err(BackendError::Failure);
        }
        let handle = state.mint_handle();
        state.semaphores.insert(
            handle.raw(),
            SimSemaphore {
                count: initial,
                max,
            },
        );
        Ok(handle)
    }

    fn sem_delete(&self, sem: NativeHandle) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        if state.faults.take_destroy_fault() {
            return Err(BackendError::Failure);
        }
        state
            .semaphores
            .remove(&sem.raw())
            .map(|_| ())
            .ok_or(BackendError::Failure)
    }

    fn sem_signal(&self, sem: NativeHandle) -> Result<SignalOutcome, BackendError> {
        let mut state = self.state_mut();
        let s = state
            .semaphores
            .get_mut(&sem.raw())
            .ok_or(BackendError::Failure)?;
        if s.count >= s.max {
            Ok(SignalOutcome::Saturated)
        } else {
            s.count += 1;
            Ok(SignalOutcome::Signaled)
        }
    }

    fn sem_wait(&self, sem: NativeHandle) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        let s = state
            .semaphores
            .get_mut(&sem.raw())
            .ok_or(BackendError::Failure)?;
        if s.count > 0 {
            s.count -= 1;
            Ok(())
        } else {
            // Nothing else runs, so the wait could never be satisfied.
            Err(BackendError::Failure)
        }
    }

    fn sem_timed_wait(&self, sem: NativeHandle, millis: u32) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        let s = state
            .semaphores
            .get_mut(&sem.raw())
            .ok_or(BackendError::Failure)?;
        if s.count > 0 {
            s.count -= 1;
            Ok(())
        } else {
            state.now_micros += u64::from(millis) * 1_000;
            Err(BackendError::Timeout)
        }
    }

    fn mutex_create(&self) -> Result<NativeHandle, BackendError> {
        let mut state = self.state_mut();
        if state.faults.take_create_fault() {
            return Err(BackendError::Failure);
        }
        let handle = state.mint_handle();
        state.mutexes.insert(handle.raw(), SimMutex { locked: false });
        Ok(handle)
    }

    fn mutex_delete(&self, mutex: NativeHandle) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        if state.faults.take_destroy_fault() {
            return Err(BackendError::Failure);
        }
        state
            .mutexes
            .remove(&mutex.raw())
            .map(|_| ())
            .ok_or(BackendError::Failure)
    }

    fn mutex_lock(&self, mutex: NativeHandle) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        let m = state
            .mutexes
            .get_mut(&mutex.raw())
            .ok_or(BackendError::Failure)?;
        if m.locked {
            // Held and nothing else runs to release it.
            Err(BackendError::Failure)
        } else {
            m.locked = true;
            Ok(())
        }
    }

    fn mutex_unlock(&self, mutex: NativeHandle) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        let m = state
            .mutexes
            .get_mut(&mutex.raw())
            .ok_or(BackendError::Failure)?;
        if m.locked {
            m.locked = false;
            Ok(())
        } else {
            Err(BackendError::Failure)
        }
    }

    fn timer_arm(
        &self,
        callback: TimerCallback,
        start_micros: u64,
        interval_micros: u64,
    ) -> Result<NativeHandle, BackendError> {
        let mut state = self.state_mut();
        if state.faults.take_create_fault() {
            return Err(BackendError::Failure);
        }
        let next_fire = state.now_micros + start_micros;
        let handle = state.mint_handle();
        state.timers.insert(
            handle.raw(),
            SimTimer {
                callback,
                next_fire,
                interval_micros,
                cancelled: false,
            },
        );
        Ok(handle)
    }

    fn timer_cancel(&self, timer: NativeHandle) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        if state.faults.take_cancel_fault() {
            return Err(BackendError::Failure);
        }
        match state.timers.get_mut(&timer.raw()) {
            Some(t) => {
                t.cancelled = true;
                Ok(())
            }
            None => Err(BackendError::Failure),
        }
    }

    fn timer_destroy(&self, timer: NativeHandle) -> Result<(), BackendError> {
        let mut state = self.state_mut();
        if state.faults.take_destroy_fault() {
            return Err(BackendError::Failure);
        }
        state
            .timers
            .remove(&timer.raw())
            .map(|_| ())
            .ok_or(BackendError::Failure)
    }

    fn now_micros(&self) -> Result<u64, BackendError> {
        Ok(self.state_mut().now_micros)
    }

    fn tick_micros(&self) -> u32 {
        SIM_TICK_MICROS
    }

    fn clock_accuracy_micros(&self) -> u64 {
        SIM_CLOCK_ACCURACY_MICROS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault_injection::{FaultPlan, LifecycleFault};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn noop() {}

    #[test]
    fn test_queue_capacity_in_bytes() {
        let backend = SimBackend::new();
        let queue = backend.queue_create(32).unwrap();

        backend.queue_send(queue, &[0u8; 16]).unwrap();
        backend.queue_send(queue, &[1u8; 16]).unwrap();
        assert_eq!(
            backend.queue_send(queue, &[2u8; 16]),
            Err(BackendError::Timeout)
        );
        assert_eq!(backend.queue_depth(queue), Some(2));
    }

    #[test]
    fn test_queue_receive_order_and_drain() {
        let backend = SimBackend::new();
        let queue = backend.queue_create(64).unwrap();
        backend.queue_send(queue, b"first").unwrap();
        backend.queue_send(queue, b"second").unwrap();

        let mut buffer = [0u8; 16];
        let n = backend
            .queue_receive(queue, &mut buffer, QueueWait::Check)
            .unwrap();
        assert_eq!(&buffer[..n], b"first");

        let n = backend
            .queue_receive(queue, &mut buffer, QueueWait::Check)
            .unwrap();
        assert_eq!(&buffer[..n], b"second");

        assert_eq!(
            backend.queue_receive(queue, &mut buffer, QueueWait::Check),
            Err(BackendError::Timeout)
        );
    }

    #[test]
    fn test_semaphore_saturation() {
        let backend = SimBackend::new();
        let sem = backend.sem_create(1, 1).unwrap();

        assert_eq!(backend.sem_signal(sem), Ok(SignalOutcome::Saturated));
        backend.sem_wait(sem).unwrap();
        assert_eq!(backend.sem_signal(sem), Ok(SignalOutcome::Signaled));
    }

    #[test]
    fn test_timed_wait_advances_virtual_time() {
        let backend = SimBackend::new();
        let sem = backend.sem_create(0, 1).unwrap();

        assert_eq!(
            backend.sem_timed_wait(sem, 10),
            Err(BackendError::Timeout)
        );
        assert_eq!(backend.now_micros().unwrap(), 10_000);
    }

    #[test]
    fn test_periodic_timer_fires_on_advance() {
        let backend = SimBackend::new();
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let timer = backend
            .timer_arm(
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
                1_000,
                1_000,
            )
            .unwrap();

        backend.advance_time(3_500);
        assert_eq!(fired.load(Ordering::SeqCst), 3);

        backend.timer_cancel(timer).unwrap();
        backend.advance_time(5_000);
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_one_shot_timer_fires_once() {
        let backend = SimBackend::new();
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        backend
            .timer_arm(
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
                2_000,
                0,
            )
            .unwrap();

        backend.advance_time(10_000);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_create_fault_consumed_in_order() {
        let plan = FaultPlan::new()
            .with_lifecycle_fault(LifecycleFault::FailNextCreate { count: 1 });
        let backend = SimBackend::new().with_fault_injector(FaultInjector::new(plan));

        assert_eq!(
            backend.task_create(noop, 1024, 10),
            Err(BackendError::Failure)
        );
        assert!(backend.task_create(noop, 1024, 10).is_ok());
    }

    #[test]
    fn test_task_exit_requires_calling_context() {
        let backend = SimBackend::new();
        assert_eq!(backend.task_exit(), Err(BackendError::Failure));

        let task = backend.task_create(noop, 1024, 10).unwrap();
        backend.set_current_task(Some(task));
        backend.task_exit().unwrap();
        assert_eq!(backend.current_task(), None);
        assert_eq!(backend.task_delete(task), Err(BackendError::Failure));
    }
}
