//! The generic resource table.
//!
//! Each object kind owns one fixed-capacity table of slots. A slot's
//! index is the externally meaningful position: allocation hands out the
//! lowest free index, and the index is reused after its object is
//! deleted. The slot's generation counter is bumped on every release so
//! an identifier that outlived its object is rejected instead of aliasing
//! the slot's next occupant.
//!
//! All mutation goes through this type; slot memory is never exposed.
//! The internal lock is held only for short table edits and lookups,
//! never across a backend call, which is what keeps a slow or blocking
//! kernel primitive from stalling every other caller of the same table.
//!
//! Allocation is a three-phase protocol:
//!
//! 1. [`reserve`](ResourceTable::reserve): one critical section scans
//!    occupied slots for the name and claims the lowest free slot as a
//!    placeholder. Reserved slots count as occupied for the uniqueness
//!    scan (so a concurrent creator with the same name loses) but are
//!    invisible to lookups until populated.
//! 2. [`populate`](ResourceTable::populate): after the backend object
//!    exists, fills in the handle, creator, and kind-specific fields.
//! 3. [`release`](ResourceTable::release): after the backend object is
//!    gone, resets the slot and bumps its generation.
//!
//! If the backend call between 1 and 2 fails,
//! [`abort_reservation`](ResourceTable::abort_reservation) returns the
//! slot to the free state; no exit path leaks a reservation.

use crate::error::OsalError;
use osal_types::{NativeHandle, ObjectName, RawId, TaskId};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    Reserved,
    Live,
}

struct Slot<T> {
    state: SlotState,
    generation: u32,
    name: ObjectName,
    native: Option<NativeHandle>,
    creator: Option<TaskId>,
    payload: T,
}

impl<T: Default> Slot<T> {
    fn reset(&mut self) {
        self.state = SlotState::Free;
        self.generation = self.generation.wrapping_add(1);
        self.name = ObjectName::default();
        self.native = None;
        self.creator = None;
        self.payload = T::default();
    }
}

/// Borrowed view of a live slot, handed to [`ResourceTable::read`]
/// closures.
pub(crate) struct SlotView<'a, T> {
    pub name: &'a ObjectName,
    pub creator: Option<TaskId>,
    pub native: Option<NativeHandle>,
    pub payload: &'a T,
}

/// Fixed-capacity slot table for one object kind.
pub(crate) struct ResourceTable<T> {
    slots: Mutex<Vec<Slot<T>>>,
}

impl<T: Default> ResourceTable<T> {
    /// Creates a table with every slot free.
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                state: SlotState::Free,
                generation: 0,
                name: ObjectName::default(),
                native: None,
                creator: None,
                payload: T::default(),
            })
            .collect();
        Self {
            slots: Mutex::new(slots),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Slot<T>>> {
        // A panic under the lock leaves slots structurally valid, so a
        // poisoned table stays usable.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the lowest free slot under `name`.
    ///
    /// The uniqueness scan and the reservation share one critical
    /// section: once a caller holds a reservation for a name, no
    /// concurrent caller can reserve the same name.
    pub fn reserve(&self, name: &ObjectName) -> Result<RawId, OsalError> {
        let mut slots = self.lock();
        if slots
            .iter()
            .any(|slot| slot.state != SlotState::Free && slot.name == *name)
        {
            return Err(OsalError::NameTaken);
        }
        let index = slots
            .iter()
            .position(|slot| slot.state == SlotState::Free)
            .ok_or(OsalError::NoFreeIds)?;
        let slot = &mut slots[index];
        slot.state = SlotState::Reserved;
        slot.name = name.clone();
        Ok(RawId::new(index as u32, slot.generation))
    }

    /// Fills a reserved slot and makes it visible to lookups.
    pub fn populate(
        &self,
        id: RawId,
        native: Option<NativeHandle>,
        creator: Option<TaskId>,
        payload: T,
    ) -> Result<(), OsalError> {
        let mut slots = self.lock();
        let slot = checked_slot_mut(slots.as_mut_slice(), id, SlotState::Reserved)?;
        slot.native = native;
        slot.creator = creator;
        slot.payload = payload;
        slot.state = SlotState::Live;
        Ok(())
    }

    /// Returns a reserved slot to the free state after a failed create.
    pub fn abort_reservation(&self, id: RawId) {
        let mut slots = self.lock();
        if let Ok(slot) = checked_slot_mut(slots.as_mut_slice(), id, SlotState::Reserved) {
            slot.reset();
        }
    }

    /// Frees a live slot. The caller must already have destroyed the
    /// backend object; a released slot's identifier goes stale.
    pub fn release(&self, id: RawId) -> Result<(), OsalError> {
        let mut slots = self.lock();
        let slot = checked_slot_mut(slots.as_mut_slice(), id, SlotState::Live)?;
        slot.reset();
        Ok(())
    }

    /// Reads a live slot through a closure.
    pub fn read<R>(
        &self,
        id: RawId,
        f: impl FnOnce(SlotView<'_, T>) -> R,
    ) -> Result<R, OsalError> {
        let slots = self.lock();
        let slot = checked_slot(slots.as_slice(), id)?;
        Ok(f(SlotView {
            name: &slot.name,
            creator: slot.creator,
            native: slot.native,
            payload: &slot.payload,
        }))
    }

    /// Edits a live slot's kind-specific fields through a closure.
    pub fn update<R>(&self, id: RawId, f: impl FnOnce(&mut T) -> R) -> Result<R, OsalError> {
        let mut slots = self.lock();
        let slot = checked_slot_mut(slots.as_mut_slice(), id, SlotState::Live)?;
        Ok(f(&mut slot.payload))
    }

    /// Returns a live slot's backend handle.
    pub fn native(&self, id: RawId) -> Result<NativeHandle, OsalError> {
        self.read(id, |slot| slot.native)?.ok_or(OsalError::InvalidId)
    }

    /// Finds the lowest-indexed live slot carrying `name`.
    pub fn find_by_name(&self, name: &ObjectName) -> Result<RawId, OsalError> {
        let slots = self.lock();
        slots
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.state == SlotState::Live && slot.name == *name)
            .map(|(index, slot)| RawId::new(index as u32, slot.generation))
            .ok_or(OsalError::NameNotFound)
    }

    /// Finds the live slot whose backend handle is `native`.
    pub fn find_by_native(&self, native: NativeHandle) -> Option<RawId> {
        let slots = self.lock();
        slots
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.state == SlotState::Live && slot.native == Some(native))
            .map(|(index, slot)| RawId::new(index as u32, slot.generation))
    }
}

fn checked_slot<'a, T>(slots: &'a [Slot<T>], id: RawId) -> Result<&'a Slot<T>, OsalError> {
    let slot = slots.get(id.index() as usize).ok_or(OsalError::InvalidId)?;
    if slot.state != SlotState::Live || slot.generation != id.generation() {
        return Err(OsalError::InvalidId);
    }
    Ok(slot)
}

fn checked_slot_mut<'a, T>(
    slots: &'a mut [Slot<T>],
    id: RawId,
    expected: SlotState,
) -> Result<&'a mut Slot<T>, OsalError> {
    let slot = slots
        .get_mut(id.index() as usize)
        .ok_or(OsalError::InvalidId)?;
    if slot.state != expected || slot.generation != id.generation() {
        return Err(OsalError::InvalidId);
    }
    Ok(slot)
}
