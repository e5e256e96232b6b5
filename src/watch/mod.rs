//! Watchpoint registry
//!
//! A fixed-capacity pool of watched expressions. Each watchpoint keeps its
//! expression text and the value it last evaluated to; after every
//! execution step the registry re-evaluates each active entry against the
//! machine and reports the first one whose value moved.
//!
//! Slots live in a preallocated arena and are handed out through a
//! free-index stack. A watchpoint's id is its slot index: stable while the
//! watchpoint is alive, reused by a later watchpoint after deletion, and
//! never colliding with another active id.

use crate::expr::eval::evaluate;
use crate::machine::MachineState;
use std::fmt;

/// Pool capacity of [`WatchpointRegistry::new`].
pub const DEFAULT_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
struct Slot {
    expr: String,
    last_value: i64,
}

/// Fixed-capacity registry of watched expressions.
#[derive(Debug)]
pub struct WatchpointRegistry {
    /// Slot arena; `None` marks a free slot. The index is the id.
    slots: Vec<Option<Slot>>,
    /// Active ids, most recently added first.
    active: Vec<usize>,
    /// Free ids, next allocation on top.
    free: Vec<usize>,
}

/// Registry failures the caller can recover from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Every slot is active. The fixed capacity is a deliberate bound,
    /// not an allocation failure.
    PoolExhausted { capacity: usize },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::PoolExhausted { capacity } => {
                write!(f, "all {} watchpoint slots are in use", capacity)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

impl WatchpointRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A registry with a fixed pool of `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            active: Vec::with_capacity(capacity),
            // Reversed so ids are handed out from 0 upward.
            free: (0..capacity).rev().collect(),
        }
    }

    /// Bind `expr` with its current value and return the new watchpoint's
    /// id, drawn from the free slots.
    pub fn add(&mut self, expr: &str, initial_value: i64) -> Result<usize, RegistryError> {
        let id = self.free.pop().ok_or(RegistryError::PoolExhausted {
            capacity: self.slots.len(),
        })?;
        self.slots[id] = Some(Slot {
            expr: expr.to_string(),
            last_value: initial_value,
        });
        self.active.insert(0, id);
        Ok(id)
    }

    /// Remove the watchpoint with the given id, returning its slot to the
    /// free pool. Returns `false` when no active watchpoint has that id.
    pub fn delete(&mut self, id: usize) -> bool {
        let Some(position) = self.active.iter().position(|&active| active == id) else {
            return false;
        };
        self.active.remove(position);
        self.slots[id] = None;
        self.free.push(id);
        true
    }

    /// Re-evaluate every active watchpoint in list order and report the
    /// first whose value changed, updating its stored value and ending
    /// the scan there. An expression that no longer evaluates is treated
    /// as unchanged, never as an error.
    pub fn scan_for_change<M: MachineState + ?Sized>(&mut self, machine: &M) -> Option<usize> {
        for index in 0..self.active.len() {
            let id = self.active[index];
            let Some(slot) = self.slots[id].as_ref() else {
                continue;
            };
            let Ok(value) = evaluate(&slot.expr, machine) else {
                continue;
            };
            if value != slot.last_value {
                if let Some(slot) = self.slots[id].as_mut() {
                    slot.last_value = value;
                }
                return Some(id);
            }
        }
        None
    }

    /// Active watchpoints as `(id, last_value, expression)`, most
    /// recently added first.
    pub fn iter(&self) -> impl Iterator<Item = (usize, i64, &str)> + '_ {
        self.active.iter().filter_map(move |&id| {
            self.slots[id]
                .as_ref()
                .map(|slot| (id, slot.last_value, slot.expr.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl Default for WatchpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}
