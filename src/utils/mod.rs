//! Utilities to implement the group state machine.

mod slots;

pub(crate) use slots::SlotTable;
