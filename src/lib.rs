//! Growable groups of error-first completions, resolved as a single unit.
//!
//! A [`Group`] lets a caller fan out any number of asynchronous operations,
//! not known in advance, collect their results by position, and run a
//! continuation once all of them complete. The first error short-circuits
//! the whole group.
//!
//! # Operations
//!
//! - [`Group::slot`]: reserve a position and get a single-use completion handle.
//! - [`Group::pass`]: fill positions with values which are already known.
//! - [`Group::make_group`]: fill one position with the values of a child group.
//! - [`Group::then`] and [`Group::anyway`]: observe the terminal state.
//! - [`Group::fcall`] and [`Group::chain`]: run a body which reserves slots,
//!   routing its errors into the group.
//! - [`Group::and_then`]: start a new group once this one is fulfilled.
//! - [`Group::error`] and [`Group::resolve`]: resolve the group by hand.
//!
//! # Scheduling
//!
//! Groups are single-threaded. Every slot completion is deferred to a
//! [`Schedule`] implementation, so a continuation never runs inside the call
//! which filled the last slot. [`LocalQueue`] is a ready-made FIFO run loop.
//!
//! # Examples
//!
//! ```rust
//! use futures_group::prelude::*;
//!
//! let queue = LocalQueue::new();
//! let group: Group<u32, String> = Group::chain(queue.clone(), |group| {
//!     let a = group.slot();
//!     let b = group.slot();
//!     // Complete in reverse; values still arrive in reservation order.
//!     b.ok(2);
//!     a.ok(1);
//!     Ok(())
//! });
//!
//! assert_eq!(queue.run_until(group.settled()), Ok(vec![1, 2]));
//! ```
//!
//! # Limitations
//!
//! There is no timeout and no cancellation: a group with a slot which is
//! never filled stays pending forever.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]

extern crate alloc;

mod utils;

/// The futures group prelude.
pub mod prelude {
    pub use super::group::{Group, GroupStatus, Outcome, Slot};
    pub use super::schedule::{LocalQueue, Schedule};
}

pub mod future;
pub mod group;
pub mod schedule;

pub use group::{Group, GroupStatus, Outcome, Slot};
pub use schedule::{LocalQueue, Schedule, Task};
