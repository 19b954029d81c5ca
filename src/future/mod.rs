//! Futures for bridging groups and `async` code.
//!
//! A [`Group`][crate::Group] is driven by callbacks, but it is often handy to
//! feed a slot from a future, or to await a group's terminal state:
//!
//! | Name      | Created by                                   | Output              |
//! | ---       | ---                                          | ---                 |
//! | `Fill`    | [`Group::slot_future`][crate::Group::slot_future] | `()`, fills a slot |
//! | `Settled` | [`Group::settled`][crate::Group::settled]     | `Result<Vec<T>, E>` |
pub use fill::Fill;
pub use settled::Settled;

mod fill;
mod settled;
