//! Order-preserving key encoding for ordered key-value stores.
//!
//! An ordered store exposes a flat, sorted map from byte strings to byte
//! strings. This crate projects structured keys onto that keyspace and
//! provides the arithmetic needed to scan it:
//!
//! - **Tuple encoding** ([`tuple`]): typed, heterogeneous tuples packed into
//!   bytes whose lexicographic order matches tuple order
//! - **Key utilities** ([`keyspace`]): raw key construction, successor and
//!   prefix-end computation, zero-copy segment splitting
//! - **Batching** ([`batch`]): splitting an index range into bounded batches,
//!   optionally shared across concurrent workers
//!
//! # Architecture
//!
//! ```text
//! Application (records, indexes, composite ids)
//!          ↓ Tuple::pack / Tuple::unpack
//! ┌─────────────────────────────────────┐
//! │  Tuple          Keyspace   Batch    │  this crate: pure, in-memory
//! └─────────────────────────────────────┘
//!          ↓ raw keys, range bounds, batch ranges
//!    Transport / storage engine
//! ```
//!
//! Everything here is pure and reentrant except [`batch::BatchCursor`], which
//! guards its shared position with a mutex.
//!
//! # Example
//!
//! ```
//! use keyspace_layer::{keyspace, tuple, Tuple};
//!
//! let user = tuple!("users", 42i64);
//! let begin = user.pack();
//! let end = keyspace::strinc(&begin).unwrap();
//!
//! let profile = user.append("profile").pack();
//! assert!(begin < profile && profile < end);
//! assert_eq!(Tuple::unpack(&profile).unwrap().last::<String>().unwrap(), "profile");
//! ```

pub mod batch;
pub mod constants;
pub mod keyspace;
pub mod tuple;

#[cfg(test)]
mod proptest;

pub use batch::BatchCursor;
pub use batch::Batched;
pub use batch::WorkerBatches;
pub use batch::batched;
pub use batch::batched_workers;
pub use keyspace::KeyError;
pub use tuple::Element;
pub use tuple::FromElement;
pub use tuple::IntoTuple;
pub use tuple::Tuple;
pub use tuple::TupleError;
pub use tuple::TupleResult;
