//! Asynchronous work dispatch.
//!
//! This crate provides the [`Dispatcher`], a fixed-size worker pool backed by
//! an unbounded FIFO queue. Storage operations submitted through
//! [`Dispatcher::dispatch`] run on a pool worker, never on the caller's
//! thread, and deliver their outcome to a caller-supplied continuation.
//!
//! # Guarantees
//!
//! - The caller returns immediately after enqueueing.
//! - Work units are *started* in submission order; completion order across
//!   workers is unspecified.
//! - The continuation is invoked exactly once per dispatched unit.
//! - There is no cancellation primitive and no timeout; a work unit that
//!   blocks on external I/O occupies its worker until it finishes.

pub mod dispatcher;

pub use dispatcher::Dispatcher;
