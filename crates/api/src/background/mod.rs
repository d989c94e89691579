//! Long-running jobs spawned next to the server.
//!
//! Every job takes a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! and returns once it fires.

pub mod session_cleanup;
