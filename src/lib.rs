//! File-backed worker slot table for cross-process rendezvous and task routing.

pub mod core;

pub use crate::core::{
    init, init_free_for_all, open, open_monitor, open_worker, BoardConfig, BoardView, Error,
    ErrorKind, Handle, InitMethod, InitOutcome, Monitor, PollPolicy, Record, Result, Role, Status,
    Timeout, Worker,
};
