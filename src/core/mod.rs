//! Worker slot table shared through a single file.
//!
//! Every participant maps the same fixed-size array of [`Record`]s, one per
//! worker index, and coordinates purely by writing its own slot and
//! re-reading the whole file.

pub mod bootstrap;
pub mod clock;
pub mod error;
pub mod handle;
pub mod init;
mod lock;
pub mod record;
mod rendezvous;
pub mod report;
pub mod select;
pub mod table;
pub mod wait;

pub use bootstrap::{open, open_monitor, open_worker, BoardConfig, Handle, InitMethod, Role};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, ErrorKind, Result};
pub use handle::{Board, BoardView, Monitor, Worker};
pub use init::{init, init_free_for_all, init_free_for_all_with, lock_path, InitOutcome};
pub use record::{Record, Status, NAME_SIZE, RECORD_SIZE, VALUE_SIZE};
pub use wait::{PollPolicy, Timeout};
