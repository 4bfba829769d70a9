use std::io::Write;
use std::path::Path;

use crate::core::clock::Clock;
use crate::core::record::{Record, Status};
use crate::core::table::SlotFile;
use crate::core::wait::{PollPolicy, Timeout};
use crate::core::{rendezvous, report, select};
use crate::core::{Error, Result};

/// In-memory mirror of every slot plus the open coordination file.
#[derive(Debug)]
pub struct Board {
    table: SlotFile,
    records: Vec<Record>,
    poll: PollPolicy,
}

impl Board {
    pub(crate) fn open(path: &Path, workers: usize, poll: PollPolicy) -> Result<Self> {
        let table = SlotFile::open(path, workers)?;
        Ok(Self {
            table,
            records: vec![Record::default(); workers],
            poll,
        })
    }

    /// Replaces the whole snapshot with the file contents, own slot included.
    pub fn read(&mut self) -> Result<()> {
        self.table.read_into(&mut self.records)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn workers(&self) -> usize {
        self.records.len()
    }

    pub fn path(&self) -> &Path {
        self.table.path()
    }

    pub fn poll(&self) -> PollPolicy {
        self.poll
    }

    fn write_slot(&mut self, index: usize) -> Result<()> {
        let record = self.records[index];
        self.table.write_slot(index, &record)
    }
}

/// Read-all and report capabilities shared by workers and monitors.
pub trait BoardView {
    fn board(&self) -> &Board;

    fn board_mut(&mut self) -> &mut Board;

    fn read(&mut self) -> Result<()> {
        self.board_mut().read()
    }

    fn records(&self) -> &[Record] {
        self.board().records()
    }

    fn workers(&self) -> usize {
        self.board().workers()
    }

    fn path(&self) -> &Path {
        self.board().path()
    }

    /// Every non-empty published value, in slot order.
    fn values(&mut self) -> Result<Vec<String>> {
        let board = self.board_mut();
        board.read()?;
        Ok(board
            .records()
            .iter()
            .filter(|record| record.has_value())
            .map(|record| record.value().into_owned())
            .collect())
    }

    /// Writes the status table of every slot to `out`.
    fn status(&mut self, out: &mut dyn Write) -> Result<()> {
        let board = self.board_mut();
        board.read()?;
        report::render(board.records(), out)
    }

    /// Waits until no slot is still unannounced; returns the ready count.
    fn rendezvous(&mut self, timeout: Timeout) -> Result<usize> {
        rendezvous::wait_all(self.board_mut(), timeout)
    }

    /// Routes `key` to a ready worker, blocking until one exists.
    fn select(&mut self, key: &str) -> Result<usize> {
        select::select(self.board_mut(), key)
    }

    fn try_select(&mut self, key: &str) -> Result<Option<usize>> {
        select::try_select(self.board_mut(), key)
    }
}

/// A participant owning one slot of the coordination file.
///
/// Opening marks the slot `Ready`. Closing (or dropping) clears a held lock
/// and marks it `Stopped`.
#[derive(Debug)]
pub struct Worker {
    board: Board,
    index: usize,
    closed: bool,
}

impl Worker {
    pub fn open(index: usize, path: impl AsRef<Path>, workers: usize) -> Result<Self> {
        Self::open_with(index, path, workers, PollPolicy::default())
    }

    pub fn open_with(
        index: usize,
        path: impl AsRef<Path>,
        workers: usize,
        poll: PollPolicy,
    ) -> Result<Self> {
        if index >= workers {
            return Err(Error::InvalidWorker { index, workers });
        }
        let mut worker = Self {
            board: Board::open(path.as_ref(), workers, poll)?,
            index,
            closed: false,
        };
        *worker.slot_mut() = Record::ready();
        worker.write()?;
        log::debug!(
            "worker {index} ready in {}",
            worker.board.path().display()
        );
        Ok(worker)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The local copy of this worker's slot, including unwritten changes.
    pub fn slot(&self) -> &Record {
        &self.board.records[self.index]
    }

    pub(crate) fn slot_mut(&mut self) -> &mut Record {
        &mut self.board.records[self.index]
    }

    pub fn set_status(&mut self, status: Status) {
        let index = self.index;
        let slot = self.slot_mut();
        if slot.status == Status::Stopped && status != Status::Stopped {
            log::warn!("worker {index} is stopped, ignoring transition to {status}");
            return;
        }
        slot.status = status;
    }

    pub fn set_time(&mut self, time: u64) {
        self.slot_mut().time = time;
    }

    pub fn set_name(&mut self, name: &str) {
        self.set_name_bytes(name.as_bytes());
    }

    pub fn set_name_bytes(&mut self, name: &[u8]) {
        self.slot_mut().set_name(name);
    }

    pub fn set_data(&mut self, value: &[u8]) {
        self.slot_mut().set_value(value);
    }

    /// Persists this worker's slot, and only it.
    pub fn write(&mut self) -> Result<()> {
        self.board.write_slot(self.index)
    }

    pub fn heartbeat(&mut self, clock: &impl Clock) -> Result<()> {
        self.set_time(clock.now());
        self.write()
    }

    /// Releases the slot and reports any failure, unlike a plain drop.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.retire()
    }

    fn retire(&mut self) -> Result<()> {
        self.unlock()?;
        self.slot_mut().status = Status::Stopped;
        self.write()?;
        log::debug!("worker {} stopped", self.index);
        Ok(())
    }
}

impl BoardView for Worker {
    fn board(&self) -> &Board {
        &self.board
    }

    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.retire() {
            log::warn!("worker {} failed to mark itself stopped: {err}", self.index);
        }
    }
}

/// An observer of every slot that owns none of them.
#[derive(Debug)]
pub struct Monitor {
    board: Board,
}

impl Monitor {
    pub fn open(path: impl AsRef<Path>, workers: usize) -> Result<Self> {
        Self::open_with(path, workers, PollPolicy::default())
    }

    pub fn open_with(path: impl AsRef<Path>, workers: usize, poll: PollPolicy) -> Result<Self> {
        Ok(Self {
            board: Board::open(path.as_ref(), workers, poll)?,
        })
    }
}

impl BoardView for Monitor {
    fn board(&self) -> &Board {
        &self.board
    }

    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}
