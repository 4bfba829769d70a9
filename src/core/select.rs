use crate::core::handle::Board;
use crate::core::record::{Record, Status};
use crate::core::wait::Timeout;
use crate::core::Result;

/// Start of the probe sequence for `key`: CRC-32 of its bytes, reduced mod `workers`.
///
/// CRC-32 is fixed by definition, so every process and build agrees on it.
/// An empty table has no start.
pub fn key_offset(key: &str, workers: usize) -> Option<usize> {
    if workers == 0 {
        return None;
    }
    Some(crc32fast::hash(key.as_bytes()) as usize % workers)
}

/// First `Ready` slot at or after `start`, wrapping around once.
pub fn probe(records: &[Record], start: usize) -> Option<usize> {
    let workers = records.len();
    (0..workers)
        .map(|step| (start + step) % workers)
        .find(|&index| records[index].status == Status::Ready)
}

pub(crate) fn try_select(board: &mut Board, key: &str) -> Result<Option<usize>> {
    let Some(start) = key_offset(key, board.workers()) else {
        return Ok(None);
    };
    board.read()?;
    Ok(probe(board.records(), start))
}

/// Blocks until some slot is ready. Readiness is only re-checked between
/// passes, never mid-probe.
pub(crate) fn select(board: &mut Board, key: &str) -> Result<usize> {
    let mut poller = board.poll().poller(Timeout::Unbounded);
    loop {
        if let Some(index) = try_select(board, key)? {
            log::debug!("key {key:?} routed to worker {index}");
            return Ok(index);
        }
        poller.sleep();
    }
}
