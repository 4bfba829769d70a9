use crate::core::handle::Board;
use crate::core::record::{Record, Status};
use crate::core::wait::Timeout;
use crate::core::Result;

/// Polls until every slot is `Ready` or `Stopped` and returns the ready count.
///
/// Stopped workers count toward completion. A bounded timeout is soft: once
/// exceeded, the last observed ready count is returned instead of an error.
pub(crate) fn wait_all(board: &mut Board, timeout: Timeout) -> Result<usize> {
    let workers = board.workers();
    let mut poller = board.poll().poller(timeout);
    let mut first = true;
    loop {
        if !first {
            poller.sleep();
        }
        first = false;

        board.read()?;
        let (ready, stopped) = count(board.records());
        if ready + stopped == workers {
            log::debug!("rendezvous complete: {ready} ready, {stopped} stopped");
            return Ok(ready);
        }
        if poller.expired() {
            log::debug!(
                "rendezvous gave up after {} polls: {ready} ready, {stopped} stopped of {workers}",
                poller.passed()
            );
            return Ok(ready);
        }
    }
}

fn count(records: &[Record]) -> (usize, usize) {
    records
        .iter()
        .fold((0, 0), |(ready, stopped), record| match record.status {
            Status::Ready => (ready + 1, stopped),
            Status::Stopped => (ready, stopped + 1),
            Status::None => (ready, stopped),
        })
}
