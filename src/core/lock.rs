//! Cooperative per-worker lock flag.
//!
//! A worker claims the lock by persisting its own flag and then re-reading
//! every slot. If any other slot also carries the flag, the claim is lost.
//! Only claims visible within one write/read cycle are detected: two workers
//! whose reads both precede the other's write will both believe they hold the
//! lock. A lost claim resets the flag in memory but leaves it set on disk
//! until the worker's next write.

use crate::core::handle::{BoardView, Worker};
use crate::core::{Error, Result};

impl Worker {
    pub fn acquire_lock(&mut self) -> Result<()> {
        self.slot_mut().lock = 1;
        self.write()?;
        self.read()?;

        let claims = self
            .records()
            .iter()
            .filter(|record| record.is_locked())
            .count();
        if claims > 1 {
            self.slot_mut().lock = 0;
            log::debug!(
                "worker {} lost lock contention ({claims} claims)",
                self.index()
            );
            return Err(Error::Locked);
        }
        Ok(())
    }

    pub fn unlock(&mut self) -> Result<()> {
        if self.holds_lock() {
            self.slot_mut().lock = 0;
            self.write()?;
        }
        Ok(())
    }

    /// The flag in this worker's snapshot. After a lost claim, any later
    /// `read()` reloads the stale on-disk flag and this reports `true` again
    /// until the worker writes its slot.
    pub fn holds_lock(&self) -> bool {
        self.slot().is_locked()
    }
}
