//! Creation of the coordination file.
//!
//! [`init`] is the unconditional, destructive path meant for a single
//! designated process. [`init_free_for_all`] may be called by every racing
//! process: one of them wins a first-writer-wins election on a shared lock
//! file and initializes, the others wait for the lock file to disappear.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::core::clock::{Clock, SystemClock};
use crate::core::record::Record;
use crate::core::table::exists_writable;
use crate::core::wait::{PollPolicy, Timeout};
use crate::core::{Error, Result};

const LOCK_SUFFIX: &str = ".lock";
const INIT_SUFFIX: &str = ".init";

/// Which role a caller of [`init_free_for_all`] ended up playing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    /// The file already existed and was left untouched.
    AlreadyInitialized,
    /// This caller won the election and wrote the zeroed table.
    Initialized,
    /// Another caller held the election lock; this one waited for it to finish.
    Waited,
}

/// Writes `workers` zero records to `path`, replacing any previous contents.
///
/// The file is truncated in place, so handles opened before the reset keep
/// observing the same table.
pub fn init(path: &Path, workers: usize) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|err| Error::read_only(path, err))?;
    write_zeroed(file, path, workers)?;
    log::info!("initialized {} with {workers} slots", path.display());
    Ok(())
}

/// Builds the table under a sibling temp name and renames it into place.
///
/// Used when the file does not exist yet, so an opener racing the leader sees
/// either no file or a complete one.
fn create_table(path: &Path, workers: usize) -> Result<()> {
    let tmp_path = sibling(path, &format!("{INIT_SUFFIX}_{}", unique_token()));
    let result = File::create(&tmp_path)
        .map_err(|err| Error::read_only(&tmp_path, err))
        .and_then(|file| write_zeroed(file, &tmp_path, workers))
        .and_then(|()| std::fs::rename(&tmp_path, path).map_err(|err| Error::read_only(path, err)));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result?;
    log::info!("created {} with {workers} slots", path.display());
    Ok(())
}

fn write_zeroed(mut file: File, path: &Path, workers: usize) -> Result<()> {
    let zero = Record::default().to_bytes();
    let mut table = Vec::with_capacity(zero.len() * workers);
    for _ in 0..workers {
        table.extend_from_slice(&zero);
    }
    file.write_all(&table)
        .map_err(|err| Error::read_only(path, err))?;
    file.sync_all().map_err(|err| Error::read_only(path, err))?;
    Ok(())
}

/// Race-safe initialization, see the module docs.
pub fn init_free_for_all(path: &Path, workers: usize, timeout: Timeout) -> Result<InitOutcome> {
    init_free_for_all_with(path, workers, timeout, PollPolicy::default())
}

pub fn init_free_for_all_with(
    path: &Path,
    workers: usize,
    timeout: Timeout,
    poll: PollPolicy,
) -> Result<InitOutcome> {
    if exists_writable(path) {
        return Ok(InitOutcome::AlreadyInitialized);
    }

    let lock = match ElectionLock::acquire(path) {
        Ok(lock) => lock,
        Err(Error::Locked) => {
            log::debug!("lost init election for {}, waiting", path.display());
            wait_for_lock(&lock_path(path), timeout, poll)?;
            return Ok(InitOutcome::Waited);
        }
        Err(err) => return Err(err),
    };

    // A late racer can win after an earlier leader already finished.
    if exists_writable(path) {
        log::debug!("won init election for {} after it was initialized", path.display());
        return Ok(InitOutcome::AlreadyInitialized);
    }
    create_table(path, workers)?;
    drop(lock);
    Ok(InitOutcome::Initialized)
}

/// Polls until `lock` no longer exists or the budget runs out.
pub fn wait_for_lock(lock: &Path, timeout: Timeout, poll: PollPolicy) -> Result<()> {
    let mut poller = poll.poller(timeout);
    while lock_present(lock)? {
        poller.sleep();
        if poller.expired() {
            return Err(Error::TimedOut {
                polls: poller.passed(),
            });
        }
    }
    Ok(())
}

fn lock_present(lock: &Path) -> Result<bool> {
    match std::fs::symlink_metadata(lock) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(Error::Io(err)),
    }
}

/// Name of the election lock shared by every racer for `path`.
pub fn lock_path(path: &Path) -> PathBuf {
    sibling(path, LOCK_SUFFIX)
}

/// Election lock file owned by the leader; removed on drop.
#[derive(Debug)]
pub struct ElectionLock {
    path: PathBuf,
}

impl ElectionLock {
    /// Publishes a uniquely named temp file under the shared lock name.
    ///
    /// `rename(2)` would replace an existing lock, so the publish is a hard
    /// link, which fails when the name is taken, followed by removing the
    /// temp name. Exactly one racer succeeds.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock = lock_path(path);
        let mut tmp_name = lock.file_name().map(OsString::from).unwrap_or_default();
        tmp_name.push(format!("_{}", unique_token()));
        let tmp = lock.with_file_name(tmp_name);

        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp)
            .map_err(|err| Error::read_only(&tmp, err))?;

        let linked = std::fs::hard_link(&tmp, &lock);
        let _ = std::fs::remove_file(&tmp);
        match linked {
            Ok(()) => {
                log::info!("won init election for {}", path.display());
                Ok(Self { path: lock })
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Err(Error::Locked),
            Err(err) => Err(Error::read_only(&lock, err)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ElectionLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                log::warn!("failed to remove election lock {}: {err}", self.path.display());
            }
        }
    }
}

/// Current time mixed with the process id and a random value.
fn unique_token() -> u64 {
    let pid = u64::from(std::process::id()).rotate_left(32);
    SystemClock.now() ^ pid ^ rand::random::<u64>()
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("slotboard"));
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::table_len;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn lock_path_is_sibling_of_table() {
        let lock = lock_path(Path::new("/run/jobs/status"));
        assert_eq!(lock, PathBuf::from("/run/jobs/status.lock"));
    }

    #[test]
    fn init_overwrites_existing_contents() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("status");
        std::fs::write(&path, b"stale bytes that are not a table").expect("seed");
        init(&path, 4).expect("init");
        let bytes = std::fs::read(&path).expect("read");
        assert_eq!(bytes.len() as u64, table_len(4));
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn reinit_keeps_earlier_handles_attached() {
        use crate::core::handle::{BoardView, Monitor, Worker};
        use crate::core::record::Status;

        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("status");
        init(&path, 2).expect("init");
        let mut monitor = Monitor::open(&path, 2).expect("monitor");

        init(&path, 2).expect("reinit");
        let _worker = Worker::open(0, &path, 2).expect("worker");
        monitor.read().expect("read");
        assert_eq!(monitor.records()[0].status, Status::Ready);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn init_on_full_device_is_read_only_filesystem() {
        let err = init(Path::new("/dev/full"), 4).unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::ReadOnlyFilesystem);
    }

    #[test]
    fn free_for_all_leaves_no_temp_files() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("status");
        init_free_for_all(&path, 2, Timeout::Unbounded).expect("ffa");
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(entries, vec![OsString::from("status")]);
    }

    #[test]
    fn init_fails_on_missing_directory() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("no-such-dir").join("status");
        let err = init(&path, 2).unwrap_err();
        assert!(matches!(err, Error::ReadOnlyFilesystem { .. }));
    }

    #[test]
    fn second_election_is_locked_until_first_drops() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("status");
        let leader = ElectionLock::acquire(&path).expect("leader");
        assert!(leader.path().exists());
        assert!(matches!(ElectionLock::acquire(&path), Err(Error::Locked)));
        drop(leader);
        assert!(!lock_path(&path).exists());
        ElectionLock::acquire(&path).expect("re-elect");
    }

    #[test]
    fn losing_election_leaves_no_temp_files() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("status");
        let _leader = ElectionLock::acquire(&path).expect("leader");
        for _ in 0..3 {
            let _ = ElectionLock::acquire(&path);
        }
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(entries, vec![OsString::from("status.lock")]);
    }

    #[test]
    fn wait_for_lock_times_out_while_held() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("status");
        let _leader = ElectionLock::acquire(&path).expect("leader");
        let err = wait_for_lock(
            &lock_path(&path),
            Timeout::Polls(3),
            PollPolicy::every(Duration::ZERO),
        )
        .unwrap_err();
        assert!(matches!(err, Error::TimedOut { polls: 4 }));
    }

    #[test]
    fn free_for_all_initializes_once() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("status");
        assert_eq!(
            init_free_for_all(&path, 3, Timeout::Unbounded).expect("first"),
            InitOutcome::Initialized
        );
        assert!(!lock_path(&path).exists());
        assert_eq!(
            init_free_for_all(&path, 3, Timeout::Unbounded).expect("second"),
            InitOutcome::AlreadyInitialized
        );
    }
}
