use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::handle::{Board, BoardView, Monitor, Worker};
use crate::core::init::{init, init_free_for_all_with, InitOutcome};
use crate::core::wait::{PollPolicy, Timeout};
use crate::core::Result;

/// How a participant makes sure the coordination file exists before opening it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InitMethod {
    /// Race-safe: every participant may call it, one initializes.
    #[default]
    FreeForAll,
    /// Unconditional and destructive; for a single designated process.
    Zero,
    /// Assume the file was prepared beforehand.
    None,
}

impl InitMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            InitMethod::FreeForAll => "FFA",
            InitMethod::Zero => "Zero",
            InitMethod::None => "None",
        }
    }
}

impl fmt::Display for InitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for InitMethod {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "ffa" | "free-for-all" => Ok(InitMethod::FreeForAll),
            "zero" => Ok(InitMethod::Zero),
            "none" => Ok(InitMethod::None),
            other => Err(format!("unknown init method: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Worker(usize),
    Monitor,
}

#[derive(Clone, Debug)]
pub struct BoardConfig {
    pub path: PathBuf,
    pub workers: usize,
    /// Initializer to run before opening; unset means the role's default
    /// (`FreeForAll` for workers, `None` for monitors).
    pub init: Option<InitMethod>,
    pub timeout: Timeout,
    pub poll: PollPolicy,
}

impl BoardConfig {
    pub fn new(path: impl Into<PathBuf>, workers: usize) -> Self {
        Self {
            path: path.into(),
            workers,
            init: None,
            timeout: Timeout::default(),
            poll: PollPolicy::default(),
        }
    }

    pub fn with_init(mut self, init: InitMethod) -> Self {
        self.init = Some(init);
        self
    }

    pub fn with_timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.timeout = timeout.into();
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn init_method(&self, role: Role) -> InitMethod {
        self.init.unwrap_or(match role {
            Role::Worker(_) => InitMethod::FreeForAll,
            Role::Monitor => InitMethod::None,
        })
    }

    /// Runs the initializer for `role`. `None` when nothing was attempted.
    pub fn prepare(&self, role: Role) -> Result<Option<InitOutcome>> {
        match self.init_method(role) {
            InitMethod::FreeForAll => {
                init_free_for_all_with(&self.path, self.workers, self.timeout, self.poll).map(Some)
            }
            InitMethod::Zero => {
                init(&self.path, self.workers)?;
                Ok(Some(InitOutcome::Initialized))
            }
            InitMethod::None => Ok(None),
        }
    }
}

pub fn open_worker(config: &BoardConfig, index: usize) -> Result<Worker> {
    config.prepare(Role::Worker(index))?;
    Worker::open_with(index, &config.path, config.workers, config.poll)
}

pub fn open_monitor(config: &BoardConfig) -> Result<Monitor> {
    config.prepare(Role::Monitor)?;
    Monitor::open_with(&config.path, config.workers, config.poll)
}

pub fn open(config: &BoardConfig, role: Role) -> Result<Handle> {
    match role {
        Role::Worker(index) => open_worker(config, index).map(Handle::Worker),
        Role::Monitor => open_monitor(config).map(Handle::Monitor),
    }
}

/// Either participant, for callers that pick the role at runtime.
///
/// Slot-owning operations succeed without effect on a monitor.
#[derive(Debug)]
pub enum Handle {
    Worker(Worker),
    Monitor(Monitor),
}

impl Handle {
    pub fn role(&self) -> Role {
        match self {
            Handle::Worker(worker) => Role::Worker(worker.index()),
            Handle::Monitor(_) => Role::Monitor,
        }
    }

    pub fn as_worker_mut(&mut self) -> Option<&mut Worker> {
        match self {
            Handle::Worker(worker) => Some(worker),
            Handle::Monitor(_) => None,
        }
    }

    pub fn write(&mut self) -> Result<()> {
        match self {
            Handle::Worker(worker) => worker.write(),
            Handle::Monitor(_) => Ok(()),
        }
    }

    pub fn acquire_lock(&mut self) -> Result<()> {
        match self {
            Handle::Worker(worker) => worker.acquire_lock(),
            Handle::Monitor(_) => Ok(()),
        }
    }

    pub fn unlock(&mut self) -> Result<()> {
        match self {
            Handle::Worker(worker) => worker.unlock(),
            Handle::Monitor(_) => Ok(()),
        }
    }

    pub fn close(self) -> Result<()> {
        match self {
            Handle::Worker(worker) => worker.close(),
            Handle::Monitor(_) => Ok(()),
        }
    }
}

impl BoardView for Handle {
    fn board(&self) -> &Board {
        match self {
            Handle::Worker(worker) => worker.board(),
            Handle::Monitor(monitor) => monitor.board(),
        }
    }

    fn board_mut(&mut self) -> &mut Board {
        match self {
            Handle::Worker(worker) => worker.board_mut(),
            Handle::Monitor(monitor) => monitor.board_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::Status;
    use tempfile::tempdir;

    #[test]
    fn init_method_names_round_trip() {
        for method in [InitMethod::FreeForAll, InitMethod::Zero, InitMethod::None] {
            assert_eq!(method.as_str().parse::<InitMethod>(), Ok(method));
        }
        assert_eq!("free-for-all".parse::<InitMethod>(), Ok(InitMethod::FreeForAll));
        assert!("eager".parse::<InitMethod>().is_err());
    }

    #[test]
    fn monitor_handle_ignores_slot_operations() {
        let dir = tempdir().expect("tempdir");
        let config =
            BoardConfig::new(dir.path().join("status"), 2).with_init(InitMethod::FreeForAll);
        let mut handle = open(&config, Role::Monitor).expect("monitor");
        assert_eq!(handle.role(), Role::Monitor);
        assert!(handle.as_worker_mut().is_none());
        handle.write().expect("write");
        handle.acquire_lock().expect("lock");
        handle.unlock().expect("unlock");
        handle.read().expect("read");
        assert!(handle.records().iter().all(|r| r.status == Status::None));
    }

    #[test]
    fn monitor_defaults_to_no_initialization() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("status");
        let config = BoardConfig::new(&path, 2);
        assert_eq!(config.init_method(Role::Monitor), InitMethod::None);
        assert_eq!(config.init_method(Role::Worker(0)), InitMethod::FreeForAll);
        assert!(matches!(
            open_monitor(&config),
            Err(crate::core::Error::MissingFile(_))
        ));
        assert!(!path.exists());

        let _worker = open_worker(&config, 1).expect("worker creates table");
        let mut monitor = open_monitor(&config).expect("monitor");
        monitor.read().expect("read");
        assert_eq!(monitor.records()[1].status, Status::Ready);
    }

    #[test]
    fn zero_method_resets_existing_table() {
        let dir = tempdir().expect("tempdir");
        let config = BoardConfig::new(dir.path().join("status"), 2);
        let worker = open_worker(&config, 0).expect("worker");
        worker.close().expect("close");

        let zero = config.clone().with_init(InitMethod::Zero);
        let mut monitor = open_monitor(&zero).expect("monitor");
        monitor.read().expect("read");
        assert!(monitor.records().iter().all(|r| r.status == Status::None));
    }

    #[test]
    fn none_method_requires_existing_file() {
        let dir = tempdir().expect("tempdir");
        let config = BoardConfig::new(dir.path().join("status"), 2).with_init(InitMethod::None);
        assert!(matches!(
            open_worker(&config, 0),
            Err(crate::core::Error::MissingFile(_))
        ));
    }
}
