use hantek6022::device::{list_devices, DeviceInfo};
use log::{debug, warn};
use snafu::Report;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use tokio::sync::RwLock;

const SCAN_INTERVAL: Duration = Duration::from_secs(1);

pub type DeviceList = Arc<RwLock<Vec<DeviceInfo>>>;

/// Keeps a list of connected scopes up to date from a background thread.
pub struct DeviceSelector {
    list: DeviceList,
    stop: Arc<AtomicBool>,
    scanner: Option<JoinHandle<()>>,
}

impl DeviceSelector {
    pub fn list(&self) -> &DeviceList {
        &self.list
    }

    pub fn new(update_ui: impl Fn() + Send + 'static) -> std::io::Result<Self> {
        let list: DeviceList = Arc::new(RwLock::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let scanner = thread::Builder::new().name("device-scan".into()).spawn({
            let list = list.clone();
            let stop = stop.clone();
            move || {
                let mut failing = false;
                while !stop.load(Ordering::Relaxed) {
                    match list_devices() {
                        Ok(found) => {
                            failing = false;
                            if *list.blocking_read() != found {
                                debug!("devices: {found:?}");
                                *list.blocking_write() = found;
                                update_ui();
                            }
                        }
                        Err(e) => {
                            if !failing {
                                warn!("scanning for devices: {}", Report::from_error(e));
                            }
                            failing = true;
                        }
                    }
                    thread::park_timeout(SCAN_INTERVAL);
                }
            }
        })?;

        Ok(Self {
            list,
            stop,
            scanner: Some(scanner),
        })
    }
}

impl Drop for DeviceSelector {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(scanner) = self.scanner.take() {
            scanner.thread().unpark();
            let _ = scanner.join();
        }
    }
}
