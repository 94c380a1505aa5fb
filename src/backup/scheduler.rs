//! Daily scheduled export
//!
//! Runs on a dedicated OS thread. The thread sleeps on its command channel
//! until the next fire time (re-checked at least once a minute so clock
//! changes are picked up), exports the database and hands the document to a
//! [`BackupSink`].

use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};

use super::{backup_file_name, export_json};
use crate::store::Store;

/// Longest single wait before the clock is looked at again
const MAX_WAIT: Duration = Duration::from_secs(60);

/// Destination for exported documents
pub trait BackupSink: Send + Sync {
    /// Deliver one document. Returns how many recipients received it.
    fn deliver(&self, file_name: &str, json: &str) -> anyhow::Result<usize>;
}

/// First fire time strictly after `now`
pub fn next_fire_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        // Day after `now`; chrono only fails at the end of its range
        now.date()
            .succ_opt()
            .map(|d| d.and_time(at))
            .unwrap_or(today)
    }
}

/// Commands sent to the scheduler thread
enum SchedulerCommand {
    Shutdown,
}

/// Background daily exporter
pub struct BackupScheduler {
    tx: SyncSender<SchedulerCommand>,
    handle: Option<JoinHandle<()>>,
}

impl BackupScheduler {
    /// Spawn the scheduler thread firing every day at `at` local time
    pub fn new(store: Store, at: NaiveTime, sink: Arc<dyn BackupSink>) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::sync_channel::<SchedulerCommand>(4);

        let handle = thread::Builder::new()
            .name("backup-scheduler".into())
            .spawn(move || Self::scheduler_thread(rx, store, at, sink))?;

        tracing::info!("Daily backup scheduled at {}", at.format("%H:%M"));
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for it
    pub fn shutdown(mut self) {
        let _ = self.tx.send(SchedulerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        tracing::debug!("Backup scheduler stopped");
    }

    fn scheduler_thread(
        rx: mpsc::Receiver<SchedulerCommand>,
        store: Store,
        at: NaiveTime,
        sink: Arc<dyn BackupSink>,
    ) {
        let mut next = next_fire_after(Local::now().naive_local(), at);

        loop {
            let now = Local::now().naive_local();
            if now >= next {
                run_once(&store, sink.as_ref(), now);
                next = next_fire_after(now, at);
                continue;
            }

            let wait = (next - now).to_std().unwrap_or(MAX_WAIT).min(MAX_WAIT);
            match rx.recv_timeout(wait) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(SchedulerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

impl Drop for BackupScheduler {
    fn drop(&mut self) {
        let _ = self.tx.send(SchedulerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Export and deliver once; failures are logged
pub fn run_once(store: &Store, sink: &dyn BackupSink, now: NaiveDateTime) {
    let json = match export_json(store) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Scheduled backup export failed: {:#}", e);
            return;
        }
    };
    let file_name = backup_file_name(now);
    match sink.deliver(&file_name, &json) {
        Ok(0) => tracing::debug!("Scheduled backup skipped: no admin sessions"),
        Ok(n) => tracing::info!(recipients = n, file = %file_name, "Scheduled backup sent"),
        Err(e) => tracing::error!("Scheduled backup delivery failed: {:#}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_next_fire_later_today() {
        assert_eq!(next_fire_after(dt(5, 10, 0), at(23, 59)), dt(5, 23, 59));
    }

    #[test]
    fn test_next_fire_rolls_to_tomorrow() {
        assert_eq!(next_fire_after(dt(5, 23, 59), at(23, 59)), dt(6, 23, 59));
        assert_eq!(
            next_fire_after(dt(31, 23, 59), at(0, 5)),
            dt(31, 0, 5) + chrono::Duration::days(1)
        );
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl BackupSink for Recorder {
        fn deliver(&self, file_name: &str, json: &str) -> anyhow::Result<usize> {
            self.sent
                .lock()
                .unwrap()
                .push((file_name.to_string(), json.to_string()));
            Ok(1)
        }
    }

    #[test]
    fn test_run_once_delivers_export() {
        let store = Store::open_in_memory().unwrap();
        store.add_board_item("note", dt(5, 9, 0)).unwrap();
        let sink = Recorder::default();

        run_once(&store, &sink, dt(5, 23, 59));

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "backup_2025-03-05_23-59.json");
        assert!(sent[0].1.contains("\"note\""));
    }
}
