use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::bustime::client::BustimeClient;
use crate::config::Config;
use crate::error::NextBusResult;
use crate::snapshot::Snapshot;
use crate::writer::{read_published, SnapshotWriter};

pub struct Poller {
    client: BustimeClient,
    writer: SnapshotWriter,
    interval: Duration,
    align: bool,
}

impl Poller {
    pub fn new(config: &Config) -> NextBusResult<Poller> {
        Ok(Poller {
            client: BustimeClient::new(config)?,
            writer: SnapshotWriter::new(&config.output_dir),
            interval: config.tick_interval,
            align: config.align_to_minute,
        })
    }

    /// One fetch and publish cycle
    pub async fn tick(&self) -> NextBusResult<Snapshot> {
        let response = self.client.get_predictions().await?;
        let snapshot = Snapshot::new(response, Utc::now());

        for message in snapshot.messages() {
            log::warn!(
                "Upstream says for stop {}: {}",
                message.stpid.as_deref().unwrap_or("?"),
                message.msg
            );
        }

        let written = self.writer.publish(&snapshot).await?;
        log::info!(
            "Published {} predictions ({} bytes) to {}",
            snapshot.predictions().len(),
            written,
            self.writer.path().display()
        );

        Ok(snapshot)
    }

    /// Runs forever. Failed cycles are logged and the previous file is left alone.
    pub async fn run(&self) {
        log::info!("Poller is running every {:?}", self.interval);
        self.log_previous().await;

        let align_delay = if self.align {
            delay_to_boundary(Utc::now(), self.interval)
        } else {
            Duration::ZERO
        };
        let mut schedule = Schedule::new(self.interval, align_delay);

        loop {
            schedule.next().await;

            if let Err(e) = self.tick().await {
                log::error!("Cycle failed at {} stage: {}", e.stage(), e);
            }
        }
    }

    async fn log_previous(&self) {
        let now = Utc::now();
        let max_age = chrono::Duration::from_std(self.interval.saturating_mul(2))
            .unwrap_or_else(|_| chrono::Duration::days(1));

        match read_published(self.writer.dir()).await {
            Ok(Some(previous)) if previous.is_stale(now, max_age) => log::warn!(
                "Existing snapshot is stale, generated {} ({}s ago)",
                previous.generated_at(),
                previous.age(now).num_seconds()
            ),
            Ok(Some(previous)) => log::info!(
                "Existing snapshot generated {} with {} predictions",
                previous.generated_at(),
                previous.predictions().len()
            ),
            Ok(None) => log::info!("Nothing published yet at {}", self.writer.path().display()),
            Err(e) => log::warn!("Existing snapshot is unreadable: {}", e),
        }
    }
}

/// Fixed period ticks.
///
/// The first tick fires straight away, later ones sit on a grid starting
/// `align_delay` from now. Ticks missed while a cycle overran are dropped.
pub struct Schedule {
    interval: Interval,
    kickoff: bool,
}

impl Schedule {
    pub fn new(period: Duration, align_delay: Duration) -> Self {
        let now = Instant::now();
        let start = now.checked_add(align_delay).unwrap_or(now);
        let mut interval = time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Schedule {
            interval,
            // the grid's first tick is immediate anyway when there's no delay
            kickoff: !align_delay.is_zero(),
        }
    }

    pub async fn next(&mut self) {
        if std::mem::take(&mut self.kickoff) {
            return;
        }
        self.interval.tick().await;
    }
}

/// Time until the next wall clock multiple of `period`, zero when exactly on one
pub fn delay_to_boundary(now: DateTime<Utc>, period: Duration) -> Duration {
    let period_ms = i64::try_from(period.as_millis()).unwrap_or(i64::MAX);
    if period_ms == 0 {
        return Duration::ZERO;
    }

    let into_period = now.timestamp_millis().rem_euclid(period_ms);
    if into_period == 0 {
        Duration::ZERO
    } else {
        Duration::from_millis((period_ms - into_period) as u64)
    }
}
