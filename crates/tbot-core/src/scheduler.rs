//! Fixed-interval broadcast of new tenders to the configured chat.
//!
//! - First run after `first_delay`, then every `interval`
//! - Ticks that fall due while a run is still going are skipped, not queued
//! - A failing run is logged; the loop keeps going until `stop()`

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    domain::ChatId,
    service::{DeliveryOutcome, TenderService},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub destination: ChatId,
    pub interval: Duration,
    pub first_delay: Duration,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub running: bool,
    pub ticks: u64,
    pub last_tick: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PeriodicScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    service: TenderService,
    cfg: ScheduleConfig,
    state: tokio::sync::Mutex<SchedulerState>,
}

#[derive(Default)]
struct SchedulerState {
    handle: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
    ticks: u64,
    last_tick: Option<DateTime<Utc>>,
}

impl PeriodicScheduler {
    pub fn new(service: TenderService, cfg: ScheduleConfig) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                service,
                cfg,
                state: tokio::sync::Mutex::new(SchedulerState::default()),
            }),
        }
    }

    /// Spawn the timer loop. Returns `false` if it is already running.
    pub async fn start(&self) -> bool {
        let mut st = self.inner.state.lock().await;
        if st.handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }

        let cancel = CancellationToken::new();
        let scheduler = self.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            scheduler.tick_loop(token).await;
        });

        st.cancel = Some(cancel);
        st.handle = Some(handle);

        tracing::info!(
            interval_secs = self.inner.cfg.interval.as_secs(),
            first_delay_secs = self.inner.cfg.first_delay.as_secs(),
            chat_id = self.inner.cfg.destination.0,
            "periodic check scheduled"
        );
        true
    }

    pub async fn stop(&self) {
        let mut st = self.inner.state.lock().await;
        if let Some(tok) = st.cancel.take() {
            tok.cancel();
        }
        // Let the loop exit on cancellation; a run in progress finishes first.
        st.handle.take();
    }

    pub async fn status(&self) -> SchedulerStatus {
        let st = self.inner.state.lock().await;
        SchedulerStatus {
            running: st.cancel.as_ref().is_some_and(|c| !c.is_cancelled()),
            ticks: st.ticks,
            last_tick: st.last_tick,
        }
    }

    /// One scheduled check: search and broadcast to the configured chat.
    pub async fn run_once(&self) -> DeliveryOutcome {
        {
            let mut st = self.inner.state.lock().await;
            st.ticks += 1;
            st.last_tick = Some(Utc::now());
        }

        tracing::info!("running periodic tender check");
        let out = self.inner.service.deliver(self.inner.cfg.destination).await;

        if out.found == 0 {
            tracing::info!("no new tenders");
        } else {
            tracing::info!(
                found = out.found,
                sent = out.report.sent,
                failed = out.report.failed,
                "periodic check delivered tenders"
            );
        }
        out
    }

    async fn tick_loop(&self, cancel: CancellationToken) {
        let start = Instant::now() + self.inner.cfg.first_delay;
        let mut tick = interval_at(start, self.inner.cfg.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
              _ = cancel.cancelled() => break,
              _ = tick.tick() => {
                self.run_once().await;
              }
            }
        }
        tracing::info!("periodic check stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dispatch::Dispatcher,
        filter::FilterCriteria,
        formatting::TenderFormatter,
        pagination::WalkSettings,
        pipeline::TenderPipeline,
        testing::{page, tender, FakeMessenger, FakeSource},
    };
    use chrono::FixedOffset;

    fn scheduler(
        messenger: Arc<FakeMessenger>,
        first_delay: Duration,
    ) -> PeriodicScheduler {
        let source = Arc::new(
            FakeSource::new()
                .with_page(None, page(&["t1"], None))
                .with_tender(tender("t1", "active.tendering", "15420000-1", "Черкаська")),
        );
        let pipeline = Arc::new(TenderPipeline::new(
            source,
            FilterCriteria {
                required_status: "active.tendering".to_string(),
                category_prefixes: vec!["1542".to_string()],
                regions: vec!["Черкаська".to_string()],
                region_keywords: vec![],
            },
            WalkSettings {
                page_limit: 10,
                max_pages: 1,
                request_delay: Duration::ZERO,
            },
            TenderFormatter::new(FixedOffset::east_opt(0).unwrap()),
        ));
        let service = TenderService::new(pipeline, Dispatcher::new(messenger, Duration::ZERO));
        PeriodicScheduler::new(
            service,
            ScheduleConfig {
                destination: ChatId(-100),
                interval: Duration::from_secs(3600),
                first_delay,
            },
        )
    }

    #[tokio::test]
    async fn run_once_broadcasts_to_configured_chat() {
        let messenger = Arc::new(FakeMessenger::new());
        let s = scheduler(messenger.clone(), Duration::from_secs(3600));

        let out = s.run_once().await;
        assert_eq!(out.found, 1);
        assert_eq!(messenger.sent()[0].0, ChatId(-100));

        let status = s.status().await;
        assert_eq!(status.ticks, 1);
        assert!(status.last_tick.is_some());
        assert!(!status.running);
    }

    #[tokio::test]
    async fn start_fires_first_tick_and_stop_ends_loop() {
        let messenger = Arc::new(FakeMessenger::new());
        let s = scheduler(messenger.clone(), Duration::ZERO);

        assert!(s.start().await);
        assert!(!s.start().await);

        let deadline = Instant::now() + Duration::from_secs(5);
        while messenger.sent().is_empty() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(messenger.sent().len(), 1);
        assert!(s.status().await.running);

        s.stop().await;
        assert!(!s.status().await.running);
    }
}
