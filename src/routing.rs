//! Routing of captured errors: evaluate the filter pipeline, persist the
//! error unless it was dismissed, then fan out to the notifiers whose
//! channels were not suppressed.

use crate::assertion::AssertionContext;
use crate::capture::{CapturedError, StoredRecord};
use crate::filter::pipeline::panic_message;
use crate::filter::{FilterPipeline, Verdict};
use crate::notify::Notifier;
use crate::store::{ErrorStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, warn};

/// Filter source reported to assertions evaluated by the router
pub const ROUTER_SOURCE: &str = "router";

/// Which notifiers ran for a recorded error
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub notified: Vec<String>,
    /// Channels suppressed by the verdict
    pub skipped: Vec<String>,
    /// Notifiers that returned an error or panicked
    pub failed: Vec<String>,
}

#[derive(Debug)]
pub enum RouteOutcome {
    /// A filter dismissed the error: nothing stored, nobody notified
    Dismissed { verdict: Verdict },
    Recorded {
        record: StoredRecord,
        verdict: Verdict,
        delivery: Delivery,
    },
    /// The store refused the append; notifiers were not invoked
    Unrecorded { verdict: Verdict, error: StoreError },
}

impl RouteOutcome {
    pub fn verdict(&self) -> &Verdict {
        match self {
            RouteOutcome::Dismissed { verdict }
            | RouteOutcome::Recorded { verdict, .. }
            | RouteOutcome::Unrecorded { verdict, .. } => verdict,
        }
    }

    pub fn record(&self) -> Option<&StoredRecord> {
        match self {
            RouteOutcome::Recorded { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn delivery(&self) -> Option<&Delivery> {
        match self {
            RouteOutcome::Recorded { delivery, .. } => Some(delivery),
            _ => None,
        }
    }

    pub fn is_dismissed(&self) -> bool {
        matches!(self, RouteOutcome::Dismissed { .. })
    }
}

pub struct ErrorRouter {
    pipeline: FilterPipeline,
    store: Arc<dyn ErrorStore>,
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl ErrorRouter {
    pub fn new(pipeline: FilterPipeline, store: Arc<dyn ErrorStore>) -> Self {
        Self {
            pipeline,
            store,
            notifiers: Vec::new(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn with_notifiers(mut self, notifiers: impl IntoIterator<Item = Arc<dyn Notifier>>) -> Self {
        self.notifiers.extend(notifiers);
        self
    }

    pub fn pipeline(&self) -> &FilterPipeline {
        &self.pipeline
    }

    pub fn store(&self) -> &Arc<dyn ErrorStore> {
        &self.store
    }

    pub fn route(&self, captured: CapturedError) -> RouteOutcome {
        let ctx = AssertionContext::new(&captured).with_filter_source(ROUTER_SOURCE);
        let verdict = self.pipeline.evaluate_in(&ctx);

        if verdict.suppress_recording {
            debug!(error_type = %captured.type_name(), "captured error dismissed");
            return RouteOutcome::Dismissed { verdict };
        }

        let record = match self.store.append(&captured) {
            Ok(record) => record,
            Err(e) => {
                error!(error_type = %captured.type_name(), error = %e, "failed to record captured error");
                return RouteOutcome::Unrecorded { verdict, error: e };
            }
        };

        let delivery = self.deliver(&record, &verdict);
        RouteOutcome::Recorded {
            record,
            verdict,
            delivery,
        }
    }

    fn deliver(&self, record: &StoredRecord, verdict: &Verdict) -> Delivery {
        let mut delivery = Delivery::default();
        let (active, skipped): (Vec<_>, Vec<_>) = self
            .notifiers
            .iter()
            .partition(|n| !verdict.is_channel_suppressed(n.name()));
        delivery.skipped = skipped.iter().map(|n| n.name().to_string()).collect();

        thread::scope(|scope| {
            let handles: Vec<_> = active
                .iter()
                .map(|notifier| {
                    let handle = scope.spawn(move || notifier.notify(record));
                    (notifier.name().to_string(), handle)
                })
                .collect();

            for (name, handle) in handles {
                match handle.join() {
                    Ok(Ok(())) => delivery.notified.push(name),
                    Ok(Err(e)) => {
                        warn!(notifier = %name, id = %record.id, error = %e, "notifier failed");
                        delivery.failed.push(name);
                    }
                    Err(payload) => {
                        warn!(
                            notifier = %name,
                            id = %record.id,
                            panic = %panic_message(&*payload),
                            "notifier panicked"
                        );
                        delivery.failed.push(name);
                    }
                }
            }
        });

        delivery
    }
}
