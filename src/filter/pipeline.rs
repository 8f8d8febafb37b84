use super::{ChannelSet, Filter, FilterOutcome};
use crate::assertion::{AssertionContext, EvaluationFault};
use crate::capture::CapturedError;
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Aggregated decision of a filter pipeline for one captured error
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// At least one filter without channels matched
    pub suppress_recording: bool,
    /// Union of the channels of every matching channel-scoped filter
    pub suppressed_channels: ChannelSet,
}

impl Verdict {
    pub fn is_channel_suppressed(&self, channel: &str) -> bool {
        self.suppressed_channels.contains(channel)
    }

    /// Nothing was dismissed
    pub fn is_clear(&self) -> bool {
        !self.suppress_recording && self.suppressed_channels.is_empty()
    }
}

/// An ordered collection of filters evaluated as a whole.
///
/// The verdict is an OR over entire dismissals and a union over channel sets,
/// so the order of filters never changes the outcome.
#[derive(Debug, Clone, Default)]
pub struct FilterPipeline {
    filters: Vec<Filter>,
}

impl FilterPipeline {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn extend(&mut self, filters: impl IntoIterator<Item = Filter>) {
        self.filters.extend(filters);
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn evaluate(&self, error: &CapturedError) -> Verdict {
        self.evaluate_in(&AssertionContext::new(error))
    }

    /// Runs every filter. A filter that fails or panics is logged and
    /// contributes nothing; the remaining filters still run.
    pub fn evaluate_in(&self, ctx: &AssertionContext<'_>) -> Verdict {
        let mut verdict = Verdict::default();

        for (index, filter) in self.filters.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| filter.evaluate(ctx)))
                .unwrap_or_else(|payload| Err(EvaluationFault::Panicked(panic_message(&*payload))));

            match outcome {
                Ok(FilterOutcome::NoMatch) => {}
                Ok(FilterOutcome::DismissEntirely) => {
                    tracing::debug!(filter = %label(filter, index), "error dismissed by filter");
                    verdict.suppress_recording = true;
                }
                Ok(FilterOutcome::DismissChannels(channels)) => {
                    tracing::debug!(
                        filter = %label(filter, index),
                        channels = %channels,
                        "channels dismissed by filter"
                    );
                    verdict.suppressed_channels.union_with(channels);
                }
                Err(fault) => {
                    tracing::warn!(
                        filter = %label(filter, index),
                        error = %fault,
                        "error filter failed, treating it as not matching"
                    );
                }
            }
        }

        verdict
    }
}

fn label(filter: &Filter, index: usize) -> String {
    match filter.name() {
        Some(name) => name.to_string(),
        None => format!("#{index}"),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
