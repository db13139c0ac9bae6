//! Polling until a mutated resource converges.
//!
//! Mutations return before the backend has settled: the resource passes
//! through `busy` and fields update asynchronously. The [`Poller`] re-fetches
//! through the [`Fetch`] capability until either the run-state lands in a
//! desired set or every requested field matches, bounded by [`PollPolicy`].

mod fields;
mod state;

pub use fields::{compare_field, FieldMatch, Mismatches};
pub use state::{HasRunState, RunState};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::metrics::ClientMetrics;

/// Parameters for the convergence poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Delay between refreshes
    #[serde(rename = "interval_secs", with = "crate::config::duration_secs")]
    pub interval: Duration,
    /// Refreshes after the first one before giving up
    pub max_iterations: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_iterations: 20,
        }
    }
}

/// Capability to re-read a resource from the backend by key.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Identifies the resource; its `Display` form names it in errors.
    type Key: fmt::Display + Send + Sync;
    type Resource: Send;

    async fn fetch(&self, ctx: &Context, key: &Self::Key) -> Result<Self::Resource>;
}

/// Outcome of checking one refreshed resource.
enum Check {
    Converged,
    /// Not yet; carries a description of what was observed.
    NotYet(String),
}

/// Generic "wait until consistent" loop.
#[derive(Debug, Clone, Default)]
pub struct Poller {
    policy: PollPolicy,
    metrics: Option<Arc<ClientMetrics>>,
}

impl Poller {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            metrics: None,
        }
    }

    /// Count refreshes in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Wait until the run-state is in `desired` and not busy.
    ///
    /// `initial` is the state observed before the mutation. With
    /// `require_change`, a match is only accepted once some refresh has shown
    /// a state different from the one before it, so a resource still sitting
    /// in its old state is not mistaken for one that already transitioned.
    pub async fn wait_until_state<F>(
        &self,
        ctx: &Context,
        source: &F,
        key: &F::Key,
        initial: Option<RunState>,
        desired: &[RunState],
        require_change: bool,
    ) -> Result<F::Resource>
    where
        F: Fetch + ?Sized,
        F::Resource: HasRunState,
    {
        let mut previous = initial;
        let mut changed = false;

        self.poll(ctx, source, key, |resource| {
            let state = resource.run_state();
            if previous.is_some() && state != previous {
                changed = true;
            }
            previous = state;

            match state {
                Some(s) if !s.is_busy() && desired.contains(&s) && (changed || !require_change) => {
                    Check::Converged
                }
                Some(s) if desired.contains(&s) && !s.is_busy() => {
                    Check::NotYet(format!("{} (no transition observed)", s))
                }
                Some(s) => Check::NotYet(s.to_string()),
                None => Check::NotYet("no run-state".to_string()),
            }
        })
        .await
    }

    /// Wait until the resource leaves `busy` for any settled state.
    pub async fn wait_until_ready<F>(&self, ctx: &Context, source: &F, key: &F::Key) -> Result<F::Resource>
    where
        F: Fetch + ?Sized,
        F::Resource: HasRunState,
    {
        self.wait_until_state(ctx, source, key, None, &RunState::SETTLED, false)
            .await
    }

    /// Wait until every field set in `requested` matches and the resource is not busy.
    pub async fn wait_until_fields<F, Q>(
        &self,
        ctx: &Context,
        source: &F,
        key: &F::Key,
        requested: &Q,
    ) -> Result<F::Resource>
    where
        F: Fetch + ?Sized,
        F::Resource: HasRunState,
        Q: FieldMatch<F::Resource> + Sync + ?Sized,
    {
        self.poll(ctx, source, key, |resource| {
            if resource.run_state().is_some_and(|s| s.is_busy()) {
                return Check::NotYet(RunState::Busy.to_string());
            }
            let mismatches = requested.mismatched_fields(resource);
            if mismatches.is_empty() {
                Check::Converged
            } else {
                let names: Vec<&str> = mismatches.into_iter().collect();
                Check::NotYet(format!("mismatched fields: {}", names.join(", ")))
            }
        })
        .await
    }

    /// Refresh once, then up to `max_iterations` more times, sleeping between.
    async fn poll<F, C>(&self, ctx: &Context, source: &F, key: &F::Key, mut check: C) -> Result<F::Resource>
    where
        F: Fetch + ?Sized,
        C: FnMut(&F::Resource) -> Check,
    {
        let start = Instant::now();
        let mut resource = self.refresh(ctx, source, key).await?;
        let mut last_observed = match check(&resource) {
            Check::Converged => return Ok(resource),
            Check::NotYet(observed) => observed,
        };

        for iteration in 1..=self.policy.max_iterations {
            debug!(
                "{} not converged ({}), poll {}/{}",
                key, last_observed, iteration, self.policy.max_iterations
            );
            ctx.sleep(self.policy.interval).await?;

            resource = self.refresh(ctx, source, key).await?;
            match check(&resource) {
                Check::Converged => {
                    info!("{} converged after {:?}", key, start.elapsed());
                    return Ok(resource);
                }
                Check::NotYet(observed) => last_observed = observed,
            }
        }

        Err(Error::ConvergenceTimeout {
            resource: key.to_string(),
            elapsed: start.elapsed(),
            last_state: last_observed,
        })
    }

    async fn refresh<F>(&self, ctx: &Context, source: &F, key: &F::Key) -> Result<F::Resource>
    where
        F: Fetch + ?Sized,
    {
        ctx.check()?;
        if let Some(metrics) = &self.metrics {
            metrics.inc_poll_refreshes();
        }
        source.fetch(ctx, key).await
    }
}
