use std::fmt;

use futures::future::join_all;
use thiserror::Error;
use viewport_badge_protocol::{Ack, Message};

/// Identifies one rendering context (a browser tab, for instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub i64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("no receiver in context {0}")]
    Unreachable(ContextId),
    #[error("context {0} did not acknowledge")]
    Rejected(ContextId),
    #[error("messaging unavailable: {0}")]
    Transport(String),
}

/// The host's cross-context messaging facility.
#[allow(async_fn_in_trait)]
pub trait Peers {
    async fn contexts(&self) -> Result<Vec<ContextId>, DeliveryError>;

    async fn send(&self, to: ContextId, message: &Message) -> Result<Ack, DeliveryError>;
}

/// Per-recipient outcome of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: Vec<ContextId>,
    pub unreachable: Vec<ContextId>,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.unreachable.len()
    }
}

/// Send `message` to every known context concurrently.
///
/// Never fails: a context without a live receiver is the normal case, so
/// each outcome is recorded and logged at debug level only.
pub async fn broadcast<P: Peers>(peers: &P, message: &Message) -> BroadcastReport {
    let contexts = match peers.contexts().await {
        Ok(contexts) => contexts,
        Err(e) => {
            tracing::debug!(error = %e, "could not enumerate contexts");
            return BroadcastReport::default();
        }
    };

    let sends = contexts.iter().map(|&ctx| async move {
        let outcome = match peers.send(ctx, message).await {
            Ok(ack) if ack.success => Ok(()),
            Ok(_) => Err(DeliveryError::Rejected(ctx)),
            Err(e) => Err(e),
        };
        (ctx, outcome)
    });

    let mut report = BroadcastReport::default();
    for (ctx, outcome) in join_all(sends).await {
        match outcome {
            Ok(()) => report.delivered.push(ctx),
            Err(e) => {
                tracing::debug!(context = %ctx, error = %e, "settings notification not delivered");
                report.unreachable.push(ctx);
            }
        }
    }
    report
}
