use crate::error::LinkError;
use crate::transport::Transport;
use fcs_domain::protocol::{Reply, Request};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, trace};

#[derive(Debug)]
struct LinkInner {
    transport: Box<dyn Transport>,
    /// Held for the whole round trip of one request.
    slot: Mutex<()>,
    timeout: Duration,
    calls: AtomicU64,
    failures: AtomicU64,
}

/// Shared handle to the device link.
///
/// Clones share the same transport and the same request slot.
#[derive(Debug, Clone)]
pub struct Link {
    inner: Arc<LinkInner>,
}

impl Link {
    pub fn new(transport: impl Transport + 'static, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(LinkInner {
                transport: Box::new(transport),
                slot: Mutex::new(()),
                timeout,
                calls: AtomicU64::new(0),
                failures: AtomicU64::new(0),
            }),
        }
    }

    /// Link readiness as reported by the transport.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.transport.is_open()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Sends one request and waits for its reply.
    ///
    /// Waits for the request slot first, so at most one request is ever in flight.
    /// The deadline covers the transport round trip only, not the wait for the slot.
    ///
    /// # Errors
    /// [`LinkError::Closed`] when the transport is not open, [`LinkError::Timeout`]
    /// when the deadline passes, [`LinkError::Mismatch`] when the reply answers a
    /// different message, and any error raised by the transport.
    pub async fn call(&self, request: Request) -> Result<Reply, LinkError> {
        let _slot = self.inner.slot.lock().await;
        self.exchange(request).await
    }

    /// Like [`Link::call`], but `live` is checked again once the slot is held.
    ///
    /// Returns `Ok(None)` without touching the transport when `live` no longer
    /// holds, so callers queued behind a slow request give up their turn.
    ///
    /// # Errors
    /// Same as [`Link::call`].
    pub async fn call_while(
        &self,
        request: Request,
        live: impl Fn() -> bool,
    ) -> Result<Option<Reply>, LinkError> {
        let _slot = self.inner.slot.lock().await;
        if !live() {
            trace!(code = %request.code(), "Request dropped before sending");
            return Ok(None);
        }
        self.exchange(request).await.map(Some)
    }

    /// One round trip. The caller holds the slot.
    async fn exchange(&self, request: Request) -> Result<Reply, LinkError> {
        let code = request.code();
        if !self.inner.transport.is_open() {
            return Err(self.failed(LinkError::Closed {
                message: "transport is not open".into(),
                context: Some(code.to_string().into()),
            }));
        }

        self.inner.calls.fetch_add(1, Ordering::Relaxed);
        trace!(code = %code, "Request issued");

        let reply =
            match tokio::time::timeout(self.inner.timeout, self.inner.transport.send(request)).await {
                Ok(Ok(reply)) => reply,
                Ok(Err(err)) => return Err(self.failed(err)),
                Err(_) => {
                    let timeout_ms = u64::try_from(self.inner.timeout.as_millis()).unwrap_or(u64::MAX);
                    return Err(self.failed(LinkError::Timeout { code, timeout_ms, context: None }));
                },
            };

        match reply.code() {
            Some(received) if received != code => {
                Err(self.failed(LinkError::Mismatch { expected: code, received, context: None }))
            },
            _ => Ok(reply),
        }
    }

    /// Requests issued to the transport since the link was created.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.inner.calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failures(&self) -> u64 {
        self.inner.failures.load(Ordering::Relaxed)
    }

    fn failed(&self, err: LinkError) -> LinkError {
        self.inner.failures.fetch_add(1, Ordering::Relaxed);
        debug!(error = %err, "Request failed");
        err
    }
}
