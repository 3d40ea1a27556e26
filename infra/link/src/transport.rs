use crate::error::LinkError;
use fcs_domain::protocol::{Reply, Request};
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

/// Boxed reply future returned by [`Transport::send`].
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<Reply, LinkError>> + Send + 'a>>;

/// Frames a request, writes it and resolves with the decoded reply.
///
/// Implementations may assume [`crate::Link`] never calls `send` while a previous
/// call is still pending.
pub trait Transport: Debug + Send + Sync {
    fn send(&self, request: Request) -> SendFuture<'_>;

    /// Whether the underlying port is open and the session negotiated.
    fn is_open(&self) -> bool;
}
