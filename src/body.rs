//! Request and response body type.
//!
//! Every body that flows through txlog is erased to one concrete type so the
//! router, middleware and server never have to be generic over it. hyper's
//! `Incoming`, in-memory buffers and the response-capturing decorator all end
//! up as a [`Body`].

use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full};

/// Boxed error carried by a [`Body`] stream.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Type-erased HTTP body: `Bytes` frames, boxed errors.
///
/// `UnsyncBoxBody` rather than `BoxBody` because hyper's `Incoming` is
/// `Send` but not `Sync`, and nothing here needs to share a body across
/// threads — a body is owned by exactly one in-flight request.
pub type Body = http_body_util::combinators::UnsyncBoxBody<Bytes, BoxError>;

/// A body holding `bytes` in memory.
pub fn full(bytes: impl Into<Bytes>) -> Body {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// A body with no data.
pub fn empty() -> Body {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub(crate) fn incoming(body: hyper::body::Incoming) -> Body {
    body.map_err(BoxError::from).boxed_unsync()
}
