//! Change-notification fan-out.
//!
//! Every successful mutating RPC (and, by default, every successful Get)
//! publishes one [`MutationEvent`] into a single process-wide
//! [`NotificationChannel`]. Each `NotifyUserChanges` subscriber runs a
//! [`NotificationStreamHandler`] that competes with the others for events:
//! every event reaches at most one subscriber.
//!
//! ```text
//! RPC handlers --publish--> NotificationChannel --next--> StreamHandler #1 --> gRPC stream
//!                              (bounded FIFO)      \----> StreamHandler #2 --> gRPC stream
//! ```
//!
//! There is no history: only subscribers attached when an event is published
//! can receive it.
//!
//! Delivery is best effort. Publishing never fails the write that triggered
//! it; when the buffer is saturated the event is parked for at most the
//! configured publish timeout and then dropped.
mod channel;
mod event;
mod stream_handler;

pub use channel::*;
pub use event::*;
pub use stream_handler::*;
