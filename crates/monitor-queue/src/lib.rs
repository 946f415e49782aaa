#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod bytes;
mod queue;
mod wait;

pub use bytes::{ByteQueue, ByteSendError};
pub use queue::{Delivery, MonitorQueue, RecvError, SendError};
pub use wait::Wait;
