//! Real-time notification channel.

mod channel;

pub use channel::{ChannelHandle, ChannelState, NotificationChannel, NotificationSink};
