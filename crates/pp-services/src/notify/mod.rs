//! The notification side-channel: resolve the recipient, write the inbox
//! entry, then try a push. Nothing in here reports errors to a caller.

pub mod inbox;
pub mod pipeline;
pub mod push;
pub mod resolver;

pub use inbox::{InboxEntry, InboxWriter};
pub use pipeline::{NotificationPipeline, PipelineOutcome};
pub use push::{PushDispatcher, PushOutcome};
pub use resolver::{Recipient, RecipientResolver, Unresolved};
