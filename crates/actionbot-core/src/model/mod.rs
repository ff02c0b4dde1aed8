//! Domain models shared by every component.

mod category;
mod message;

pub use category::Category;
pub use message::{
    Classification, DraftReply, MessageDetail, MessageId, MessageSummary, ThreadId, UserId,
};
