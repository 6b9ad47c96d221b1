pub mod attachments;
pub mod chat;
