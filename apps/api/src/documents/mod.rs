// Document upload: text extraction, object storage, document records.

pub mod extract;
pub mod handlers;
pub mod storage;
