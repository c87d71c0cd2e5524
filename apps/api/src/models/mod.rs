pub mod applicant;
pub mod application;
pub mod conversation;
pub mod document;
pub mod job_post;
