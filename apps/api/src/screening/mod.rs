// AI fit screening of an application against its job post.

pub mod handlers;
