// Job posts and the filterable candidate views built on them.

pub mod filters;
pub mod handlers;
