// Applications: creation with resume profile extraction, listing, stage moves.

pub mod handlers;
pub mod repository;
pub mod validation;
