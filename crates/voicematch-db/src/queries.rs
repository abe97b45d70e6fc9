//! Database query functions organized by document.

pub mod messages;
pub mod penalty;
pub mod profiles;
pub mod quota;
pub mod reports;
