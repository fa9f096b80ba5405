pub mod fact_check;
pub mod health;
pub mod vote;

pub use fact_check::fact_check;
pub use health::{health, test_parser};
pub use vote::process_vote;
