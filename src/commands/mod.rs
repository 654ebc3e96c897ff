pub mod commit;
pub mod review;

pub use commit::execute_commit;
pub use review::execute_review;
