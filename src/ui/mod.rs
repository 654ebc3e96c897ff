pub mod prompt;
pub mod progress;
pub mod review;

pub use prompt::ConfirmPrompt;
pub use progress::{create_spinner, fail_spinner, finish_spinner};
pub use review::render_review;
