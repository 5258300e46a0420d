mod parser;
mod prompt;
mod session;

pub use parser::{parse_gift_response, MalformedModelOutput};
pub use prompt::build_initial_messages;
pub use session::{AdvisorOutcome, GiftAdvisorSession};
