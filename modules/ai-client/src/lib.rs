pub mod error;
pub mod openai;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod util;

pub use error::AiError;
pub use openai::OpenAi;
pub use traits::ChatAgent;
pub use util::{strip_code_blocks, truncate_to_char_boundary};
