pub mod discovery;
pub mod funding;
pub mod pipeline;
pub mod prompts;
pub mod scheduler;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use discovery::{discovery_agent, parse_discovery, DiscoveredDisaster};
pub use funding::{convert_usd_to_crypto, extract_usd_amount};
pub use pipeline::{IngestPipeline, RunStats};
pub use scheduler::Scheduler;
pub use traits::{DisasterRegistry, IngestAgents, PriceOracle};
