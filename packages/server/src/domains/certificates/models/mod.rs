pub mod certificate;
pub mod certificate_config;
pub mod event_counter;
pub mod job_payload;

pub use certificate::*;
pub use certificate_config::*;
pub use event_counter::*;
pub use job_payload::*;
