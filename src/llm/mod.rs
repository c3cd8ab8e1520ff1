//! LLM clients and council dispatch

mod council;
mod events;
mod provider;
mod types;

pub use council::*;
pub use events::*;
pub use provider::*;
pub use types::*;
