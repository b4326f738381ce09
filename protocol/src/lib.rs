// Pinpoint Protocol
// Types exchanged between the toolbar, the agent service and the host IDE

pub mod prompts;
pub mod protocol;

pub use protocol::*;
