// Event Module
pub mod broadcaster;

pub use broadcaster::{EventBroadcaster, EventBroadcasterConfig};
