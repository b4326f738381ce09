// Pinpoint Core Library
// Context collection, prompt assembly, agent state and dispatch routing

pub mod agent;
pub mod assembler;
pub mod context;
pub mod dispatch;
pub mod event;
pub mod ide;
pub mod service;
pub mod session;
pub mod transport;

pub use agent::{AgentStateMachine, AgentTimings};
pub use assembler::{AssemblyPluginFailure, AssemblyReport, MessageAssembler, render_prompt};
pub use context::{CollectionDegradation, CollectionReport, ContextCollector, ContextSelection};
pub use dispatch::{DispatchError, DispatchReport, DispatchRouter, Host, HostError};
pub use event::EventBroadcaster;
pub use ide::Ide;
pub use service::AgentService;
pub use session::{OpenError, SendError, SessionStore};
pub use transport::{AgentTransport, LocalTransport, TransportError};
