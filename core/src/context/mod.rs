// Context Module
pub mod collector;
pub mod registry;

pub use collector::{
  BlockStub, CollectionDegradation, CollectionReport, ContextCollector, ContextSelection,
  DomContextEntry, PageInfo, ThemeStub,
};
pub use registry::{
  RegistryClient, RegistryCredentials, RegistryError, RegistryKind, RegistryLookup,
  format_installation_command,
};
