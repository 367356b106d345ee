//! Resource name injection.
//!
//! The [`InjectionCoordinator`] owns the service definition and runs the resolver over
//! every resource exactly once, producing an [`InjectionState`]. The
//! [`ReferenceResolver`] serves `name:` and `topic:` lookups from that state.

pub mod coordinator;
pub mod references;
pub mod state;

pub use coordinator::{InjectionCoordinator, InjectionPhase};
pub use references::{NameSource, ReferenceResolver, SymbolicAddress, TopicSource};
pub use state::{InjectionState, ResolvedResource, TopicRecord};
