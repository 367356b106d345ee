//! Resource naming.
//!
//! This module computes physical names for declared resources:
//!
//! - [`case`] derives environment keys from logical ids
//! - [`strategy`] knows where each resource type keeps its name
//! - [`resolver`] applies the naming convention to one resource
//! - [`expr`] models deploy-time values and the environment map

pub mod case;
pub mod expr;
pub mod resolver;
pub mod strategy;

pub use case::{convert_case, env_key};
pub use expr::{EnvValue, EnvironmentMap, Expr};
pub use resolver::{ResolveResource, ResourceNameResolver};
pub use strategy::{EffectiveName, PathSegment, Placement, PropertyPath, StrategyRegistry};
