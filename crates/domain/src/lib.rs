//! Domain-level building blocks shared by the configurator and the
//! filesystem collaborators: the validated parameter model, platform
//! capabilities, attribute values and the collaborator contracts.

pub mod attrs;
pub mod config;
pub mod model;
pub mod platform;
pub mod ports;
pub mod services;

pub use attrs::{AttrValue, AttributeGroup, RenderedAttributes};
pub use config::{BaseSystem, ConfigError, EnvironmentContext, RunOptions};
pub use model::*;
pub use platform::{PlatformCapabilities, PlatformFamily};
pub use ports::*;
