//! meekwrap Core Library
//!
//! Shared functionality for the meek-client wrapper:
//! - Helper command resolution (plain executables and descriptor files)
//! - Handshake line matching for the helper's listen announcement
//! - Runtime configuration and logging setup
//! - Common error types

pub mod address;
pub mod command;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod resolver;
pub mod tracing_init;

pub use address::HelperAddress;
pub use command::{CommandVector, EnvMutation, EnvMutations, ResolvedCommand};
pub use config::WrapperConfig;
pub use error::{Error, Result};
pub use resolver::{CommandResolver, DescriptorResolver, ExecutableResolver, HelperFormat};
