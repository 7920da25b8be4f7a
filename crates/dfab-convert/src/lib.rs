//! Conversion gateway for DocFabric.
//!
//! A [`Converter`] receives a freshly stored original (its [`OriginalHandle`]
//! plus bytes and declared content type) and returns normalized Markdown.
//!
//! - [`PassthroughConverter`] -- decodes text inputs as-is
//! - [`CommandConverter`] -- runs an external program, reads stdout
//! - [`RoutingConverter`] -- passthrough for text, command for the rest
//!
//! [`OriginalHandle`]: dfab_blob::OriginalHandle

pub mod command;
pub mod error;
pub mod passthrough;
pub mod routing;
pub mod traits;

pub use command::{CommandConverter, INPUT_PLACEHOLDER};
pub use error::{ConversionError, ConversionResult};
pub use passthrough::PassthroughConverter;
pub use routing::RoutingConverter;
pub use traits::{ConversionSource, Converter};
