//! Gateway adapter: inbound reaction events and the REST platform port.

mod conversions;
mod handler;
mod platform;

pub use handler::Handler;
pub use platform::SerenityPlatform;
