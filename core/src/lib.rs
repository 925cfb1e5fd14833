pub mod device;
pub mod entity;
pub mod error;
pub mod farm;
pub mod hierarchy;
pub mod irrigation;
pub mod messaging;
pub mod sensor;
pub mod user;

pub use device::*;
pub use entity::{Draft, Entity};
pub use farm::*;
pub use hierarchy::*;
pub use irrigation::*;
pub use messaging::*;
pub use sensor::*;
pub use user::*;

pub static CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
