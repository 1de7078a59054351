//! The protocol object model.
//!
//! Only a representative part of the engine's schema is declared here. Further
//! objects are one [`td_object!`](crate::td_object) declaration each, and
//! requests outside this set can always be made untyped through
//! [`Client::call_raw`](crate::client::Client::call_raw).
//!
//! Note that [`Ok`] is a protocol object here; glob-importing this module
//! shadows the prelude's `Result::Ok`.

mod auth;
mod chat;
mod functions;
mod message;
mod misc;
mod object;
mod update;
mod user;

pub use auth::*;
pub use chat::*;
pub use functions::*;
pub use message::*;
pub use misc::*;
pub use object::*;
pub use update::*;
pub use user::*;
