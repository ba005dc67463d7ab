//! Components, systems and others to create mirrors

mod api;
pub use api::*;
mod camera;
pub use camera::*;
mod console;
pub use console::*;
mod create;
pub use create::*;
mod debug;
pub use debug::*;
mod deferred;
pub use deferred::*;
mod despawn;
pub use despawn::*;
mod error;
pub use error::*;
mod locate;
pub use locate::*;
mod reflection;
pub use reflection::*;
mod snapshot;
pub use snapshot::*;
mod update;
pub use update::*;
mod view;
pub use view::*;
