pub mod error;
pub mod model;
pub mod session;
pub mod traits;

pub use error::{LinkError, SessionError, SignalError};
pub use model::*;
pub use session::*;
pub use traits::*;
