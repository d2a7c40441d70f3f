pub mod error;
pub mod header;
pub mod request;
pub mod response;
pub mod target;
pub mod timeouts;

pub use error::*;
pub use header::*;
pub use request::*;
pub use response::*;
pub use target::*;
pub use timeouts::*;
