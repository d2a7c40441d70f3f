pub mod client;
pub mod dialer;
pub mod stream;
pub mod tls;
pub mod types;
pub mod utils;

mod exchange;

pub use client::HijackClient;
pub use dialer::{dialer_for_scheme, Dial, PlainDialer, TlsDialer};
pub use stream::{CapturedStream, TransportStream};
pub use tls::{MinTlsVersion, TlsPolicy};
pub use types::*;
pub use utils::*;
