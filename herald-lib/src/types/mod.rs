#![allow(unreachable_pub)]

mod error;
mod request;
mod response;

pub use error::{ErrorCode, ErrorKind};
pub use request::ApiRequest;
pub use response::{RawResponse, ThrottleNotice};

/// The herald `Result` type
pub type Result<T> = std::result::Result<T, crate::ErrorKind>;
