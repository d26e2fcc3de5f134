//! XML-RPC codec for the daemon's `system.multicall` dialect.

pub mod decode;
pub mod encode;
pub mod value;

pub use decode::{MethodResponse, decode_multicall};
pub use encode::{MULTICALL_METHOD, encode_multicall};
pub use value::Value;
