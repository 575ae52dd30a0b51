pub mod claims;
pub mod codec;
pub mod errors;

pub use claims::Claims;
pub use claims::Role;
pub use claims::TokenPair;
pub use claims::VerifiedToken;
pub use codec::TokenCodec;
pub use errors::TokenError;
