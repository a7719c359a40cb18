pub mod claims;
pub mod errors;
pub mod handler;

pub use claims::Claims;
pub use errors::JwtError;
pub use handler::IssuedToken;
pub use handler::TokenCodec;
pub use handler::MIN_SECRET_LEN;
