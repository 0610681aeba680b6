pub mod align;
pub mod decode;
pub mod domain;
pub mod error;
pub mod protocol;
