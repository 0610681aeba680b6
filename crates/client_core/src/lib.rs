pub mod api;
pub mod deck;
pub mod error;
pub mod session;
pub mod types;

pub use api::{HttpUpTeachApi, UpTeachApi, DEFAULT_BASE_URL};
pub use deck::SlideDeck;
pub use error::{ClientError, ValidationError};
pub use session::{request_content_suggestion, Applied, LessonSession, RequestToken};
pub use types::UploadedFile;
