//! Short links.
//!
//! Each upload gets a short, unguessable id that redirects to the long-form
//! metadata page of the artifact.

mod model;
mod registry;
mod repository;

pub use model::{generate_short_id, is_valid_short_id, ShortLink, SHORT_ID_ALPHABET};
pub use registry::{LinkRegistry, ShortIdGenerator};
pub use repository::ShortLinkRepository;
