//! EPUB output: assembling an outline into a [`Book`](crate::Book) and
//! packaging it.

mod assemble;
mod cover;
mod writer;

pub use assemble::{DEFAULT_BOOK_TITLE, DEFAULT_LANGUAGE, assemble, estimate_pages};
pub use cover::{Cover, DEFAULT_COVER_SIZE};
pub use writer::{write_epub, write_epub_to_writer};
