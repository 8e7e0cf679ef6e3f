//! Pages domain - trainer-authored content pages.

mod page;

pub use page::{slugify, Page};
