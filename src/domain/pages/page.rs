use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PageId, Timestamp, TrainerId, ValidationError};

/// A content page. Slugs are unique per trainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub trainer_id: TrainerId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Page {
    /// Creates a page; the slug defaults to one derived from the title.
    pub fn new(
        trainer_id: TrainerId,
        title: &str,
        slug: Option<&str>,
        content: String,
        is_published: bool,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        let slug = slugify(slug.unwrap_or(title));
        if slug.is_empty() {
            return Err(ValidationError::invalid_format(
                "slug",
                "slug must contain at least one letter or digit",
            ));
        }
        Ok(Self {
            id: PageId::new(),
            trainer_id,
            title: title.to_string(),
            slug,
            content,
            is_published,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Lower-cases and joins alphanumeric runs with single hyphens.
pub fn slugify(raw: &str) -> String {
    raw.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_derives_from_title() {
        let page = Page::new(TrainerId::new(), "  About Me & My Story ", None, String::new(), true, Timestamp::now()).unwrap();
        assert_eq!(page.slug, "about-me-my-story");
        assert_eq!(page.title, "About Me & My Story");
    }

    #[test]
    fn rejects_empty_title_and_symbol_only_slug() {
        assert!(Page::new(TrainerId::new(), " ", None, String::new(), false, Timestamp::now()).is_err());
        assert!(Page::new(TrainerId::new(), "Pricing", Some("!!!"), String::new(), false, Timestamp::now()).is_err());
    }
}
