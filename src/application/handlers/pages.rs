//! ManagePagesHandler - trainer content pages, the `pages` quota resource.

use std::sync::Arc;

use crate::application::handlers::entitlement::EntitlementGate;
use crate::domain::entitlement::ResourceKind;
use crate::domain::foundation::{DomainError, PageId, Timestamp, TrainerId};
use crate::domain::identity::TenantContext;
use crate::domain::pages::Page;
use crate::ports::PageRepository;

#[derive(Debug, Clone)]
pub struct CreatePageCommand {
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub is_published: bool,
}

pub struct ManagePagesHandler {
    pages: Arc<dyn PageRepository>,
    gate: EntitlementGate,
}

impl ManagePagesHandler {
    pub fn new(pages: Arc<dyn PageRepository>, gate: EntitlementGate) -> Self {
        Self { pages, gate }
    }

    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<Page>, DomainError> {
        self.pages.list(ctx.trainer_id).await
    }

    pub async fn create(&self, ctx: &TenantContext, cmd: CreatePageCommand) -> Result<Page, DomainError> {
        self.gate.check_create(ctx, ResourceKind::Pages).await?;
        let page = Page::new(
            ctx.trainer_id,
            &cmd.title,
            cmd.slug.as_deref(),
            cmd.content,
            cmd.is_published,
            Timestamp::now(),
        )?;
        self.pages
            .insert(&page, self.gate.enforces_quota(ctx))
            .await?
            .into_result()?;
        Ok(page)
    }

    pub async fn delete(&self, ctx: &TenantContext, id: PageId) -> Result<(), DomainError> {
        self.gate.ensure_writable(ctx).await?;
        if !self.pages.delete(ctx.trainer_id, id).await? {
            return Err(DomainError::not_found("page"));
        }
        Ok(())
    }

    /// Published page by slug, for public rendering.
    pub async fn published(&self, trainer_id: TrainerId, slug: &str) -> Result<Page, DomainError> {
        self.pages
            .find_published(trainer_id, slug)
            .await?
            .ok_or_else(|| DomainError::not_found("page"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Fixture;
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::ErrorCode;

    fn page(title: &str, published: bool) -> CreatePageCommand {
        CreatePageCommand {
            title: title.into(),
            slug: None,
            content: "Hello".into(),
            is_published: published,
        }
    }

    #[tokio::test]
    async fn free_plan_allows_one_page() {
        let fx = Fixture::new(Plan::Free).await;
        let handler = ManagePagesHandler::new(Arc::new(fx.store.clone()), fx.gate());

        let first = handler.create(&fx.ctx, page("About Me", true)).await.unwrap();
        assert_eq!(first.slug, "about-me");

        let err = handler.create(&fx.ctx, page("Pricing", true)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::QuotaExceeded);
        assert_eq!(err.details["resource_kind"], "pages");

        handler.delete(&fx.ctx, first.id).await.unwrap();
        handler.create(&fx.ctx, page("Pricing", true)).await.unwrap();
    }

    #[tokio::test]
    async fn drafts_are_not_public() {
        let fx = Fixture::new(Plan::Pro).await;
        let handler = ManagePagesHandler::new(Arc::new(fx.store.clone()), fx.gate());
        handler.create(&fx.ctx, page("Draft", false)).await.unwrap();
        handler.create(&fx.ctx, page("Live", true)).await.unwrap();

        assert_eq!(handler.published(fx.ctx.trainer_id, "live").await.unwrap().title, "Live");
        assert_eq!(
            handler.published(fx.ctx.trainer_id, "draft").await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
