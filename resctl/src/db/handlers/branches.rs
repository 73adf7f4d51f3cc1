//! Database repository for branches.

use crate::db::{errors::Result, models::branches::BranchDBResponse};
use crate::types::BranchId;
use sqlx::PgConnection;
use tracing::instrument;

pub struct Branches<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Branches<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: BranchId) -> Result<Option<BranchDBResponse>> {
        let branch = sqlx::query_as::<_, BranchDBResponse>("SELECT id, slug, name, created_at FROM branches WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(branch)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<BranchDBResponse>> {
        let branch = sqlx::query_as::<_, BranchDBResponse>("SELECT id, slug, name, created_at FROM branches WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(branch)
    }

    /// Look a branch up by a tenant identifier: a numeric id, otherwise a slug.
    #[instrument(skip(self), err)]
    pub async fn resolve(&mut self, identifier: &str) -> Result<Option<BranchDBResponse>> {
        let identifier = identifier.trim();
        match identifier.parse::<BranchId>() {
            Ok(id) => self.get_by_id(id).await,
            Err(_) => self.get_by_slug(identifier).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_resolve_by_id_and_slug(pool: PgPool) {
        sqlx::query("INSERT INTO branches (slug, name) VALUES ('harbour', 'Harbour Street')")
            .execute(&pool)
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Branches::new(&mut conn);

        let main = repo.resolve("1").await.unwrap().expect("seeded branch");
        assert_eq!(main.slug, "main");

        let harbour = repo.resolve("harbour").await.unwrap().expect("slug lookup");
        assert_eq!(harbour.name, "Harbour Street");
        assert_eq!(repo.resolve(&harbour.id.to_string()).await.unwrap(), Some(harbour));

        assert!(repo.resolve("999").await.unwrap().is_none());
        assert!(repo.resolve("nowhere").await.unwrap().is_none());
    }
}
