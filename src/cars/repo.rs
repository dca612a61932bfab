use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::{
    filter::{push_where, CarFilter},
    paging::PageRequest,
    repo_types::{Car, CarFields},
};

const CAR_COLUMNS: &str =
    "id, make, model, year, price_eur, image_url, description, seller_uid, created_at";

#[async_trait]
pub trait CarRepository: Send + Sync {
    /// Rows of the requested page plus the total number of matching rows.
    async fn find_page(
        &self,
        filter: &CarFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<Car>, i64)>;

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Car>>;

    async fn insert(&self, fields: &CarFields, seller_uid: &str) -> anyhow::Result<Car>;

    /// Opens a unit of work for a read-check-write sequence on one row.
    async fn begin(&self) -> anyhow::Result<Box<dyn CarTransaction>>;
}

/// Uncommitted work is discarded when the transaction is dropped.
#[async_trait]
pub trait CarTransaction: Send {
    /// Reads the row and holds it until commit or rollback.
    async fn lock_by_id(&mut self, id: i64) -> anyhow::Result<Option<Car>>;

    async fn update(&mut self, id: i64, fields: &CarFields) -> anyhow::Result<Car>;

    async fn delete(&mut self, id: i64) -> anyhow::Result<()>;

    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct PgCarRepository {
    db: PgPool,
}

impl PgCarRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CarRepository for PgCarRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_page(
        &self,
        filter: &CarFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<Car>, i64)> {
        let predicates = filter.predicates();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM car");
        push_where(&predicates, &mut count);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await
            .context("count cars")?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {CAR_COLUMNS} FROM car"));
        push_where(&predicates, &mut select);
        select
            .push(" ORDER BY ")
            .push(page.sort.order_by_sql())
            .push(" LIMIT ")
            .push_bind(page.size)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<Car>()
            .fetch_all(&self.db)
            .await
            .context("list cars")?;

        Ok((rows, total))
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Car>> {
        let car = sqlx::query_as::<_, Car>(&format!(
            "SELECT {CAR_COLUMNS} FROM car WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find car by id")?;
        Ok(car)
    }

    #[tracing::instrument(skip(self, fields), level = "debug")]
    async fn insert(&self, fields: &CarFields, seller_uid: &str) -> anyhow::Result<Car> {
        let car = sqlx::query_as::<_, Car>(&format!(
            r#"
            INSERT INTO car (make, model, year, price_eur, image_url, description, seller_uid)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CAR_COLUMNS}
            "#
        ))
        .bind(&fields.make)
        .bind(&fields.model)
        .bind(fields.year)
        .bind(fields.price_eur)
        .bind(&fields.image_url)
        .bind(&fields.description)
        .bind(seller_uid)
        .fetch_one(&self.db)
        .await
        .context("insert car")?;
        Ok(car)
    }

    async fn begin(&self) -> anyhow::Result<Box<dyn CarTransaction>> {
        let tx = self.db.begin().await.context("begin tx")?;
        Ok(Box::new(PgCarTransaction { tx }))
    }
}

pub struct PgCarTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CarTransaction for PgCarTransaction {
    async fn lock_by_id(&mut self, id: i64) -> anyhow::Result<Option<Car>> {
        let car = sqlx::query_as::<_, Car>(&format!(
            "SELECT {CAR_COLUMNS} FROM car WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("lock car")?;
        Ok(car)
    }

    async fn update(&mut self, id: i64, fields: &CarFields) -> anyhow::Result<Car> {
        let car = sqlx::query_as::<_, Car>(&format!(
            r#"
            UPDATE car
               SET make = $2, model = $3, year = $4, price_eur = $5,
                   image_url = $6, description = $7
             WHERE id = $1
            RETURNING {CAR_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&fields.make)
        .bind(&fields.model)
        .bind(fields.year)
        .bind(fields.price_eur)
        .bind(&fields.image_url)
        .bind(&fields.description)
        .fetch_one(&mut *self.tx)
        .await
        .context("update car")?;
        Ok(car)
    }

    async fn delete(&mut self, id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM car WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .context("delete car")?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.tx.commit().await.context("commit tx")?;
        Ok(())
    }
}
