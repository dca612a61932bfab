//! In-memory `CarRepository` for service and router tests.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    filter::{matches_all, CarFilter},
    paging::PageRequest,
    repo::{CarRepository, CarTransaction},
    repo_types::{Car, CarFields},
};

#[derive(Debug, Default)]
struct Store {
    last_id: i64,
    rows: BTreeMap<i64, Car>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCarRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryCarRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row verbatim, e.g. a legacy listing without a seller.
    pub async fn seed(&self, car: Car) {
        let mut store = self.store.lock().await;
        store.last_id = store.last_id.max(car.id);
        store.rows.insert(car.id, car);
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.rows.len()
    }
}

#[async_trait]
impl CarRepository for InMemoryCarRepository {
    async fn find_page(
        &self,
        filter: &CarFilter,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<Car>, i64)> {
        let predicates = filter.predicates();
        let store = self.store.lock().await;
        let mut matching: Vec<Car> = store
            .rows
            .values()
            .filter(|car| matches_all(&predicates, car))
            .cloned()
            .collect();
        matching.sort_by(|a, b| page.sort.compare(a, b));
        let total = matching.len() as i64;
        let rows = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.size).unwrap_or(0))
            .collect();
        Ok((rows, total))
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Car>> {
        Ok(self.store.lock().await.rows.get(&id).cloned())
    }

    async fn insert(&self, fields: &CarFields, seller_uid: &str) -> anyhow::Result<Car> {
        let mut store = self.store.lock().await;
        store.last_id += 1;
        let car = Car {
            id: store.last_id,
            make: fields.make.clone(),
            model: fields.model.clone(),
            year: fields.year,
            price_eur: fields.price_eur,
            image_url: fields.image_url.clone(),
            description: fields.description.clone(),
            seller_uid: Some(seller_uid.to_string()),
            created_at: OffsetDateTime::now_utc(),
        };
        store.rows.insert(car.id, car.clone());
        Ok(car)
    }

    async fn begin(&self) -> anyhow::Result<Box<dyn CarTransaction>> {
        let guard = self.store.clone().lock_owned().await;
        Ok(Box::new(InMemoryTransaction {
            guard,
            pending: Vec::new(),
        }))
    }
}

enum Pending {
    Put(Car),
    Remove(i64),
}

/// Holds the store lock for its whole lifetime; writes land on commit.
struct InMemoryTransaction {
    guard: OwnedMutexGuard<Store>,
    pending: Vec<Pending>,
}

#[async_trait]
impl CarTransaction for InMemoryTransaction {
    async fn lock_by_id(&mut self, id: i64) -> anyhow::Result<Option<Car>> {
        Ok(self.guard.rows.get(&id).cloned())
    }

    async fn update(&mut self, id: i64, fields: &CarFields) -> anyhow::Result<Car> {
        let mut car = self
            .guard
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("car {id} vanished inside transaction"))?;
        car.apply(fields);
        self.pending.push(Pending::Put(car.clone()));
        Ok(car)
    }

    async fn delete(&mut self, id: i64) -> anyhow::Result<()> {
        self.pending.push(Pending::Remove(id));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let InMemoryTransaction { mut guard, pending } = *self;
        for op in pending {
            match op {
                Pending::Put(car) => {
                    guard.rows.insert(car.id, car);
                }
                Pending::Remove(id) => {
                    guard.rows.remove(&id);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cars::paging::{Direction, Sort, SortField};

    fn fields(make: &str, year: i32, price: i32) -> CarFields {
        CarFields {
            make: make.into(),
            model: "M".into(),
            year,
            price_eur: price,
            image_url: "https://img.example/x.jpg".into(),
            description: None,
        }
    }

    #[tokio::test]
    async fn uncommitted_transaction_changes_nothing() {
        let repo = InMemoryCarRepository::new();
        let car = repo.insert(&fields("Audi", 2010, 1), "uid").await.expect("insert");

        {
            let mut tx = repo.begin().await.expect("begin");
            tx.delete(car.id).await.expect("delete");
        }

        assert!(repo.find_by_id(car.id).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn pages_follow_sort_with_id_tie_break() {
        let repo = InMemoryCarRepository::new();
        for (make, price) in [("A", 300), ("B", 100), ("C", 300), ("D", 200)] {
            repo.insert(&fields(make, 2010, price), "uid").await.expect("insert");
        }
        let page = PageRequest {
            page: 0,
            size: 3,
            sort: Sort {
                field: SortField::PriceEur,
                direction: Direction::Desc,
            },
        };
        let (rows, total) = repo.find_page(&CarFilter::default(), &page).await.expect("page");
        assert_eq!(total, 4);
        let makes: Vec<_> = rows.iter().map(|c| c.make.as_str()).collect();
        assert_eq!(makes, vec!["A", "C", "D"]);
    }
}
