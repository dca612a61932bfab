use sqlx::{Postgres, QueryBuilder};

use super::{dto::ListParams, repo_types::Car};

/// Optional listing criteria; absent criteria impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarFilter {
    pub make: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub price_from: Option<i32>,
    pub price_to: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive substring; the term is stored lower-cased.
    MakeContains(String),
    YearAtLeast(i32),
    YearAtMost(i32),
    PriceAtLeast(i32),
    PriceAtMost(i32),
}

impl CarFilter {
    pub fn from_params(params: &ListParams) -> Self {
        Self {
            make: params.make.clone(),
            year_from: params.year_from,
            year_to: params.year_to,
            price_from: params.price_from,
            price_to: params.price_to,
        }
    }

    /// Conjunction of the present criteria. A blank `make` counts as absent.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut out = Vec::new();
        if let Some(make) = self.make.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            out.push(Predicate::MakeContains(make.to_lowercase()));
        }
        if let Some(y) = self.year_from {
            out.push(Predicate::YearAtLeast(y));
        }
        if let Some(y) = self.year_to {
            out.push(Predicate::YearAtMost(y));
        }
        if let Some(p) = self.price_from {
            out.push(Predicate::PriceAtLeast(p));
        }
        if let Some(p) = self.price_to {
            out.push(Predicate::PriceAtMost(p));
        }
        out
    }
}

impl Predicate {
    pub fn matches(&self, car: &Car) -> bool {
        match self {
            Predicate::MakeContains(term) => car.make.to_lowercase().contains(term.as_str()),
            Predicate::YearAtLeast(y) => car.year >= *y,
            Predicate::YearAtMost(y) => car.year <= *y,
            Predicate::PriceAtLeast(p) => car.price_eur >= *p,
            Predicate::PriceAtMost(p) => car.price_eur <= *p,
        }
    }
}

pub fn matches_all(predicates: &[Predicate], car: &Car) -> bool {
    predicates.iter().all(|p| p.matches(car))
}

/// Appends ` WHERE a AND b ...`; appends nothing for an empty conjunction.
pub fn push_where(predicates: &[Predicate], qb: &mut QueryBuilder<'_, Postgres>) {
    for (i, predicate) in predicates.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match predicate {
            Predicate::MakeContains(term) => {
                qb.push("LOWER(make) LIKE ")
                    .push_bind(like_pattern(term))
                    .push(" ESCAPE '\\'");
            }
            Predicate::YearAtLeast(y) => {
                qb.push("year >= ").push_bind(*y);
            }
            Predicate::YearAtMost(y) => {
                qb.push("year <= ").push_bind(*y);
            }
            Predicate::PriceAtLeast(p) => {
                qb.push("price_eur >= ").push_bind(*p);
            }
            Predicate::PriceAtMost(p) => {
                qb.push("price_eur <= ").push_bind(*p);
            }
        }
    }
}

fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
