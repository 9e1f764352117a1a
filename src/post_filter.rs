//! Client-side filtering of records that are already loaded.
//!
//! Post-filters only decide what a view shows. They never cause a fetch and
//! never influence the pagination cursor or `has_more`, which always reflect
//! the raw page sizes returned by the server.

use crate::models::{Tip, User};
use chrono::Datelike;

/// A predicate over loaded records.
pub trait RecordFilter<T> {
    fn matches(&self, record: &T) -> bool;

    /// Whether the filter can hide anything at all.
    fn is_active(&self) -> bool {
        true
    }
}

/// Shows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

impl<T> RecordFilter<T> for NoFilter {
    fn matches(&self, _record: &T) -> bool {
        true
    }

    fn is_active(&self) -> bool {
        false
    }
}

/// Tip view filter: minimum compliment count and a specific year.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TipFilter {
    pub min_compliments: Option<u32>,
    pub year: Option<i32>,
}

impl TipFilter {
    fn tip_year(tip: &Tip) -> Option<i32> {
        tip.year.or_else(|| tip.date.map(|d| d.year()))
    }
}

impl RecordFilter<Tip> for TipFilter {
    fn matches(&self, tip: &Tip) -> bool {
        if let Some(min) = self.min_compliments {
            if tip.compliment_count.unwrap_or(0) < min {
                return false;
            }
        }
        if let Some(year) = self.year {
            if Self::tip_year(tip) != Some(year) {
                return false;
            }
        }
        true
    }

    fn is_active(&self) -> bool {
        self.min_compliments.is_some() || self.year.is_some()
    }
}

/// User view filter: minimum review count and minimum average rating.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UserFilter {
    pub min_reviews: Option<u32>,
    pub min_average_stars: Option<f64>,
}

impl RecordFilter<User> for UserFilter {
    fn matches(&self, user: &User) -> bool {
        if let Some(min) = self.min_reviews {
            if user.review_count.unwrap_or(0) < min {
                return false;
            }
        }
        if let Some(min) = self.min_average_stars {
            if user.average_stars.unwrap_or(0.0) < min {
                return false;
            }
        }
        true
    }

    fn is_active(&self) -> bool {
        self.min_reviews.is_some() || self.min_average_stars.is_some()
    }
}

/// What the post-filtered view amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleOutcome {
    /// `count` records pass the filter.
    Shown(usize),
    /// Nothing is loaded.
    NoResults,
    /// Records are loaded but the filter hides every one of them. A further
    /// server page may still contain matches when `more_available` is set.
    HiddenByFilter { hidden: usize, more_available: bool },
}

pub fn apply<'a, T, F: RecordFilter<T>>(items: &'a [T], filter: &F) -> Vec<&'a T> {
    if !filter.is_active() {
        return items.iter().collect();
    }
    items.iter().filter(|r| filter.matches(r)).collect()
}

pub fn outcome<T, F: RecordFilter<T>>(items: &[T], filter: &F, has_more: bool) -> VisibleOutcome {
    if items.is_empty() {
        return VisibleOutcome::NoResults;
    }
    match apply(items, filter).len() {
        0 => VisibleOutcome::HiddenByFilter {
            hidden: items.len(),
            more_available: has_more,
        },
        count => VisibleOutcome::Shown(count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tip(compliments: Option<u32>, year: Option<i32>, date: Option<&str>) -> Tip {
        serde_json::from_value(json!({
            "user_id": "u1",
            "business_id": "b1",
            "compliment_count": compliments,
            "year": year,
            "date": date,
        }))
        .unwrap()
    }

    fn user(reviews: Option<u32>, stars: Option<f64>) -> User {
        serde_json::from_value(json!({
            "user_id": "u1",
            "review_count": reviews,
            "average_stars": stars,
        }))
        .unwrap()
    }

    #[test]
    fn test_tip_filter_min_compliments() {
        let filter = TipFilter {
            min_compliments: Some(2),
            year: None,
        };
        assert!(filter.matches(&tip(Some(3), None, None)));
        assert!(!filter.matches(&tip(Some(1), None, None)));
        assert!(!filter.matches(&tip(None, None, None)));
    }

    #[test]
    fn test_tip_filter_year_falls_back_to_date() {
        let filter = TipFilter {
            min_compliments: None,
            year: Some(2015),
        };
        assert!(filter.matches(&tip(None, Some(2015), None)));
        assert!(filter.matches(&tip(None, None, Some("2015-03-01 10:00:00"))));
        assert!(!filter.matches(&tip(None, Some(2016), None)));
        assert!(!filter.matches(&tip(None, None, None)));
    }

    #[test]
    fn test_user_filter() {
        let filter = UserFilter {
            min_reviews: Some(10),
            min_average_stars: Some(4.0),
        };
        assert!(filter.matches(&user(Some(12), Some(4.2))));
        assert!(!filter.matches(&user(Some(12), Some(3.9))));
        assert!(!filter.matches(&user(None, Some(5.0))));
    }

    #[test]
    fn test_inactive_filter_shows_everything() {
        let users = vec![user(None, None), user(Some(1), Some(1.0))];
        assert!(!UserFilter::default().is_active());
        assert_eq!(apply(&users, &UserFilter::default()).len(), 2);
        assert_eq!(apply(&users, &NoFilter).len(), 2);
    }

    #[test]
    fn test_outcome_distinguishes_hidden_from_empty() {
        let filter = TipFilter {
            min_compliments: Some(100),
            year: None,
        };
        let tips = vec![tip(Some(1), None, None), tip(Some(2), None, None)];

        assert_eq!(
            outcome(&tips, &filter, true),
            VisibleOutcome::HiddenByFilter {
                hidden: 2,
                more_available: true
            }
        );
        assert_eq!(
            outcome::<Tip, _>(&[], &filter, false),
            VisibleOutcome::NoResults
        );
        assert_eq!(outcome(&tips, &NoFilter, false), VisibleOutcome::Shown(2));
    }
}
