//! Filters for each list view and the endpoint each one maps to.
//!
//! A filter value fully determines which server-side sequence a list view
//! pages through. Two equal filters always address the same sequence.

use crate::models::{Business, Checkin, Record, Review, Tip, User};
use std::fmt::Debug;

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Path segments of an endpoint, relative to the gateway base URL.
///
/// Segments are raw values; percent-encoding happens when the URL is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
}

impl Endpoint {
    fn api(resource: &str, rest: &[&str]) -> Self {
        let mut segments: Vec<String> = API_PREFIX.iter().map(|s| s.to_string()).collect();
        segments.push(resource.to_string());
        segments.extend(rest.iter().map(|s| s.to_string()));
        Self { segments }
    }

    /// A collection root; the backend serves these with a trailing slash.
    pub fn collection(resource: &str) -> Self {
        Self::api(resource, &[""])
    }

    /// `/api/v1/{resource}/{key}`
    pub fn keyed(resource: &str, key: &str) -> Self {
        Self::api(resource, &[key])
    }

    /// `/api/v1/{resource}/{selector}/{key}`
    pub fn filtered(resource: &str, selector: &str, key: &str) -> Self {
        Self::api(resource, &[selector, key])
    }

    /// An endpoint outside the versioned API prefix, such as `/health`.
    pub fn root(name: &str) -> Self {
        Self {
            segments: vec![name.to_string()],
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Display form with raw (unencoded) segments, for logs.
    pub fn display_path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// A filter that addresses one paginated server-side sequence.
pub trait ListQuery: Clone + PartialEq + Debug + Send + Sync + 'static {
    type Record: Record;

    fn endpoint(&self) -> Endpoint;

    /// Short label for logs.
    fn describe(&self) -> String {
        self.endpoint().display_path()
    }
}

/// Business list filter. Only one criterion applies per request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BusinessQuery {
    #[default]
    All,
    City(String),
    State(String),
    Name(String),
    MinStars(f64),
}

impl BusinessQuery {
    /// Builds a filter from optional inputs: city, then state, then name, then
    /// minimum rating. Blank text inputs are ignored.
    pub fn from_inputs(
        city: Option<&str>,
        state: Option<&str>,
        name: Option<&str>,
        min_stars: Option<f64>,
    ) -> Self {
        let non_blank = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        if let Some(city) = non_blank(city) {
            BusinessQuery::City(city)
        } else if let Some(state) = non_blank(state) {
            BusinessQuery::State(state)
        } else if let Some(name) = non_blank(name) {
            BusinessQuery::Name(name)
        } else if let Some(stars) = min_stars {
            BusinessQuery::MinStars(stars)
        } else {
            BusinessQuery::All
        }
    }
}

impl ListQuery for BusinessQuery {
    type Record = Business;

    fn endpoint(&self) -> Endpoint {
        match self {
            BusinessQuery::All => Endpoint::collection("businesses"),
            BusinessQuery::City(city) => Endpoint::filtered("businesses", "city", city),
            BusinessQuery::State(state) => Endpoint::filtered("businesses", "state", state),
            BusinessQuery::Name(name) => Endpoint::filtered("businesses", "name", name),
            BusinessQuery::MinStars(stars) => {
                Endpoint::filtered("businesses", "stars", &stars.to_string())
            }
        }
    }
}

/// Review list filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReviewQuery {
    #[default]
    All,
    Business(String),
    User(String),
}

impl ListQuery for ReviewQuery {
    type Record = Review;

    fn endpoint(&self) -> Endpoint {
        match self {
            ReviewQuery::All => Endpoint::collection("reviews"),
            ReviewQuery::Business(id) => Endpoint::filtered("reviews", "business", id),
            ReviewQuery::User(id) => Endpoint::filtered("reviews", "user", id),
        }
    }
}

/// User list filter. The backend only offers the full listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UserQuery {
    #[default]
    All,
}

impl ListQuery for UserQuery {
    type Record = User;

    fn endpoint(&self) -> Endpoint {
        match self {
            UserQuery::All => Endpoint::collection("users"),
        }
    }
}

/// Tip list filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TipQuery {
    #[default]
    All,
    Business(String),
    User(String),
}

impl ListQuery for TipQuery {
    type Record = Tip;

    fn endpoint(&self) -> Endpoint {
        match self {
            TipQuery::All => Endpoint::collection("tips"),
            TipQuery::Business(id) => Endpoint::filtered("tips", "business", id),
            TipQuery::User(id) => Endpoint::filtered("tips", "user", id),
        }
    }
}

/// Check-in list filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckinQuery {
    #[default]
    All,
    Business(String),
}

impl ListQuery for CheckinQuery {
    type Record = Checkin;

    fn endpoint(&self) -> Endpoint {
        match self {
            CheckinQuery::All => Endpoint::collection("checkins"),
            CheckinQuery::Business(id) => Endpoint::filtered("checkins", "business", id),
        }
    }
}
