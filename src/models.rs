use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

// ============ Pagination ============

/// A pagination window: `skip` records are passed over, at most `limit` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based offset into the server's ordering.
    pub skip: u32,
    /// Maximum number of records to return. Always positive.
    pub limit: u32,
}

impl PageRequest {
    /// Creates a window, clamping `limit` to at least one record.
    pub fn new(skip: u32, limit: u32) -> Self {
        Self {
            skip,
            limit: limit.max(1),
        }
    }

    /// The first page for the given page size.
    pub fn first(limit: u32) -> Self {
        Self::new(0, limit)
    }

    /// The window immediately following this one.
    pub fn next(&self) -> Self {
        Self::new(self.skip.saturating_add(self.limit), self.limit)
    }

    /// Query parameters for the wire: `skip` is omitted when zero.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(2);
        if self.skip > 0 {
            pairs.push(("skip", self.skip.to_string()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }
}

/// Body of the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// A record type the gateway can decode out of a list response.
pub trait Record: DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Checks value ranges the wire format cannot express.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

fn check_rating(field: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !(0.0..=5.0).contains(&v) => {
            Err(format!("{} out of range [0, 5]: {}", field, v))
        }
        _ => Ok(()),
    }
}

// ============ Records ============

/// A business listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub business_id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Average rating, 0 to 5 in half or tenth steps.
    pub stars: Option<f64>,
    pub review_count: Option<u32>,
    /// 1 when open, 0 when closed.
    pub is_open: Option<u8>,
    pub attributes: Option<String>,
    /// Comma separated, e.g. "Restaurants, Pizza".
    pub categories: Option<String>,
    pub hours: Option<String>,
}

impl Business {
    pub fn is_open(&self) -> Option<bool> {
        self.is_open.map(|flag| flag != 0)
    }

    /// Splits the free-text category list.
    pub fn category_list(&self) -> Vec<&str> {
        self.categories
            .as_deref()
            .map(|c| {
                c.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Record for Business {
    fn validate(&self) -> Result<(), String> {
        check_rating("business stars", self.stars)
    }
}

/// A review left by a user on a business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: String,
    pub user_id: Option<String>,
    pub business_id: Option<String>,
    pub stars: Option<f64>,
    pub useful: Option<u32>,
    pub funny: Option<u32>,
    pub cool: Option<u32>,
    pub text: Option<String>,
    #[serde(default, with = "timestamp_format")]
    pub date: Option<NaiveDateTime>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
}

impl Record for Review {
    fn validate(&self) -> Result<(), String> {
        check_rating("review stars", self.stars)
    }
}

/// A user profile with aggregate counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: Option<String>,
    pub review_count: Option<u32>,
    #[serde(default, with = "timestamp_format")]
    pub yelping_since: Option<NaiveDateTime>,
    pub friends: Option<String>,
    pub useful: Option<u32>,
    pub funny: Option<u32>,
    pub cool: Option<u32>,
    pub fans: Option<u32>,
    /// Comma separated years, or the literal "None".
    pub elite: Option<String>,
    pub average_stars: Option<f64>,
    pub compliment_hot: Option<u32>,
    pub compliment_more: Option<u32>,
    pub compliment_profile: Option<u32>,
    pub compliment_cute: Option<u32>,
    pub compliment_list: Option<u32>,
    pub compliment_note: Option<u32>,
    pub compliment_plain: Option<u32>,
    pub compliment_cool: Option<u32>,
    pub compliment_funny: Option<u32>,
    pub compliment_writer: Option<u32>,
    pub compliment_photos: Option<u32>,
}

impl User {
    /// Parsed elite years, in the order listed.
    pub fn elite_years(&self) -> Vec<&str> {
        match self.elite.as_deref() {
            None | Some("None") => Vec::new(),
            Some(elite) => elite
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Every compliment category with its counter, absent counters skipped.
    pub fn compliments(&self) -> Vec<(&'static str, u32)> {
        [
            ("Hot", self.compliment_hot),
            ("More", self.compliment_more),
            ("Profile", self.compliment_profile),
            ("Cute", self.compliment_cute),
            ("List", self.compliment_list),
            ("Note", self.compliment_note),
            ("Plain", self.compliment_plain),
            ("Cool", self.compliment_cool),
            ("Funny", self.compliment_funny),
            ("Writer", self.compliment_writer),
            ("Photos", self.compliment_photos),
        ]
        .into_iter()
        .filter_map(|(label, count)| count.map(|c| (label, c)))
        .collect()
    }

    /// The `n` largest non-zero compliment counters, largest first.
    pub fn top_compliments(&self, n: usize) -> Vec<(&'static str, u32)> {
        let mut compliments: Vec<_> = self
            .compliments()
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .collect();
        // stable sort keeps declaration order between equal counts
        compliments.sort_by(|a, b| b.1.cmp(&a.1));
        compliments.truncate(n);
        compliments
    }
}

impl Record for User {
    fn validate(&self) -> Result<(), String> {
        check_rating("user average_stars", self.average_stars)
    }
}

/// A short tip. Tips have no identifier of their own; see [`TipKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    pub user_id: String,
    pub business_id: String,
    pub text: Option<String>,
    #[serde(default, with = "timestamp_format")]
    pub date: Option<NaiveDateTime>,
    pub compliment_count: Option<u32>,
    pub year: Option<i32>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
}

/// Composite identity of a tip within one result sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TipKey {
    pub user_id: String,
    pub business_id: String,
    pub position: usize,
}

impl Tip {
    pub fn key(&self, position: usize) -> TipKey {
        TipKey {
            user_id: self.user_id.clone(),
            business_id: self.business_id.clone(),
            position,
        }
    }
}

impl Record for Tip {}

/// Check-ins for a business. `date` holds one or more comma separated timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkin {
    pub business_id: String,
    pub date: String,
}

impl Checkin {
    /// Parses every timestamp in `date`, skipping entries that do not parse.
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.date
            .split(',')
            .filter_map(|raw| timestamp_format::parse(raw.trim()))
            .collect()
    }
}

impl Record for Checkin {}

/// Lenient timestamp handling: the backend emits naive ISO timestamps, with
/// either a `T` or a space separator and an optional fractional part.
pub mod timestamp_format {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        if raw.is_empty() {
            return None;
        }
        for format in FORMATS {
            if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(ts);
            }
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.naive_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse(s.trim())
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
        }
    }
}
