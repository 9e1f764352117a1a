//! Plain-text rendering of records for the command-line views.

use crate::models::{Business, Checkin, Review, Tip, User};
use chrono::NaiveDateTime;

const STAR: char = '★';

/// Rounded star glyphs followed by the exact value, e.g. `★★★★ 4.5`.
pub fn stars(rating: Option<f64>) -> String {
    match rating {
        Some(r) if r > 0.0 => {
            let glyphs: String = std::iter::repeat(STAR)
                .take(r.round().clamp(0.0, 5.0) as usize)
                .collect();
            format!("{} {:.1}", glyphs, r)
        }
        _ => String::new(),
    }
}

/// Cuts `text` to `max_chars` characters, marking the cut with `...`.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

pub fn date(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "No date".to_string())
}

/// First three categories.
pub fn categories(business: &Business) -> String {
    let list = business.category_list();
    list.iter().take(3).copied().collect::<Vec<_>>().join(", ")
}

/// `Elite: 2017, 2018, 2019 +2 more`, or `None` for non-elite users.
pub fn elite_summary(user: &User) -> Option<String> {
    let years = user.elite_years();
    if years.is_empty() {
        return None;
    }
    let mut summary = format!("Elite: {}", years[..years.len().min(3)].join(", "));
    if years.len() > 3 {
        summary.push_str(&format!(" +{} more", years.len() - 3));
    }
    Some(summary)
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("Unknown")
}

pub fn business_line(business: &Business) -> String {
    let open = match business.is_open() {
        Some(true) => "open",
        Some(false) => "closed",
        None => "-",
    };
    format!(
        "{} | {}, {} | {} | {} reviews | {} | {}",
        or_unknown(&business.name),
        or_unknown(&business.city),
        or_unknown(&business.state),
        stars(business.stars),
        business.review_count.unwrap_or(0),
        open,
        categories(business)
    )
}

pub fn review_line(review: &Review) -> String {
    format!(
        "{} | {} | {} | {} | useful {} funny {} cool {} | {}",
        review.business_name.as_deref().unwrap_or("Business"),
        review.user_name.as_deref().unwrap_or("Anonymous"),
        stars(review.stars),
        date(review.date),
        review.useful.unwrap_or(0),
        review.funny.unwrap_or(0),
        review.cool.unwrap_or(0),
        truncate(review.text.as_deref().unwrap_or(""), 200)
    )
}

pub fn user_line(user: &User) -> String {
    let compliments = user
        .top_compliments(3)
        .iter()
        .map(|(label, count)| format!("{}: {}", label, count))
        .collect::<Vec<_>>()
        .join(", ");
    let mut line = format!(
        "{} | {} reviews | {} | since {} | {} fans",
        or_unknown(&user.name),
        user.review_count.unwrap_or(0),
        stars(user.average_stars),
        date(user.yelping_since),
        user.fans.unwrap_or(0)
    );
    if let Some(elite) = elite_summary(user) {
        line.push_str(&format!(" | {}", elite));
    }
    if !compliments.is_empty() {
        line.push_str(&format!(" | {}", compliments));
    }
    line
}

pub fn tip_line(tip: &Tip) -> String {
    let compliments = match tip.compliment_count {
        Some(0) | None => String::new(),
        Some(1) => " | 1 compliment".to_string(),
        Some(n) => format!(" | {} compliments", n),
    };
    format!(
        "{} on {} | {}{} | {}",
        tip.user_name.as_deref().unwrap_or(&tip.user_id),
        tip.business_name.as_deref().unwrap_or(&tip.business_id),
        date(tip.date),
        compliments,
        truncate(tip.text.as_deref().unwrap_or(""), 150)
    )
}

pub fn checkin_line(checkin: &Checkin) -> String {
    format!(
        "{} | {} check-ins",
        checkin.business_id,
        checkin.timestamps().len()
    )
}
