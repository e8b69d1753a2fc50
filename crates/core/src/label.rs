use chrono::NaiveDate;

/// Shorten `text` to `budget` characters, marking the cut with `...`.
pub fn truncate(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let kept: String = text.chars().take(budget.saturating_sub(1)).collect();
    format!("{kept}...")
}

/// `2024-01-05T00:00:00` -> `01/05`.
pub fn date_label(label: &str) -> String {
    let day = label.split('T').next().unwrap_or(label);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => date.format("%m/%d").to_string(),
        Err(_) => day.split('-').skip(1).collect::<Vec<_>>().join("/"),
    }
}

pub fn value_text(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}
