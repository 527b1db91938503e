use chrono::{DateTime, Utc};

/// Days the backend keeps an image after upload.
pub const RETENTION_DAYS: i64 = 3;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Days left before the backend is expected to delete an image:
/// `window - ceil(age / 1 day)`, floored at zero.
///
/// Informational only; deletion itself happens on the backend.
pub fn days_until_deletion(created_at: DateTime<Utc>, now: DateTime<Utc>, window_days: i64) -> i64 {
    let age_ms = (now - created_at).num_milliseconds();
    let elapsed_days = if age_ms <= 0 {
        0
    } else {
        (age_ms + DAY_MS - 1) / DAY_MS
    };
    (window_days - elapsed_days).max(0)
}

/// Label shown under each image.
pub fn deletion_label(days: i64) -> String {
    match days {
        0 => "Deleting soon".to_string(),
        1 => "Deletes in 1 day".to_string(),
        n => format!("Deletes in {n} days"),
    }
}
