use std::path::Path;

use todo_sync_core::TodoRecord;

use crate::config::ReconcileConfig;

pub const BRANCH_LABEL_PREFIX: &str = "branch: ";
pub const TYPE_LABEL_PREFIX: &str = "type: ";
pub const AREA_LABEL_PREFIX: &str = "area: ";
pub const LANG_LABEL_PREFIX: &str = "lang: ";
pub const ESTIMATE_LABEL_PREFIX: &str = "estimate: ";

const MIN_ESTIMATE_HOURS: f64 = 0.01;
const MINUTES_PER_HOUR: f64 = 60.0;

/// Labels attached to an issue created for `todo`.
///
/// The sentinel label always comes first; the derived labels follow only when
/// extended labels are enabled.
pub fn issue_labels(todo: &TodoRecord, config: &ReconcileConfig) -> Vec<String> {
    let mut labels = vec![config.label.clone()];
    if !config.extended_labels {
        return labels;
    }
    labels.push(format!("{BRANCH_LABEL_PREFIX}{}", config.branch));
    labels.push(format!("{TYPE_LABEL_PREFIX}{}", todo.kind.to_lowercase()));
    if let Some(category) = todo.category.as_deref().filter(|value| !value.is_empty()) {
        labels.push(format!("{AREA_LABEL_PREFIX}{category}"));
    }
    if let Some(extension) = Path::new(&todo.file)
        .extension()
        .and_then(|extension| extension.to_str())
        .filter(|extension| !extension.is_empty())
    {
        labels.push(format!("{LANG_LABEL_PREFIX}{}", extension.to_lowercase()));
    }
    if let Some(estimate) = estimate_label(todo.estimate_hours) {
        labels.push(format!("{ESTIMATE_LABEL_PREFIX}{estimate}"));
    }
    labels
}

/// Formats an estimate as whole minutes below one hour, else as hours.
///
/// Estimates at or below 0.01h yield no label.
pub fn estimate_label(hours: f64) -> Option<String> {
    if !hours.is_finite() || hours <= MIN_ESTIMATE_HOURS {
        return None;
    }
    let minutes = (hours * MINUTES_PER_HOUR).round();
    if minutes >= MINUTES_PER_HOUR {
        // Single precision keeps `1.1` from rendering as `1.1000000000000001`.
        Some(format!("{}h", hours as f32))
    } else {
        Some(format!("{minutes}m"))
    }
}
