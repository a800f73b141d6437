use similar::TextDiff;

/// Unified diff of `current` against `persisted`, labelled with `label`.
/// `None` when the texts match.
pub fn unsaved_changes_diff(persisted: &str, current: &str, label: &str) -> Option<String> {
    if persisted == current {
        return None;
    }

    let diff = TextDiff::from_lines(persisted, current);
    let header_old = format!("saved/{label}");
    let header_new = format!("buffer/{label}");

    Some(
        diff.unified_diff()
            .header(&header_old, &header_new)
            .to_string(),
    )
}
