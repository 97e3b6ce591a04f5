const REPLACED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Maps a free-form display name to a member name a WebDAV server will
/// accept. `attempt` > 0 yields the n-th variation used after a collision.
/// Returns `None` when nothing usable is left.
pub fn member_name(display_name: &str, attempt: u32) -> Option<String> {
    let safe: String = display_name
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| {
            if c.is_whitespace() || REPLACED.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    if safe.is_empty() || safe == "." || safe == ".." {
        return None;
    }
    if attempt == 0 {
        return Some(safe);
    }

    if let Some((stem, ext)) = safe.rsplit_once('.')
        && !stem.is_empty()
        && !ext.is_empty()
    {
        return Some(format!("{stem}_{attempt}.{ext}"));
    }
    Some(format!("{safe}_{attempt}"))
}
