use crate::models::Clip;

/// Case-insensitive substring filter over clip texts.
/// The local fallback when semantic search is unavailable or fails.
/// An empty query matches everything, preserving list order.
pub fn substring_filter<'a>(clips: &'a [Clip], query: &str) -> Vec<&'a Clip> {
    if query.is_empty() {
        return clips.iter().collect();
    }

    let needle = query.to_lowercase();
    clips
        .iter()
        .filter(|clip| clip.text.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClipMeta;

    fn clips(texts: &[&str]) -> Vec<Clip> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Clip::new(i as u64 + 1, t.to_string(), ClipMeta::default()))
            .collect()
    }

    #[test]
    fn test_empty_query_matches_all() {
        let clips = clips(&["one", "two"]);
        assert_eq!(substring_filter(&clips, "").len(), 2);
    }

    #[test]
    fn test_case_insensitive_match() {
        let clips = clips(&["Hello World", "goodbye", "HELLO again"]);
        let matched = substring_filter(&clips, "hello");

        let texts: Vec<&str> = matched.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello World", "HELLO again"]);
    }

    #[test]
    fn test_preserves_list_order() {
        let clips = clips(&["abc", "zzz", "cab"]);
        let matched = substring_filter(&clips, "ab");

        let texts: Vec<&str> = matched.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abc", "cab"]);
    }

    #[test]
    fn test_no_match() {
        let clips = clips(&["one", "two"]);
        assert!(substring_filter(&clips, "three").is_empty());
    }
}
