//! Hashtags in object notes.

/// Hashtags found in a notes string.
///
/// A hashtag is `#` followed by one or more ASCII alphanumeric characters.
/// Comparisons ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hashtags {
    tags: Vec<String>,
}

impl Hashtags {
    /// Find all hashtags in `notes`.
    pub fn new(notes: &str) -> Self {
        let mut tags = Vec::new();
        let mut rest = notes;
        while let Some(i) = rest.find('#') {
            let after = &rest[i + 1..];
            let len = after
                .find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(after.len());
            if len > 0 {
                tags.push(format!("#{}", &after[..len]));
            }
            rest = &after[len..];
        }
        Hashtags { tags }
    }

    /// Check whether a hashtag is present (ignoring case).
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}
