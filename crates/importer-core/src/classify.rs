use importer_sdk::ContentType;

/// Suffixes checked in order; the first match wins.
const DEFAULT_RULES: &[(&str, ContentType)] = &[
    (".mkd", ContentType::Markdown),
    (".txt", ContentType::Text),
];

/// Ordered `(suffix, type)` table used to pick the content type of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeRules {
    rules: Vec<(String, ContentType)>,
}

impl Default for ContentTypeRules {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.iter().map(|(suffix, ct)| (*suffix, *ct)))
    }
}

impl ContentTypeRules {
    pub fn new<S: Into<String>>(rules: impl IntoIterator<Item = (S, ContentType)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(suffix, ct)| (suffix.into(), ct))
                .collect(),
        }
    }

    /// Appends a rule with lower precedence than every existing one.
    pub fn with_rule(mut self, suffix: impl Into<String>, content_type: ContentType) -> Self {
        self.rules.push((suffix.into(), content_type));
        self
    }

    pub fn rules(&self) -> impl Iterator<Item = (&str, ContentType)> {
        self.rules.iter().map(|(suffix, ct)| (suffix.as_str(), *ct))
    }

    /// Returns the type of the first rule whose suffix ends `identifier`,
    /// falling back to `default`. Matching is case sensitive.
    pub fn classify(&self, identifier: &str, default: Option<ContentType>) -> Option<ContentType> {
        self.rules
            .iter()
            .find(|(suffix, _)| identifier.ends_with(suffix.as_str()))
            .map(|(_, ct)| *ct)
            .or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_maps_known_suffixes() {
        let rules = ContentTypeRules::default();
        assert_eq!(
            rules.classify("roses.mkd", None),
            Some(ContentType::Markdown)
        );
        assert_eq!(
            rules.classify("king_speech.txt", Some(ContentType::Png)),
            Some(ContentType::Text)
        );
    }

    #[test]
    fn unknown_suffix_falls_back_to_default() {
        let rules = ContentTypeRules::default();
        assert_eq!(
            rules.classify("logo.png", Some(ContentType::Png)),
            Some(ContentType::Png)
        );
        assert_eq!(rules.classify("notes.md", None), None);
        assert_eq!(rules.classify("NOTES.TXT", None), None);
    }

    #[test]
    fn earlier_rules_take_precedence() {
        let rules = ContentTypeRules::new([(".tar.txt", ContentType::Binary)])
            .with_rule(".txt", ContentType::Text);
        assert_eq!(
            rules.classify("bundle.tar.txt", None),
            Some(ContentType::Binary)
        );
        assert_eq!(rules.classify("a.txt", None), Some(ContentType::Text));
        assert_eq!(rules.rules().count(), 2);
    }
}
