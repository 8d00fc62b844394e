use crate::store::Item;

/// Case-insensitive substring filter over title and subtitle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn parse(input: &str) -> Self {
        Self {
            needle: input.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.needle.is_empty()
            || item.title.to_lowercase().contains(&self.needle)
            || item.subtitle.to_lowercase().contains(&self.needle)
    }
}

/// Items passing `query`, in list order.
pub fn project<'a>(items: &'a [Item], query: &SearchQuery) -> Vec<&'a Item> {
    items.iter().filter(|item| query.matches(item)).collect()
}
