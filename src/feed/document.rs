/// The RSS 2.0 channel of a fetched feed. Lives only for one fetch cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDocument {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Publish date exactly as the feed wrote it
    pub pub_date: String,
}

impl FeedItem {
    pub fn new(title: &str, link: &str, pub_date: &str) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
            description: String::new(),
            pub_date: pub_date.to_string(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}
