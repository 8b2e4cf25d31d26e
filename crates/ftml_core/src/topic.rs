use crate::metadata::Metadata;

/// One exported page, destined to become one node of the published TOC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: String,
    pub title: String,
    /// Path of the page relative to the export folder; also its archive entry name.
    pub link: String,
    pub content: String,
    pub metadata: Metadata,
    pub sub_topics: Vec<Topic>,
}

impl Topic {
    /// Topic for `link`, with its id derived from the file name.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        let link = link.into();
        Self {
            id: Self::id_from_link(&link),
            title: title.into(),
            link,
            content: String::new(),
            metadata: Metadata::new(),
            sub_topics: Vec::new(),
        }
    }

    /// Everything before the first `.` of the link: `intro.html` -> `intro`.
    pub fn id_from_link(link: &str) -> String {
        link.split('.').next().unwrap_or(link).to_string()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_sub_topics(mut self, sub_topics: Vec<Topic>) -> Self {
        self.sub_topics = sub_topics;
        self
    }

    pub fn has_children(&self) -> bool {
        !self.sub_topics.is_empty()
    }
}

/// Depth-first, pre-order view of a topic forest.
pub fn flatten_preorder(topics: &[Topic]) -> Vec<&Topic> {
    let mut out = Vec::new();
    for topic in topics {
        visit(topic, &mut out);
    }
    out
}

fn visit<'a>(topic: &'a Topic, out: &mut Vec<&'a Topic>) {
    out.push(topic);
    for child in &topic.sub_topics {
        visit(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::{flatten_preorder, Topic};

    #[test]
    fn id_is_taken_before_first_dot() {
        assert_eq!(Topic::id_from_link("install.guide.html"), "install");
        assert_eq!(Topic::id_from_link("readme"), "readme");
        assert_eq!(Topic::new("Intro", "intro.html").id, "intro");
    }

    #[test]
    fn preorder_visits_parent_before_children() {
        let tree = vec![
            Topic::new("A", "a.html").with_sub_topics(vec![
                Topic::new("A1", "a1.html")
                    .with_sub_topics(vec![Topic::new("A1x", "a1x.html")]),
                Topic::new("A2", "a2.html"),
            ]),
            Topic::new("B", "b.html"),
        ];
        let links: Vec<_> = flatten_preorder(&tree)
            .into_iter()
            .map(|t| t.link.as_str())
            .collect();
        assert_eq!(links, vec!["a.html", "a1.html", "a1x.html", "a2.html", "b.html"]);
    }
}
