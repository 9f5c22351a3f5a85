use serde::{Deserialize, Serialize};

use super::{
    ContentItem, ContentKind, FieldContent, ImageContent, ListContent, SingleContent, TableContent,
};
use crate::ooxml::OoxmlError;

/// A bag of content items partitioned by kind.
///
/// Order across kinds is not significant: iteration always yields singles,
/// tables, lists, fields, then images. Within one kind, items keep their
/// insertion order and duplicates are preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    items: Vec<ContentItem>,
}

/// Root of the data passed to a fill
pub type Content = Container;

/// One horizontal repetition unit of a table
pub type TableRowContent = Container;

impl Container {
    pub fn new(items: impl IntoIterator<Item = ContentItem>) -> Self {
        Container {
            items: items.into_iter().collect(),
        }
    }

    /// Load a content tree from JSON
    pub fn from_json(json: &str) -> Result<Self, OoxmlError> {
        serde_json::from_str(json).map_err(|e| OoxmlError::ParseError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, OoxmlError> {
        serde_json::to_string(self).map_err(|e| OoxmlError::ParseError(e.to_string()))
    }

    /// Builder-style add
    pub fn add_content(mut self, item: impl Into<ContentItem>) -> Self {
        self.items.push(item.into());
        self
    }

    pub fn push(&mut self, item: impl Into<ContentItem>) {
        self.items.push(item.into());
    }

    /// Every item, kind by kind
    pub fn all(&self) -> Vec<&ContentItem> {
        ContentKind::ORDER
            .iter()
            .flat_map(|&kind| self.items.iter().filter(move |item| item.kind() == kind))
            .collect()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldContent> {
        self.items.iter().filter_map(|item| match item {
            ContentItem::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageContent> {
        self.items.iter().filter_map(|item| match item {
            ContentItem::Image(image) => Some(image),
            _ => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableContent> {
        self.items.iter().filter_map(|item| match item {
            ContentItem::Table(table) => Some(table),
            _ => None,
        })
    }

    pub fn lists(&self) -> impl Iterator<Item = &ListContent> {
        self.items.iter().filter_map(|item| match item {
            ContentItem::List(list) => Some(list),
            _ => None,
        })
    }

    pub fn singles(&self) -> impl Iterator<Item = &SingleContent> {
        self.items.iter().filter_map(|item| match item {
            ContentItem::Single(single) => Some(single),
            _ => None,
        })
    }

    /// First item (in kind order) with the given name
    pub fn content_item(&self, name: &str) -> Option<&ContentItem> {
        self.all().into_iter().find(|item| item.name() == name)
    }

    /// Names of every control this container can fill, nested ones included
    pub fn field_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for table in self.tables() {
            names.push(table.name().to_string());
            names.extend(table.field_names());
        }
        for list in self.lists() {
            names.push(list.name().to_string());
            names.extend(list.field_names());
        }
        names.extend(self.images().map(|image| image.name().to_string()));
        names.extend(self.fields().map(|field| field.name().to_string()));
        for single in self.singles() {
            names.push(single.name().to_string());
            names.push(single.child_name().to_string());
            names.extend(single.fields().field_names());
        }
        names
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.all() == other.all()
    }
}

impl FromIterator<ContentItem> for Container {
    fn from_iter<I: IntoIterator<Item = ContentItem>>(iter: I) -> Self {
        Container::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ListItemContent;

    fn sample() -> Content {
        Content::new(vec![
            FieldContent::new("Report date", "2013-06-09").into(),
            TableContent::new("Team")
                .add_row(vec![
                    FieldContent::new("Name", "Eric").into(),
                    FieldContent::new("Title", "Program Manager").into(),
                ])
                .add_row(vec![
                    FieldContent::new("Name", "Bob").into(),
                    FieldContent::new("Title", "Developer").into(),
                ])
                .into(),
            ListContent::new("Food")
                .add_item(ListItemContent::field("Category", "Fruit").add_nested_item(ListItemContent::field("Item", "Apple")))
                .into(),
        ])
    }

    #[test]
    fn test_partitions_by_kind() {
        let content = sample();
        let kinds: Vec<ContentKind> = content.all().iter().map(|item| item.kind()).collect();
        assert_eq!(kinds, vec![ContentKind::Table, ContentKind::List, ContentKind::Field]);
        assert_eq!(content.fields().count(), 1);
        assert_eq!(content.tables().count(), 1);
        assert_eq!(content.images().count(), 0);
    }

    #[test]
    fn test_equal_content_trees() {
        assert_eq!(sample(), sample());
    }

    #[test]
    fn test_declaration_order_across_kinds_is_irrelevant() {
        let a = Content::new(vec![
            FieldContent::new("A", "1").into(),
            TableContent::new("T").into(),
        ]);
        let b = Content::new(vec![
            TableContent::new("T").into(),
            FieldContent::new("A", "1").into(),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_order_within_kind_matters() {
        let a = Content::new(vec![FieldContent::new("A", "1").into(), FieldContent::new("B", "2").into()]);
        let b = Content::new(vec![FieldContent::new("B", "2").into(), FieldContent::new("A", "1").into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_changed_leaf_breaks_equality() {
        let changed = Content::new(vec![
            FieldContent::new("Report date", "2013-06-09").into(),
            TableContent::new("Team")
                .add_row(vec![
                    FieldContent::new("Name", "Eric").into(),
                    FieldContent::new("Title", "Program Manager").into(),
                ])
                .add_row(vec![
                    FieldContent::new("Name", "Bob").into(),
                    FieldContent::new("Title", "Tester").into(),
                ])
                .into(),
            ListContent::new("Food")
                .add_item(ListItemContent::field("Category", "Fruit").add_nested_item(ListItemContent::field("Item", "Apple")))
                .into(),
        ]);
        assert_ne!(sample(), changed);
        assert_ne!(Some(sample()), None);
    }

    #[test]
    fn test_duplicates_are_preserved() {
        let content = Content::new(vec![FieldContent::new("A", "1").into(), FieldContent::new("A", "1").into()]);
        assert_eq!(content.len(), 2);
    }

    #[test]
    fn test_field_names_are_recursive() {
        let names = sample().field_names();
        for expected in ["Team", "Name", "Title", "Food", "Category", "Item", "Report date"] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_content_item_lookup() {
        let content = sample();
        assert_eq!(content.content_item("Team").map(|i| i.kind()), Some(ContentKind::Table));
        assert!(content.content_item("Missing").is_none());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"items":[{"field":{"name":"A","value":"1"}},{"table":{"name":"T","rows":[{"items":[{"field":{"name":"B","value":"2"}}]}]}}]}"#;
        let content = Content::from_json(json).unwrap();
        let expected = Content::new(vec![
            FieldContent::new("A", "1").into(),
            TableContent::new("T").add_row(vec![FieldContent::new("B", "2").into()]).into(),
        ]);
        assert_eq!(content, expected);
        assert!(Content::from_json("{not json").is_err());
    }
}
