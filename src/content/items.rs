use std::path::Path;

use serde::{Deserialize, Serialize};

use super::container::{Container, Content, TableRowContent};
use super::ContentItem;
use crate::ooxml::OoxmlError;

/// Plain text value for one control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldContent {
    name: String,
    #[serde(default)]
    value: String,
}

impl FieldContent {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        FieldContent {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Image bytes for a control holding a picture.
///
/// Names compare case-insensitively, bytes compare exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    name: String,
    #[serde(default)]
    binary: Vec<u8>,
}

impl ImageContent {
    pub fn new(name: impl Into<String>, binary: Vec<u8>) -> Self {
        ImageContent {
            name: name.into(),
            binary,
        }
    }

    /// Read the image file right away
    pub fn from_file(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, OoxmlError> {
        let binary = std::fs::read(path)?;
        Ok(ImageContent::new(name, binary))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binary(&self) -> &[u8] {
        &self.binary
    }
}

impl PartialEq for ImageContent {
    fn eq(&self, other: &Self) -> bool {
        self.name.to_lowercase() == other.name.to_lowercase() && self.binary == other.binary
    }
}

/// Rows of data for a repeating table region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableContent {
    name: String,
    #[serde(default)]
    rows: Vec<TableRowContent>,
}

impl TableContent {
    pub fn new(name: impl Into<String>) -> Self {
        TableContent {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(name: impl Into<String>, rows: impl IntoIterator<Item = TableRowContent>) -> Self {
        TableContent {
            name: name.into(),
            rows: rows.into_iter().collect(),
        }
    }

    pub fn add_row(self, items: Vec<ContentItem>) -> Self {
        self.add_row_content(Container::new(items))
    }

    pub fn add_row_content(mut self, row: TableRowContent) -> Self {
        self.rows.push(row);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[TableRowContent] {
        &self.rows
    }

    /// Distinct control names used by any row
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.rows.iter().flat_map(|row| row.field_names()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// One entry of a list, with optional deeper entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItemContent {
    #[serde(default)]
    content: Container,
    #[serde(default)]
    nested_items: Vec<ListItemContent>,
}

impl ListItemContent {
    pub fn new(items: Vec<ContentItem>) -> Self {
        ListItemContent {
            content: Container::new(items),
            nested_items: Vec::new(),
        }
    }

    /// Item holding a single field
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        ListItemContent::new(vec![FieldContent::new(name, value).into()])
    }

    pub fn with_nested(items: Vec<ContentItem>, nested_items: Vec<ListItemContent>) -> Self {
        ListItemContent {
            content: Container::new(items),
            nested_items,
        }
    }

    pub fn add_content(mut self, item: impl Into<ContentItem>) -> Self {
        self.content.push(item);
        self
    }

    pub fn add_nested_item(mut self, item: ListItemContent) -> Self {
        self.nested_items.push(item);
        self
    }

    pub fn content(&self) -> &Container {
        &self.content
    }

    pub fn nested_items(&self) -> &[ListItemContent] {
        &self.nested_items
    }

    pub fn field_names(&self) -> Vec<String> {
        let mut names = self.content.field_names();
        for nested in &self.nested_items {
            for name in nested.field_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// Items for a repeating list region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListContent {
    name: String,
    #[serde(default)]
    items: Vec<ListItemContent>,
}

impl ListContent {
    pub fn new(name: impl Into<String>) -> Self {
        ListContent {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn with_items(name: impl Into<String>, items: impl IntoIterator<Item = ListItemContent>) -> Self {
        ListContent {
            name: name.into(),
            items: items.into_iter().collect(),
        }
    }

    pub fn add_item(mut self, item: ListItemContent) -> Self {
        self.items.push(item);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[ListItemContent] {
        &self.items
    }

    /// Distinct control names used by any item at any depth
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.items.iter().flat_map(|item| item.field_names()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Picks one child control of a wrapper control and fills it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleContent {
    name: String,
    child_name: String,
    #[serde(default)]
    fields: Content,
}

impl SingleContent {
    pub fn new(name: impl Into<String>, child_name: impl Into<String>, fields: Vec<ContentItem>) -> Self {
        SingleContent {
            name: name.into(),
            child_name: child_name.into(),
            fields: Container::new(fields),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn child_name(&self) -> &str {
        &self.child_name
    }

    pub fn fields(&self) -> &Content {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_name_is_case_insensitive() {
        let a = ImageContent::new("Logo", vec![1, 2, 3]);
        let b = ImageContent::new("LOGO", vec![1, 2, 3]);
        let c = ImageContent::new("logo", vec![1, 2, 4]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_image_from_missing_file() {
        assert!(ImageContent::from_file("Logo", "/nonexistent/logo.png").is_err());
    }

    #[test]
    fn test_table_field_names_are_distinct() {
        let table = TableContent::new("Team")
            .add_row(vec![FieldContent::new("Name", "Eric").into()])
            .add_row(vec![FieldContent::new("Name", "Bob").into()]);
        assert_eq!(table.field_names(), vec!["Name".to_string()]);
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn test_list_field_names_include_nested() {
        let list = ListContent::new("Food").add_item(
            ListItemContent::field("Category", "Fruit").add_nested_item(ListItemContent::field("Item", "Apple")),
        );
        assert_eq!(list.field_names(), vec!["Category".to_string(), "Item".to_string()]);
    }

    #[test]
    fn test_single_content_accessors() {
        let single = SingleContent::new("Greeting", "Formal", vec![FieldContent::new("Name", "Ann").into()]);
        assert_eq!(single.name(), "Greeting");
        assert_eq!(single.child_name(), "Formal");
        assert_eq!(single.fields().len(), 1);
    }

    #[test]
    fn test_nested_list_equality() {
        let make = |leaf: &str| {
            ListContent::new("L").add_item(ListItemContent::field("A", "1").add_nested_item(ListItemContent::field("B", leaf)))
        };
        assert_eq!(make("x"), make("x"));
        assert_ne!(make("x"), make("y"));
    }
}
