//! Caller-supplied data for a template fill
//!
//! Every item carries the name of the content control it targets. Items are
//! immutable once built; the engine only reads them.

mod container;
mod items;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use container::{Container, Content, TableRowContent};
pub use items::{FieldContent, ImageContent, ListContent, ListItemContent, SingleContent, TableContent};

/// Concrete kind of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    Single,
    Table,
    List,
    Field,
    Image,
}

impl ContentKind {
    /// Order in which a container yields its partitions
    pub const ORDER: [ContentKind; 5] = [
        ContentKind::Single,
        ContentKind::Table,
        ContentKind::List,
        ContentKind::Field,
        ContentKind::Image,
    ];

    /// Label used in error messages
    pub fn label(self) -> &'static str {
        match self {
            ContentKind::Single => "Single",
            ContentKind::Table => "Table",
            ContentKind::List => "List",
            ContentKind::Field => "Field",
            ContentKind::Image => "Image",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One typed unit of data, matched to a content control by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentItem {
    Field(FieldContent),
    Image(ImageContent),
    Table(TableContent),
    List(ListContent),
    Single(SingleContent),
}

impl ContentItem {
    /// Tag of the content control this item fills
    pub fn name(&self) -> &str {
        match self {
            ContentItem::Field(item) => item.name(),
            ContentItem::Image(item) => item.name(),
            ContentItem::Table(item) => item.name(),
            ContentItem::List(item) => item.name(),
            ContentItem::Single(item) => item.name(),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentItem::Field(_) => ContentKind::Field,
            ContentItem::Image(_) => ContentKind::Image,
            ContentItem::Table(_) => ContentKind::Table,
            ContentItem::List(_) => ContentKind::List,
            ContentItem::Single(_) => ContentKind::Single,
        }
    }
}

impl From<FieldContent> for ContentItem {
    fn from(item: FieldContent) -> Self {
        ContentItem::Field(item)
    }
}

impl From<ImageContent> for ContentItem {
    fn from(item: ImageContent) -> Self {
        ContentItem::Image(item)
    }
}

impl From<TableContent> for ContentItem {
    fn from(item: TableContent) -> Self {
        ContentItem::Table(item)
    }
}

impl From<ListContent> for ContentItem {
    fn from(item: ListContent) -> Self {
        ContentItem::List(item)
    }
}

impl From<SingleContent> for ContentItem {
    fn from(item: SingleContent) -> Self {
        ContentItem::Single(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(ContentKind::Field.to_string(), "Field");
        assert_eq!(ContentKind::Single.label(), "Single");
    }

    #[test]
    fn test_item_name_and_kind() {
        let item: ContentItem = TableContent::new("Team").into();
        assert_eq!(item.name(), "Team");
        assert_eq!(item.kind(), ContentKind::Table);
    }
}
