//! Fill Word (.docx) templates through their content controls
//!
//! A template marks its placeholders with tagged content controls. A
//! [`Content`] tree names those tags and supplies field values, table rows,
//! list items, images and single-choice blocks; [`TemplateProcessor`] writes
//! them into the body, headers and footers.

pub mod content;
pub mod control;
pub mod numbering;
pub mod ooxml;
pub mod options;
pub mod processors;
pub mod result;
pub mod template;

pub use content::{
    Container, Content, ContentItem, ContentKind, FieldContent, ImageContent, ListContent, ListItemContent,
    SingleContent, TableContent, TableRowContent,
};
pub use ooxml::OoxmlError;
pub use options::FillOptions;
pub use result::{FillError, HandledItem, ProcessResult};
pub use template::TemplateProcessor;
