//! OOXML (Office Open XML) plumbing for Word documents (.docx)
//!
//! This module opens the OPC package, exposes the WordprocessingML parts
//! the fill engine rewrites (main document, styles, numbering, headers and
//! footers) as mutable XML trees, and writes them back.
//!
//! # Example
//!
//! ```rust,no_run
//! use docx_templater::ooxml::{OpcPackage, WordDocument};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file_data = std::fs::read("template.docx")?;
//!     let document = WordDocument::parse(OpcPackage::new(&file_data)?)?;
//!     println!("headers: {}", document.headers.len());
//!     Ok(())
//! }
//! ```

mod document;
mod error;
pub mod names;
mod opc;
mod types;
mod xml;

pub use document::{ImageStore, WordDocument};
pub use error::OoxmlError;
pub use opc::{ImagePartSink, ImageParts, OpcPackage};
pub use types::{ContentType, PackagePart, Relationship, RelationshipType};
pub use xml::{NodeId, XmlAttribute, XmlDocument};

#[cfg(test)]
pub(crate) use opc::tests::{build_package, CONTENT_TYPES, ROOT_RELS};
