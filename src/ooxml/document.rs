//! WordprocessingML document parts the fill engine works on

use std::collections::BTreeMap;

use log::debug;

use super::error::OoxmlError;
use super::opc::{ImagePartSink, ImageParts, OpcPackage};
use super::types::RelationshipType;
use super::xml::XmlDocument;

/// Where new image parts go
#[derive(Debug, Clone)]
pub enum ImageStore {
    /// Images become parts of the opened package
    Package(OpcPackage),
    /// Loose trees: images are collected in memory
    Detached(ImageParts),
}

impl ImagePartSink for ImageStore {
    fn add_image_part(&mut self, owner_part: &str, data: &[u8]) -> Result<String, OoxmlError> {
        match self {
            ImageStore::Package(package) => package.add_image_part(owner_part, data),
            ImageStore::Detached(images) => images.add_image_part(owner_part, data),
        }
    }
}

/// Parsed parts of a Word document
#[derive(Debug, Clone)]
pub struct WordDocument {
    /// Part name of the main document (e.g. "word/document.xml")
    pub main_part_name: String,
    /// Main document tree
    pub main: XmlDocument,
    /// Styles part, if any: (part name, tree)
    pub styles: Option<(String, XmlDocument)>,
    /// Numbering part, if any: (part name, tree)
    pub numbering: Option<(String, XmlDocument)>,
    /// Header trees indexed by part name
    pub headers: BTreeMap<String, XmlDocument>,
    /// Footer trees indexed by part name
    pub footers: BTreeMap<String, XmlDocument>,
    /// Image part collaborator
    pub images: ImageStore,
}

impl WordDocument {
    /// Wrap loose trees that were not read from a package
    pub fn from_parts(main: XmlDocument, styles: Option<XmlDocument>, numbering: Option<XmlDocument>) -> Self {
        WordDocument {
            main_part_name: "word/document.xml".to_string(),
            main,
            styles: styles.map(|tree| ("word/styles.xml".to_string(), tree)),
            numbering: numbering.map(|tree| ("word/numbering.xml".to_string(), tree)),
            headers: BTreeMap::new(),
            footers: BTreeMap::new(),
            images: ImageStore::Detached(ImageParts::default()),
        }
    }

    /// Parse the parts of an OPC package
    pub fn parse(package: OpcPackage) -> Result<Self, OoxmlError> {
        let main_part_name = package.main_document_part()?;
        let main = package.xml_part(&main_part_name)?;

        let styles = Self::single_related(&package, &main_part_name, &RelationshipType::Styles)?;
        let numbering = Self::single_related(&package, &main_part_name, &RelationshipType::Numbering)?;
        let headers = Self::all_related(&package, &main_part_name, &RelationshipType::Header)?;
        let footers = Self::all_related(&package, &main_part_name, &RelationshipType::Footer)?;

        debug!(
            "parsed {} with {} header(s) and {} footer(s)",
            main_part_name,
            headers.len(),
            footers.len()
        );

        Ok(WordDocument {
            main_part_name,
            main,
            styles,
            numbering,
            headers,
            footers,
            images: ImageStore::Package(package),
        })
    }

    fn single_related(
        package: &OpcPackage,
        source: &str,
        relationship_type: &RelationshipType,
    ) -> Result<Option<(String, XmlDocument)>, OoxmlError> {
        match package.related_parts(source, relationship_type)?.into_iter().next() {
            Some((_, name)) => {
                let tree = package.xml_part(&name)?;
                Ok(Some((name, tree)))
            }
            None => Ok(None),
        }
    }

    fn all_related(
        package: &OpcPackage,
        source: &str,
        relationship_type: &RelationshipType,
    ) -> Result<BTreeMap<String, XmlDocument>, OoxmlError> {
        let mut trees = BTreeMap::new();
        for (_, name) in package.related_parts(source, relationship_type)? {
            let tree = package.xml_part(&name)?;
            trees.insert(name, tree);
        }
        Ok(trees)
    }

    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    pub fn has_footers(&self) -> bool {
        !self.footers.is_empty()
    }

    /// Serialize every tree back into the package and return its bytes.
    ///
    /// Fails with `PartNotFound` for documents built from loose trees.
    pub fn save_changes(&mut self) -> Result<Vec<u8>, OoxmlError> {
        let ImageStore::Package(package) = &mut self.images else {
            return Err(OoxmlError::PartNotFound("document was not opened from a package".to_string()));
        };

        package.set_part_data(&self.main_part_name, self.main.to_bytes()?);
        if let Some((name, tree)) = &self.styles {
            package.set_part_data(name, tree.to_bytes()?);
        }
        if let Some((name, tree)) = &self.numbering {
            package.set_part_data(name, tree.to_bytes()?);
        }
        for (name, tree) in self.headers.iter().chain(self.footers.iter()) {
            package.set_part_data(name, tree.to_bytes()?);
        }
        package.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::tests::{build_package, CONTENT_TYPES, ROOT_RELS};

    const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/></Relationships>"#;

    #[test]
    fn test_parse_package_parts() {
        let data = build_package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS),
            ("word/document.xml", r#"<w:document xmlns:w="urn:w"><w:body/></w:document>"#),
            ("word/styles.xml", r#"<w:styles xmlns:w="urn:w"/>"#),
            ("word/header1.xml", r#"<w:hdr xmlns:w="urn:w"/>"#),
            ("word/footer1.xml", r#"<w:ftr xmlns:w="urn:w"/>"#),
        ]);
        let document = WordDocument::parse(OpcPackage::new(&data).unwrap()).unwrap();

        assert_eq!(document.main_part_name, "word/document.xml");
        assert_eq!(document.styles.as_ref().map(|(name, _)| name.as_str()), Some("word/styles.xml"));
        assert!(document.numbering.is_none());
        assert!(document.headers.contains_key("word/header1.xml"));
        assert!(document.footers.contains_key("word/footer1.xml"));
    }

    #[test]
    fn test_save_changes_requires_package() {
        let main = XmlDocument::parse(r#"<w:document xmlns:w="urn:w"><w:body/></w:document>"#).unwrap();
        let mut document = WordDocument::from_parts(main, None, None);
        assert!(document.save_changes().is_err());
    }
}
