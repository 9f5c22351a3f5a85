//! OPC (Open Packaging Conventions) Package
//! Reads a ZIP-based Office Open XML document, resolves part relationships,
//! registers new image parts and writes the package back.

use std::io::{Cursor, Read, Seek, Write};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::error::OoxmlError;
use super::types::{ContentType, PackagePart, Relationship, RelationshipType};
use super::xml::XmlDocument;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const RELATIONSHIPS_NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const MEDIA_FOLDER: &str = "word/media";

static RELATIONSHIP_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^rId(\d+)$").expect("valid regex"));
static MEDIA_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^word/media/image(\d+)\.[A-Za-z]+$").expect("valid regex"));

/// Source of new image parts for the fill engine.
///
/// The engine only ever asks for one thing: store these bytes as an image
/// related to `owner_part` and hand back the relationship id to embed.
pub trait ImagePartSink {
    fn add_image_part(&mut self, owner_part: &str, data: &[u8]) -> Result<String, OoxmlError>;
}

/// OPC package held in memory, entries kept in archive order
#[derive(Debug, Clone, Default)]
pub struct OpcPackage {
    parts: Vec<PackagePart>,
}

impl OpcPackage {
    /// Create a new OpcPackage from ZIP file data
    pub fn new(file_data: &[u8]) -> Result<Self, OoxmlError> {
        let reader = Cursor::new(file_data);
        let mut archive = ZipArchive::new(reader)?;

        let mut package = OpcPackage { parts: Vec::new() };
        package.extract_parts(&mut archive)?;

        if package.get_part(CONTENT_TYPES_PART).is_none() {
            return Err(OoxmlError::PartNotFound(CONTENT_TYPES_PART.to_string()));
        }
        debug!("opened package with {} parts", package.parts.len());
        Ok(package)
    }

    /// Extract all parts from the archive
    fn extract_parts<R: Read + Seek>(&mut self, archive: &mut ZipArchive<R>) -> Result<(), OoxmlError> {
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            self.parts.push(PackagePart { name, data });
        }
        Ok(())
    }

    /// Get a part by name (leading slash optional)
    pub fn get_part(&self, name: &str) -> Option<&PackagePart> {
        let name = name.trim_start_matches('/');
        self.parts.iter().find(|part| part.name == name)
    }

    /// Replace the bytes of a part, appending the part when it is new
    pub fn set_part_data(&mut self, name: &str, data: Vec<u8>) {
        let name = name.trim_start_matches('/');
        match self.parts.iter_mut().find(|part| part.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(PackagePart {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Parse a part as XML
    pub fn xml_part(&self, name: &str) -> Result<XmlDocument, OoxmlError> {
        let part = self
            .get_part(name)
            .ok_or_else(|| OoxmlError::PartNotFound(name.to_string()))?;
        XmlDocument::from_bytes(&part.data)
    }

    /// Name of the relationships part that belongs to `source` (`""` for the package root)
    pub fn relationships_part_name(source: &str) -> String {
        let source = source.trim_start_matches('/');
        match source.rsplit_once('/') {
            Some((folder, file)) => format!("{}/_rels/{}.rels", folder, file),
            None if source.is_empty() => "_rels/.rels".to_string(),
            None => format!("_rels/{}.rels", source),
        }
    }

    /// Get relationships for a source part. A part without a relationships
    /// part simply has none.
    pub fn relationships(&self, source: &str) -> Result<Vec<Relationship>, OoxmlError> {
        let rels_name = Self::relationships_part_name(source);
        if self.get_part(&rels_name).is_none() {
            return Ok(Vec::new());
        }
        let rels = self.xml_part(&rels_name)?;
        let root = rels.root();
        Ok(rels
            .children_named(root, "Relationship")
            .map(|node| Relationship {
                id: rels.attribute(node, "Id").unwrap_or_default().to_string(),
                relationship_type: RelationshipType::from_string(rels.attribute(node, "Type").unwrap_or_default()),
                target: rels.attribute(node, "Target").unwrap_or_default().to_string(),
                target_mode: rels.attribute(node, "TargetMode").map(str::to_string),
            })
            .collect())
    }

    /// Resolve a relationship target against the folder of its source part
    pub fn resolve_target(source: &str, target: &str) -> String {
        if let Some(absolute) = target.strip_prefix('/') {
            return absolute.to_string();
        }
        let mut segments: Vec<&str> = source
            .trim_start_matches('/')
            .rsplit_once('/')
            .map(|(folder, _)| folder.split('/').collect())
            .unwrap_or_default();
        for segment in target.split('/') {
            match segment {
                "." | "" => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        segments.join("/")
    }

    /// Name of the main document part, following the root officeDocument relationship
    pub fn main_document_part(&self) -> Result<String, OoxmlError> {
        let root_relationships = self.relationships("")?;
        root_relationships
            .iter()
            .find(|rel| rel.relationship_type == RelationshipType::OfficeDocument)
            .map(|rel| Self::resolve_target("", &rel.target))
            .ok_or_else(|| OoxmlError::PartNotFound("officeDocument relationship".to_string()))
    }

    /// Internal parts related to `source` with the given type, as (relationship id, part name)
    pub fn related_parts(
        &self,
        source: &str,
        relationship_type: &RelationshipType,
    ) -> Result<Vec<(String, String)>, OoxmlError> {
        Ok(self
            .relationships(source)?
            .into_iter()
            .filter(|rel| &rel.relationship_type == relationship_type)
            .filter(|rel| rel.target_mode.as_deref() != Some("External"))
            .map(|rel| (rel.id, Self::resolve_target(source, &rel.target)))
            .collect())
    }

    /// Register a new media part and relate it to `owner_part`.
    ///
    /// Returns the relationship id to reference from `r:embed`.
    pub fn add_image_part(&mut self, owner_part: &str, data: &[u8]) -> Result<String, OoxmlError> {
        let content_type = ContentType::sniff_image(data);
        let extension = content_type.extension();

        let next_index = self
            .parts
            .iter()
            .filter_map(|part| MEDIA_PART.captures(&part.name))
            .filter_map(|caps| caps[1].parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let media_name = format!("{}/image{}.{}", MEDIA_FOLDER, next_index, extension);
        self.set_part_data(&media_name, data.to_vec());
        self.ensure_default_content_type(extension, &content_type)?;

        let owner_folder = owner_part
            .trim_start_matches('/')
            .rsplit_once('/')
            .map(|(folder, _)| folder)
            .unwrap_or("");
        let target = if owner_folder == "word" {
            format!("media/image{}.{}", next_index, extension)
        } else {
            format!("/{}", media_name)
        };
        let id = self.add_relationship(owner_part, RelationshipType::IMAGE_URI, &target)?;
        debug!("registered image part {} as {} for {}", media_name, id, owner_part);
        Ok(id)
    }

    fn ensure_default_content_type(&mut self, extension: &str, content_type: &ContentType) -> Result<(), OoxmlError> {
        let mut types = self.xml_part(CONTENT_TYPES_PART)?;
        let root = types.root();
        let exists = types.children_named(root, "Default").any(|node| {
            types
                .attribute(node, "Extension")
                .map(|ext| ext.eq_ignore_ascii_case(extension))
                .unwrap_or(false)
        });
        if exists {
            return Ok(());
        }
        let default = types.create_element_with(
            "Default",
            &[("Extension", extension), ("ContentType", content_type.as_mime())],
        );
        types.insert_child(root, 0, default);
        self.set_part_data(CONTENT_TYPES_PART, types.to_bytes()?);
        Ok(())
    }

    fn add_relationship(&mut self, source: &str, type_uri: &str, target: &str) -> Result<String, OoxmlError> {
        let rels_name = Self::relationships_part_name(source);
        let mut rels = match self.get_part(&rels_name) {
            Some(part) => XmlDocument::from_bytes(&part.data)?,
            None => {
                let mut fresh = XmlDocument::new("Relationships");
                let root = fresh.root();
                fresh.set_attribute(root, "xmlns", RELATIONSHIPS_NAMESPACE);
                fresh
            }
        };
        let root = rels.root();
        let next = rels
            .children_named(root, "Relationship")
            .filter_map(|node| rels.attribute(node, "Id"))
            .filter_map(|id| RELATIONSHIP_ID.captures(id))
            .filter_map(|caps| caps[1].parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{}", next);
        let relationship = rels.create_element_with(
            "Relationship",
            &[("Id", id.as_str()), ("Type", type_uri), ("Target", target)],
        );
        rels.append_child(root, relationship);
        self.set_part_data(&rels_name, rels.to_bytes()?);
        Ok(id)
    }

    /// Write the package as ZIP bytes, preserving entry order
    pub fn to_bytes(&self) -> Result<Vec<u8>, OoxmlError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for part in &self.parts {
            writer.start_file(part.name.as_str(), options)?;
            writer.write_all(&part.data)?;
        }
        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }

    /// All parts in archive order
    pub fn parts(&self) -> &[PackagePart] {
        &self.parts
    }
}

impl ImagePartSink for OpcPackage {
    fn add_image_part(&mut self, owner_part: &str, data: &[u8]) -> Result<String, OoxmlError> {
        OpcPackage::add_image_part(self, owner_part, data)
    }
}

/// Image parts registered while filling loose XML trees that do not come
/// from a package
#[derive(Debug, Clone, Default)]
pub struct ImageParts {
    images: Vec<(String, PackagePart)>,
}

impl ImageParts {
    /// (relationship id, part) pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PackagePart)> {
        self.images.iter().map(|(id, part)| (id.as_str(), part))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImagePartSink for ImageParts {
    fn add_image_part(&mut self, _owner_part: &str, data: &[u8]) -> Result<String, OoxmlError> {
        let index = self.images.len() + 1;
        let extension = ContentType::sniff_image(data).extension();
        let id = format!("rIdImage{}", index);
        self.images.push((
            id.clone(),
            PackagePart {
                name: format!("{}/image{}.{}", MEDIA_FOLDER, index, extension),
                data: data.to_vec(),
            },
        ));
        Ok(id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn build_package(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    pub(crate) const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

    pub(crate) const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

    #[test]
    fn test_relationships_part_name() {
        assert_eq!(OpcPackage::relationships_part_name(""), "_rels/.rels");
        assert_eq!(
            OpcPackage::relationships_part_name("/word/document.xml"),
            "word/_rels/document.xml.rels"
        );
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(OpcPackage::resolve_target("", "word/document.xml"), "word/document.xml");
        assert_eq!(OpcPackage::resolve_target("word/document.xml", "header1.xml"), "word/header1.xml");
        assert_eq!(OpcPackage::resolve_target("word/document.xml", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(OpcPackage::resolve_target("word/document.xml", "/word/media/a.png"), "word/media/a.png");
    }

    #[test]
    fn test_main_document_part() {
        let data = build_package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("word/document.xml", "<w:document/>"),
        ]);
        let package = OpcPackage::new(&data).unwrap();
        assert_eq!(package.main_document_part().unwrap(), "word/document.xml");
        assert!(package.relationships("word/document.xml").unwrap().is_empty());
    }

    #[test]
    fn test_missing_content_types_is_rejected() {
        let data = build_package(&[("word/document.xml", "<w:document/>")]);
        assert!(matches!(OpcPackage::new(&data), Err(OoxmlError::PartNotFound(_))));
    }

    #[test]
    fn test_add_image_part() {
        let data = build_package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("word/document.xml", "<w:document/>"),
        ]);
        let mut package = OpcPackage::new(&data).unwrap();

        let first = package.add_image_part("word/document.xml", b"\x89PNG\r\n\x1a\n1").unwrap();
        let second = package.add_image_part("word/document.xml", b"\x89PNG\r\n\x1a\n2").unwrap();
        assert_eq!(first, "rId1");
        assert_eq!(second, "rId2");
        assert!(package.get_part("word/media/image2.png").is_some());

        let rels = package.relationships("word/document.xml").unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].relationship_type, RelationshipType::Image);
        assert_eq!(rels[1].target, "media/image2.png");

        let types = package.xml_part("[Content_Types].xml").unwrap();
        let png_defaults = types
            .children_named(types.root(), "Default")
            .filter(|&n| types.attribute(n, "Extension") == Some("png"))
            .count();
        assert_eq!(png_defaults, 1);

        let reopened = OpcPackage::new(&package.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.parts().len(), package.parts().len());
    }

    #[test]
    fn test_image_parts_in_memory() {
        let mut images = ImageParts::default();
        let id = images.add_image_part("word/document.xml", &[0xFF, 0xD8, 0xFF]).unwrap();
        assert_eq!(id, "rIdImage1");
        let (_, part) = images.iter().next().unwrap();
        assert_eq!(part.name, "word/media/image1.jpeg");
    }
}
