use serde::{Deserialize, Serialize};

/// Image content types the package can register as media parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    ImagePng,
    ImageJpeg,
    ImageGif,
    ImageBmp,
    ImageTiff,
}

impl ContentType {
    /// MIME string written into a `Default` entry of [Content_Types].xml
    pub fn as_mime(&self) -> &'static str {
        match self {
            ContentType::ImagePng => "image/png",
            ContentType::ImageJpeg => "image/jpeg",
            ContentType::ImageGif => "image/gif",
            ContentType::ImageBmp => "image/bmp",
            ContentType::ImageTiff => "image/tiff",
        }
    }

    /// Sniff an image format from its leading bytes. Unrecognized data is
    /// stored as PNG, which Word tolerates for most raster payloads.
    pub fn sniff_image(data: &[u8]) -> Self {
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            ContentType::ImagePng
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ContentType::ImageJpeg
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            ContentType::ImageGif
        } else if data.starts_with(b"BM") {
            ContentType::ImageBmp
        } else if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            ContentType::ImageTiff
        } else {
            ContentType::ImagePng
        }
    }

    /// File extension used for media parts of this type
    pub fn extension(&self) -> &'static str {
        match self {
            ContentType::ImagePng => "png",
            ContentType::ImageJpeg => "jpeg",
            ContentType::ImageGif => "gif",
            ContentType::ImageBmp => "bmp",
            ContentType::ImageTiff => "tiff",
        }
    }
}

/// Relationship type constants (ECMA-376)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// Office document relationship
    OfficeDocument,
    /// Styles relationship
    Styles,
    /// Numbering relationship
    Numbering,
    /// Header relationship
    Header,
    /// Footer relationship
    Footer,
    /// Image relationship
    Image,
    /// Unknown relationship type
    Unknown(String),
}

impl RelationshipType {
    pub const IMAGE_URI: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

    /// Parse relationship type string into enum
    pub fn from_string(s: &str) -> Self {
        match s {
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" => RelationshipType::OfficeDocument,
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" => RelationshipType::Styles,
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" => RelationshipType::Numbering,
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" => RelationshipType::Header,
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" => RelationshipType::Footer,
            // Image relationships
            rel if rel.contains("relationships/image") => RelationshipType::Image,
            _ => RelationshipType::Unknown(s.to_string()),
        }
    }
}

/// Represents a relationship between parts in the package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Type of relationship
    pub relationship_type: RelationshipType,
    /// Target URI, relative to the source part's folder
    pub target: String,
    /// Target mode (Internal or External)
    pub target_mode: Option<String>,
}

/// A part in the OPC package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagePart {
    /// Part name without leading slash (e.g., "word/document.xml")
    pub name: String,
    /// Raw binary data of the part
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_type_parsing() {
        let rt = RelationshipType::from_string("http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer");
        assert_eq!(rt, RelationshipType::Footer);

        let rt = RelationshipType::from_string(RelationshipType::IMAGE_URI);
        assert_eq!(rt, RelationshipType::Image);
    }

    #[test]
    fn test_sniff_image() {
        assert_eq!(ContentType::sniff_image(b"\x89PNG\r\n\x1a\nrest"), ContentType::ImagePng);
        assert_eq!(ContentType::sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0]), ContentType::ImageJpeg);
        assert_eq!(ContentType::sniff_image(b"GIF89a..."), ContentType::ImageGif);
        assert_eq!(ContentType::sniff_image(b"???"), ContentType::ImagePng);
        assert_eq!(ContentType::ImageJpeg.extension(), "jpeg");
        assert_eq!(ContentType::ImageGif.as_mime(), "image/gif");
    }
}
