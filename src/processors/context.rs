use crate::numbering::{ListItemInfo, ListItemResolver, NumberingAllocator};
use crate::ooxml::{ImagePartSink, NodeId, OoxmlError, XmlDocument};

/// State shared by every processor during the fill of one part.
///
/// Numbering ids are part-local, so each part (body, header, footer) gets
/// its own context and with it a fresh allocator and resolver cache.
pub struct ProcessContext<'a> {
    part_name: String,
    remove_content_controls: bool,
    numbering: Option<&'a mut XmlDocument>,
    styles: Option<&'a XmlDocument>,
    images: &'a mut dyn ImagePartSink,
    resolver: ListItemResolver,
    allocator: NumberingAllocator,
}

impl<'a> ProcessContext<'a> {
    pub fn new(
        part_name: impl Into<String>,
        numbering: Option<&'a mut XmlDocument>,
        styles: Option<&'a XmlDocument>,
        images: &'a mut dyn ImagePartSink,
        remove_content_controls: bool,
    ) -> Self {
        ProcessContext {
            part_name: part_name.into(),
            remove_content_controls,
            numbering,
            styles,
            images,
            resolver: ListItemResolver::new(),
            allocator: NumberingAllocator::new(),
        }
    }

    /// Replace the allocator, e.g. with a seeded one
    pub fn with_allocator(mut self, allocator: NumberingAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    pub fn remove_content_controls(&self) -> bool {
        self.remove_content_controls
    }

    /// Numbering identity of a paragraph
    pub fn list_item(&mut self, doc: &XmlDocument, paragraph: NodeId) -> ListItemInfo {
        self.resolver
            .resolve(doc, paragraph, self.numbering.as_deref(), self.styles)
    }

    /// Give freshly inserted list copies their own numbering definitions
    pub fn reset_numbering(&mut self, doc: &mut XmlDocument, elements: &[NodeId]) -> usize {
        self.allocator
            .reset_numbering(doc, self.numbering.as_deref_mut(), elements)
    }

    /// Register an image with the package; returns the relationship id
    pub fn add_image(&mut self, data: &[u8]) -> Result<String, OoxmlError> {
        self.images.add_image_part(&self.part_name, data)
    }
}
