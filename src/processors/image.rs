use log::debug;

use super::{finish_control, ProcessContext, Processor};
use crate::content::{ContentItem, ImageContent};
use crate::ooxml::names::{a, r};
use crate::ooxml::{NodeId, XmlDocument};
use crate::result::{FillError, ProcessResult};

/// Points the picture inside a control at a newly added image part
pub struct ImageProcessor;

impl Processor for ImageProcessor {
    fn fill_content(
        &self,
        doc: &mut XmlDocument,
        ctx: &mut ProcessContext<'_>,
        control: Option<NodeId>,
        items: &[&ContentItem],
    ) -> ProcessResult {
        let mut result = ProcessResult::not_handled();

        for &item in items {
            let ContentItem::Image(image) = item else {
                continue;
            };
            match control {
                Some(control) => result.merge(fill_image(doc, ctx, control, item, image)),
                None => result.add_error(FillError::not_found(item)),
            }
        }

        finish_control(doc, ctx, control, &result);
        result
    }
}

fn fill_image(
    doc: &mut XmlDocument,
    ctx: &mut ProcessContext<'_>,
    control: NodeId,
    item: &ContentItem,
    image: &ImageContent,
) -> ProcessResult {
    let mut result = ProcessResult::not_handled();

    let Some(blip) = doc.descendants_named(control, a::BLIP).into_iter().next() else {
        result.add_error(FillError::custom_item(item, "doesn't contain an image for replace"));
        return result;
    };

    match ctx.add_image(image.binary()) {
        Ok(relationship_id) => {
            debug!("image '{}' embedded as {}", image.name(), relationship_id);
            doc.set_attribute(blip, r::EMBED, relationship_id);
            result.add_item_to_handled(item);
        }
        Err(e) => {
            result.add_error(FillError::custom_item(item, format!("image part could not be added: {}", e)));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Content;
    use crate::ooxml::names::w;
    use crate::processors::tests::{document, sdt, Fixture};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn picture() -> String {
        r#"<w:p><w:r><w:drawing><a:graphic><a:graphicData><a:blip r:embed="rId5"/></a:graphicData></a:graphic></w:drawing></w:r></w:p>"#.to_string()
    }

    #[test]
    fn test_blip_points_to_new_part() {
        let mut fixture = Fixture::new(&document(&sdt("Logo", &picture())));
        let result = fixture.fill(&Content::new(vec![ImageContent::new("Logo", PNG.to_vec()).into()]), false);

        assert!(result.is_handled("Logo"));
        assert_eq!(fixture.images.len(), 1);
        let blip = fixture.doc.descendants_named(fixture.body(), a::BLIP)[0];
        let embed = fixture.doc.attribute(blip, r::EMBED).unwrap();
        assert_ne!(embed, "rId5");
        assert!(fixture.images.iter().any(|(id, _)| id == embed));
    }

    #[test]
    fn test_control_without_picture() {
        let mut fixture = Fixture::new(&document(&sdt("Logo", "<w:p/>")));
        let result = fixture.fill(&Content::new(vec![ImageContent::new("Logo", PNG.to_vec()).into()]), true);
        assert_eq!(
            result.errors()[0].to_string(),
            "Image Content Control 'Logo' doesn't contain an image for replace."
        );
        assert_eq!(fixture.doc.descendants_named(fixture.body(), w::SDT).len(), 1);
        assert!(fixture.images.is_empty());
    }

    #[test]
    fn test_missing_image_control() {
        let mut fixture = Fixture::new(&document("<w:p/>"));
        let result = fixture.fill(&Content::new(vec![ImageContent::new("Logo", PNG.to_vec()).into()]), false);
        assert_eq!(result.errors()[0].to_string(), "Image Content Control 'Logo' not found.");
    }
}
