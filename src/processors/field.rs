use super::{finish_control, ProcessContext, Processor};
use crate::content::{ContentItem, FieldContent};
use crate::control;
use crate::ooxml::{NodeId, XmlDocument};
use crate::result::{FillError, ProcessResult};

/// Writes field values as control text
pub struct FieldProcessor;

impl FieldProcessor {
    /// Fill one field into one control, unwrapping it in removal mode
    pub(crate) fn fill_control(
        doc: &mut XmlDocument,
        ctx: &ProcessContext<'_>,
        control: NodeId,
        item: &ContentItem,
        field: &FieldContent,
    ) -> ProcessResult {
        let mut result = ProcessResult::not_handled();
        control::replace_value(doc, control, field.value());
        result.add_item_to_handled(item);
        finish_control(doc, ctx, Some(control), &result);
        result
    }
}

impl Processor for FieldProcessor {
    fn fill_content(
        &self,
        doc: &mut XmlDocument,
        ctx: &mut ProcessContext<'_>,
        control: Option<NodeId>,
        items: &[&ContentItem],
    ) -> ProcessResult {
        let mut result = ProcessResult::not_handled();

        for &item in items {
            let ContentItem::Field(field) = item else {
                continue;
            };
            match control {
                Some(control) => {
                    control::replace_value(doc, control, field.value());
                    result.add_item_to_handled(item);
                }
                None => result.add_error(FillError::not_found(item)),
            }
        }

        finish_control(doc, ctx, control, &result);
        result
    }
}
