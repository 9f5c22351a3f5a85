use log::{debug, warn};

use super::{clone_into_wrapper, finish_control, take_children, template_range, ContentProcessor, ProcessContext, Processor};
use crate::content::{ContentItem, ListContent, ListItemContent};
use crate::control;
use crate::ooxml::names::w;
use crate::ooxml::{NodeId, XmlDocument};
use crate::result::{FillError, ProcessResult};

/// Repeats the template paragraphs of a list control once per item, with
/// nested items rendered from the deeper template levels
pub struct ListProcessor;

impl Processor for ListProcessor {
    fn fill_content(
        &self,
        doc: &mut XmlDocument,
        ctx: &mut ProcessContext<'_>,
        control: Option<NodeId>,
        items: &[&ContentItem],
    ) -> ProcessResult {
        let mut result = ProcessResult::not_handled();

        for &item in items {
            let ContentItem::List(list) = item else {
                continue;
            };
            match control {
                Some(control) => result.merge(fill_list(doc, ctx, control, item, list)),
                None => result.add_error(FillError::not_found(item)),
            }
        }

        finish_control(doc, ctx, control, &result);
        result
    }
}

fn fill_list(
    doc: &mut XmlDocument,
    ctx: &mut ProcessContext<'_>,
    control: NodeId,
    item: &ContentItem,
    list: &ListContent,
) -> ProcessResult {
    let mut result = ProcessResult::not_handled();

    let elements: Vec<NodeId> = match control::control_content(doc, control) {
        Some(content) => doc.elements(content).collect(),
        None => Vec::new(),
    };
    let Some((first, last)) = template_range(doc, &elements, &list.field_names()) else {
        warn!("list '{}' has no template item", list.name());
        result.add_error(FillError::custom_item(item, "doesn't contain items with content"));
        return result;
    };
    let template = &elements[first..=last];

    if !list.items().is_empty() {
        let (current, nested) = split_levels(doc, ctx, template);
        let generated = fill_items(doc, ctx, item, list.items(), &current, &nested, &mut result);
        doc.insert_all_after(template[template.len() - 1], &generated);
        debug!("list '{}': {} element(s) generated", list.name(), generated.len());
    }
    for &element in template {
        doc.detach(element);
    }

    result.add_item_to_handled(item);
    result
}

/// Split a template into the shallowest level and everything deeper.
///
/// The shallowest level runs up to the first element indented deeper than
/// the minimum level; the rest is the template for nested items.
fn split_levels(doc: &XmlDocument, ctx: &mut ProcessContext<'_>, template: &[NodeId]) -> (Vec<NodeId>, Vec<NodeId>) {
    let levels: Vec<Option<i32>> = template
        .iter()
        .map(|&element| {
            doc.descendants_and_self_named(element, w::P)
                .first()
                .map(|&paragraph| ctx.list_item(doc, paragraph).level.unwrap_or(0))
        })
        .collect();

    let Some(min_level) = levels.iter().flatten().min().copied() else {
        return (template.to_vec(), Vec::new());
    };
    let split = levels
        .iter()
        .position(|level| level.map_or(false, |level| level > min_level))
        .unwrap_or(template.len());

    (template[..split].to_vec(), template[split..].to_vec())
}

/// Render `items` from the `current` template, nested items from `nested`.
/// Returns the new elements in document order.
fn fill_items(
    doc: &mut XmlDocument,
    ctx: &mut ProcessContext<'_>,
    list_item: &ContentItem,
    items: &[ListItemContent],
    current: &[NodeId],
    nested: &[NodeId],
    result: &mut ProcessResult,
) -> Vec<NodeId> {
    let mut generated = Vec::new();
    let mut same_level = Vec::new();

    for item in items {
        let wrapper = clone_into_wrapper(doc, w::SDT_CONTENT, current);
        result.merge(ContentProcessor::fill_content(doc, ctx, wrapper, &item.content().all()));
        let filled = take_children(doc, wrapper);
        same_level.extend(filled.iter().copied());
        generated.extend(filled);

        if item.nested_items().is_empty() {
            continue;
        }
        if nested.is_empty() {
            result.add_error(FillError::custom_item(list_item, "doesn't contain a template for nested items"));
            continue;
        }
        let (nested_current, nested_deeper) = split_levels(doc, ctx, nested);
        generated.extend(fill_items(
            doc,
            ctx,
            list_item,
            item.nested_items(),
            &nested_current,
            &nested_deeper,
            result,
        ));
    }

    ctx.reset_numbering(doc, &same_level);
    generated
}
