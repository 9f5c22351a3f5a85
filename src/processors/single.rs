use super::{finish_control, ContentProcessor, ProcessContext, Processor};
use crate::content::{ContentItem, SingleContent};
use crate::control;
use crate::ooxml::names::w;
use crate::ooxml::{NodeId, XmlDocument};
use crate::result::{FillError, ProcessResult};

/// Keeps one alternative child control and drops its siblings
pub struct SingleProcessor;

impl Processor for SingleProcessor {
    fn fill_content(
        &self,
        doc: &mut XmlDocument,
        ctx: &mut ProcessContext<'_>,
        control: Option<NodeId>,
        items: &[&ContentItem],
    ) -> ProcessResult {
        let mut result = ProcessResult::not_handled();

        for &item in items {
            let ContentItem::Single(single) = item else {
                continue;
            };
            match control {
                Some(control) => result.merge(fill_single(doc, ctx, control, item, single)),
                None => result.add_error(FillError::not_found(item)),
            }
        }

        finish_control(doc, ctx, control, &result);
        result
    }
}

fn fill_single(
    doc: &mut XmlDocument,
    ctx: &mut ProcessContext<'_>,
    control: NodeId,
    item: &ContentItem,
    single: &SingleContent,
) -> ProcessResult {
    let mut result = ProcessResult::not_handled();

    let child = control::control_content(doc, control).and_then(|content| {
        control::top_level_controls(doc, content)
            .into_iter()
            .find(|&sdt| control::tag_of(doc, sdt) == Some(single.child_name()))
    });
    let Some(child) = child else {
        result.add_error(FillError::custom_item(
            item,
            format!("doesn't contain child content control '{}'", single.child_name()),
        ));
        return result;
    };

    let siblings = doc
        .elements_before(child)
        .into_iter()
        .chain(doc.elements_after(child))
        .filter(|&sibling| doc.is(sibling, w::SDT) || doc.is(sibling, w::R))
        .collect::<Vec<_>>();
    for sibling in siblings {
        doc.detach(sibling);
    }
    result.add_item_to_handled(item);

    if let Some(child_content) = control::control_content(doc, child) {
        result.merge(ContentProcessor::fill_content(doc, ctx, child_content, &single.fields().all()));
    }

    if ctx.remove_content_controls() {
        control::remove_control(doc, child);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Content, FieldContent};
    use crate::processors::tests::{document, field_paragraph, sdt, Fixture};

    fn greeting() -> String {
        let alternatives = format!(
            "{}{}{}",
            sdt("A", &field_paragraph("Name", "a")),
            sdt("B", &field_paragraph("Name", "b")),
            sdt("C", &field_paragraph("Name", "c"))
        );
        document(&sdt("Greeting", &alternatives))
    }

    #[test]
    fn test_keeps_only_requested_child() {
        let mut fixture = Fixture::new(&greeting());
        let single = SingleContent::new("Greeting", "B", vec![FieldContent::new("Name", "Ann").into()]);
        let result = fixture.fill(&Content::new(vec![single.into()]), false);

        assert!(result.success(), "{:?}", result.errors());
        assert_eq!(fixture.texts(), vec!["Ann"]);
        let tags: Vec<String> = control::top_level_controls(&fixture.doc, fixture.body())
            .into_iter()
            .flat_map(|sdt| fixture.doc.descendants_and_self_named(sdt, w::SDT))
            .filter_map(|sdt| control::tag_of(&fixture.doc, sdt).map(str::to_string))
            .collect();
        assert_eq!(tags, vec!["Greeting", "B", "Name"]);
    }

    #[test]
    fn test_removal_mode_unwraps_outer_and_child() {
        let mut fixture = Fixture::new(&greeting());
        let single = SingleContent::new("Greeting", "C", vec![FieldContent::new("Name", "Ann").into()]);
        fixture.fill(&Content::new(vec![single.into()]), true);
        assert!(fixture.doc.descendants_named(fixture.body(), w::SDT).is_empty());
        assert_eq!(fixture.texts(), vec!["Ann"]);
    }

    #[test]
    fn test_missing_child() {
        let mut fixture = Fixture::new(&greeting());
        let single = SingleContent::new("Greeting", "D", vec![]);
        let result = fixture.fill(&Content::new(vec![single.into()]), false);
        assert_eq!(
            result.errors()[0].to_string(),
            "Single Content Control 'Greeting' doesn't contain child content control 'D'."
        );
        assert_eq!(fixture.texts().len(), 3);
    }
}
