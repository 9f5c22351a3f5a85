use std::collections::HashSet;

use log::{debug, trace};

use super::{
    FieldProcessor, ImageProcessor, ListProcessor, ProcessContext, Processor, SingleProcessor, TableProcessor,
};
use crate::content::{Container, ContentItem, ContentKind};
use crate::control;
use crate::ooxml::{NodeId, XmlDocument};
use crate::result::ProcessResult;

/// Dispatch order. Fields go first so a value never lands in a structure
/// that a later processor duplicates.
const PROCESSORS: [&dyn Processor; 5] = [
    &FieldProcessor,
    &TableProcessor,
    &ListProcessor,
    &ImageProcessor,
    &SingleProcessor,
];

/// Matches content items to the controls of one scope
pub struct ContentProcessor;

impl ContentProcessor {
    /// Fill `items` into the controls found under `scope`.
    ///
    /// Items are grouped by name; a name is processed once per top-level
    /// control carrying it, or once against no control so a missing control
    /// is reported.
    pub fn fill_content(
        doc: &mut XmlDocument,
        ctx: &mut ProcessContext<'_>,
        scope: NodeId,
        items: &[&ContentItem],
    ) -> ProcessResult {
        let mut result = ProcessResult::not_handled();
        // Names handled at this scope. Nested row and item fills are other
        // scopes and never hide a control here.
        let mut handled_here: HashSet<&str> = HashSet::new();

        for (name, group) in group_by_name(items) {
            if handled_here.contains(name) {
                continue;
            }

            let mut controls: Vec<Option<NodeId>> = control::find_top_level_controls(doc, scope, name)
                .into_iter()
                .map(Some)
                .collect();
            if controls.is_empty() {
                controls.push(None);
            }
            debug!("'{}': {} item(s), {} control(s)", name, group.len(), controls.len());

            let row_fields: Vec<String> = group
                .iter()
                .filter_map(|item| match item {
                    ContentItem::Table(table) => Some(table.field_names()),
                    _ => None,
                })
                .flatten()
                .collect();
            let has_table = group.iter().any(|item| item.kind() == ContentKind::Table);
            for control in controls {
                if let Some(table_control) = control.filter(|_| has_table) {
                    let table_fields = Self::fill_table_fields(doc, ctx, table_control, items, &row_fields);
                    for item in table_fields.handled() {
                        if let Some(&own) = items.iter().find(|own| own.name() == item.name) {
                            handled_here.insert(own.name());
                        }
                    }
                    result.merge(table_fields);
                }
                for processor in PROCESSORS {
                    let processed = processor.fill_content(doc, ctx, control, &group);
                    if processed.is_handled(name) {
                        handled_here.insert(name);
                    }
                    result.merge(processed);
                }
            }
        }

        result
    }

    /// Fill every root container item under `scope`
    pub fn fill_container(
        doc: &mut XmlDocument,
        ctx: &mut ProcessContext<'_>,
        scope: NodeId,
        content: &Container,
    ) -> ProcessResult {
        Self::fill_content(doc, ctx, scope, &content.all())
    }

    /// Fields declared once around a table (captions, totals) rather than
    /// per row. They are filled into the table's static structure before
    /// its rows are duplicated. Names used inside the rows are left to the
    /// row fill.
    fn fill_table_fields(
        doc: &mut XmlDocument,
        ctx: &mut ProcessContext<'_>,
        table_control: NodeId,
        items: &[&ContentItem],
        row_fields: &[String],
    ) -> ProcessResult {
        let mut result = ProcessResult::not_handled();
        let Some(content) = control::control_content(doc, table_control) else {
            return result;
        };

        for &item in items {
            let ContentItem::Field(field) = item else {
                continue;
            };
            if row_fields.iter().any(|row_field| row_field == field.name()) {
                continue;
            }
            for inner in control::find_top_level_controls(doc, content, field.name()) {
                trace!("table field '{}' filled outside the rows", field.name());
                result.merge(FieldProcessor::fill_control(doc, ctx, inner, item, field));
            }
        }
        result
    }
}

/// Items grouped by name, groups in order of first appearance
fn group_by_name<'a>(items: &[&'a ContentItem]) -> Vec<(&'a str, Vec<&'a ContentItem>)> {
    let mut groups: Vec<(&'a str, Vec<&'a ContentItem>)> = Vec::new();
    for &item in items {
        match groups.iter_mut().find(|(name, _)| *name == item.name()) {
            Some((_, group)) => group.push(item),
            None => groups.push((item.name(), vec![item])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Content, FieldContent, TableContent};
    use crate::processors::tests::{document, field_paragraph, sdt, Fixture};
    use crate::result::FillError;

    #[test]
    fn test_group_by_name_keeps_first_appearance() {
        let a: ContentItem = FieldContent::new("A", "1").into();
        let b: ContentItem = FieldContent::new("B", "2").into();
        let a2: ContentItem = TableContent::new("A").into();
        let groups = group_by_name(&[&a, &b, &a2]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "A");
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn test_fills_every_top_level_control_with_the_name() {
        let mut fixture = Fixture::new(&document(&format!(
            "{}{}",
            field_paragraph("Name", "x"),
            field_paragraph("Name", "y")
        )));
        let result = fixture.fill(&Content::new(vec![FieldContent::new("Name", "Ann").into()]), false);
        assert!(result.success());
        assert_eq!(fixture.texts(), vec!["Ann", "Ann"]);
    }

    #[test]
    fn test_missing_control_is_reported() {
        let mut fixture = Fixture::new(&document(&field_paragraph("Name", "x")));
        let result = fixture.fill(
            &Content::new(vec![
                FieldContent::new("Name", "Ann").into(),
                FieldContent::new("WrongFieldName", "?").into(),
            ]),
            false,
        );
        assert_eq!(result.errors().len(), 1);
        assert_eq!(
            result.errors()[0],
            FillError::ControlNotFound {
                kind: ContentKind::Field,
                name: "WrongFieldName".to_string()
            }
        );
        assert_eq!(fixture.texts(), vec!["Ann"]);
    }

    #[test]
    fn test_nested_controls_are_not_filled_from_outside() {
        let mut fixture = Fixture::new(&document(&sdt("Outer", &field_paragraph("Name", "x"))));
        let result = fixture.fill(&Content::new(vec![FieldContent::new("Name", "Ann").into()]), false);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(fixture.texts(), vec!["x"]);
    }

    #[test]
    fn test_table_fields_outside_rows() {
        let table = format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc></w:tr><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>",
            field_paragraph("Caption", "c"),
            field_paragraph("Name", "n")
        );
        let mut fixture = Fixture::new(&document(&sdt("Team", &table)));
        let result = fixture.fill(
            &Content::new(vec![
                FieldContent::new("Caption", "Our team").into(),
                TableContent::new("Team")
                    .add_row(vec![FieldContent::new("Name", "Eric").into()])
                    .add_row(vec![FieldContent::new("Name", "Bob").into()])
                    .into(),
            ]),
            false,
        );
        assert!(result.success(), "{:?}", result.errors());
        assert!(result.is_handled("Caption"));
        assert_eq!(fixture.texts(), vec!["Our team", "Eric", "Bob"]);
    }

    #[test]
    fn test_top_level_field_named_like_row_field() {
        let table = format!("<w:tbl><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>", field_paragraph("Date", "d"));
        let mut fixture = Fixture::new(&document(&format!("{}{}", field_paragraph("Date", "top"), sdt("Team", &table))));
        let result = fixture.fill(
            &Content::new(vec![
                FieldContent::new("Date", "2024-01-01").into(),
                TableContent::new("Team")
                    .add_row(vec![FieldContent::new("Date", "row").into()])
                    .into(),
            ]),
            false,
        );
        assert!(result.success(), "{:?}", result.errors());
        assert_eq!(fixture.texts(), vec!["2024-01-01", "row"]);
    }

    #[test]
    fn test_empty_content_changes_nothing() {
        let xml = document(&field_paragraph("Name", "x"));
        let mut fixture = Fixture::new(&xml);
        let result = fixture.fill(&Content::default(), true);
        assert!(result.success());
        assert!(!result.has_handled());
        assert_eq!(fixture.doc.to_xml_string().unwrap(), XmlDocument::parse(&xml).unwrap().to_xml_string().unwrap());
    }
}
