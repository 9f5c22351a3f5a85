use log::{debug, warn};

use super::{clone_into_wrapper, finish_control, take_children, template_range, ContentProcessor, ProcessContext, Processor};
use crate::content::{ContentItem, TableContent};
use crate::control;
use crate::ooxml::names::w;
use crate::ooxml::{NodeId, XmlDocument};
use crate::result::{FillError, ProcessResult};

/// Repeats the template rows of a table control once per data row
pub struct TableProcessor;

impl Processor for TableProcessor {
    fn fill_content(
        &self,
        doc: &mut XmlDocument,
        ctx: &mut ProcessContext<'_>,
        control: Option<NodeId>,
        items: &[&ContentItem],
    ) -> ProcessResult {
        let mut result = ProcessResult::not_handled();

        for &item in items {
            let ContentItem::Table(table) = item else {
                continue;
            };
            match control {
                Some(control) => result.merge(fill_table(doc, ctx, control, item, table)),
                None => result.add_error(FillError::not_found(item)),
            }
        }

        finish_control(doc, ctx, control, &result);
        result
    }
}

fn fill_table(
    doc: &mut XmlDocument,
    ctx: &mut ProcessContext<'_>,
    control: NodeId,
    item: &ContentItem,
    table: &TableContent,
) -> ProcessResult {
    let mut result = ProcessResult::not_handled();

    let rows = match control::control_content(doc, control) {
        Some(content) => doc.first_level_descendants_and_self(content, w::TR),
        None => Vec::new(),
    };
    let Some((first, last)) = template_range(doc, &rows, &table.field_names()) else {
        warn!("table '{}' has no template row", table.name());
        result.add_error(FillError::custom_item(item, "doesn't contain rows with cell content"));
        return result;
    };
    let template = rows[first..=last].to_vec();

    if table.rows().is_empty() {
        if ctx.remove_content_controls() {
            doc.detach(control);
        } else {
            for &row in &template {
                doc.detach(row);
            }
        }
        result.add_item_to_handled(item);
        return result;
    }

    let merge_columns = merge_columns(doc, &template);

    let mut generated: Vec<Vec<NodeId>> = Vec::with_capacity(table.rows().len());
    for row in table.rows() {
        let wrapper = clone_into_wrapper(doc, w::TBL, &template);
        result.merge(ContentProcessor::fill_content(doc, ctx, wrapper, &row.all()));
        generated.push(take_children(doc, wrapper));
    }

    let new_rows: Vec<NodeId> = generated.iter().flatten().copied().collect();
    doc.insert_all_after(template[template.len() - 1], &new_rows);
    for &row in &template {
        doc.detach(row);
    }
    debug!("table '{}': {} row(s) generated", table.name(), table.rows().len());

    merge_vertically(doc, &merge_columns, &generated, template.len());

    result.add_item_to_handled(item);
    result
}

/// (template row index, cell index) of every cell marked `w:vMerge`
fn merge_columns(doc: &XmlDocument, template: &[NodeId]) -> Vec<(usize, usize)> {
    let mut columns = Vec::new();
    for (row_index, &row) in template.iter().enumerate() {
        for (cell_index, cell) in doc.first_level_descendants_and_self(row, w::TC).into_iter().enumerate() {
            let merged = doc
                .child(cell, w::TC_PR)
                .map_or(false, |properties| doc.child(properties, w::V_MERGE).is_some());
            if merged {
                columns.push((row_index, cell_index));
            }
        }
    }
    columns
}

/// Collapse runs of equal values in merge columns: the first cell of a run
/// restarts the merge, later ones continue it with empty content.
fn merge_vertically(doc: &mut XmlDocument, columns: &[(usize, usize)], generated: &[Vec<NodeId>], template_len: usize) {
    for &(row_index, cell_index) in columns {
        let mut last_value: Option<String> = None;
        for rows in generated {
            if rows.len() != template_len {
                warn!("generated row count differs from the template, merge skipped");
                return;
            }
            let Some(cell) = doc
                .first_level_descendants_and_self(rows[row_index], w::TC)
                .get(cell_index)
                .copied()
            else {
                continue;
            };

            let value = doc.text(cell);
            let v_merge = v_merge_of(doc, cell);
            if last_value.as_deref() == Some(value.as_str()) {
                doc.remove_attribute(v_merge, w::VAL);
                clear_cell(doc, cell);
            } else {
                doc.set_attribute(v_merge, w::VAL, "restart");
                last_value = Some(value);
            }
        }
    }
}

fn v_merge_of(doc: &mut XmlDocument, cell: NodeId) -> NodeId {
    let properties = match doc.child(cell, w::TC_PR) {
        Some(properties) => properties,
        None => {
            let properties = doc.create_element(w::TC_PR);
            doc.insert_child(cell, 0, properties);
            properties
        }
    };
    match doc.child(properties, w::V_MERGE) {
        Some(v_merge) => v_merge,
        None => {
            let v_merge = doc.create_element(w::V_MERGE);
            doc.append_child(properties, v_merge);
            v_merge
        }
    }
}

/// Leave only the cell properties and one empty paragraph
fn clear_cell(doc: &mut XmlDocument, cell: NodeId) {
    let paragraph_properties = doc
        .descendants_named(cell, w::P)
        .first()
        .and_then(|&paragraph| doc.child(paragraph, w::P_PR));
    let paragraph_properties = paragraph_properties.map(|properties| doc.deep_clone(properties));

    for child in doc.children(cell).to_vec() {
        if !doc.is(child, w::TC_PR) {
            doc.detach(child);
        }
    }

    let paragraph = doc.create_element(w::P);
    if let Some(properties) = paragraph_properties {
        doc.append_child(paragraph, properties);
    }
    doc.append_child(cell, paragraph);
}
