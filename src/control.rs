//! Content control (`w:sdt`) navigation and rewriting

use crate::ooxml::names::{w, XML_SPACE};
use crate::ooxml::{NodeId, XmlDocument};

/// Tag of a content control, `None` when absent or when `node` is not a control
pub fn tag_of(doc: &XmlDocument, node: NodeId) -> Option<&str> {
    if !doc.is(node, w::SDT) {
        return None;
    }
    doc.child(node, w::SDT_PR)
        .and_then(|properties| doc.child_attribute(properties, w::TAG, w::VAL))
}

/// The `w:sdtContent` of a control
pub fn control_content(doc: &XmlDocument, sdt: NodeId) -> Option<NodeId> {
    doc.child(sdt, w::SDT_CONTENT)
}

/// Controls tagged `tag` under `scope` (or `scope` itself) that are not
/// nested inside another control. Inner controls are only visible to a
/// search scoped to their parent's content.
pub fn find_top_level_controls(doc: &XmlDocument, scope: NodeId, tag: &str) -> Vec<NodeId> {
    doc.first_level_descendants_and_self(scope, w::SDT)
        .into_iter()
        .filter(|&sdt| tag_of(doc, sdt) == Some(tag))
        .collect()
}

/// Every control directly reachable from `scope`, whatever its tag
pub fn top_level_controls(doc: &XmlDocument, scope: NodeId) -> Vec<NodeId> {
    doc.first_level_descendants_and_self(scope, w::SDT)
}

/// Put `value` in the control: the first text run keeps its formatting and
/// gets the new text, every other text-bearing node is dropped.
pub fn replace_value(doc: &mut XmlDocument, sdt: NodeId, value: &str) {
    let inline = doc.parent(sdt).map_or(false, |parent| doc.is(parent, w::P));

    let content = match control_content(doc, sdt) {
        Some(content) => content,
        None => {
            let content = doc.create_element(w::SDT_CONTENT);
            doc.append_child(sdt, content);
            content
        }
    };

    let with_text: Vec<NodeId> = doc
        .elements(content)
        .filter(|&element| doc.has_descendant_or_self(element, w::T) && !doc.has_descendant_or_self(element, w::SDT))
        .collect();

    let first_text = with_text
        .first()
        .and_then(|&element| doc.descendants_and_self_named(element, w::T).into_iter().next());

    let target = match first_text {
        Some(first_text) => {
            let mut keep = doc.ancestors(first_text);
            keep.push(first_text);
            for &element in &with_text {
                for node in doc.descendants_and_self(element) {
                    if doc.is_element(node) && !keep.contains(&node) && doc.has_descendant_or_self(node, w::T) {
                        doc.detach(node);
                    }
                }
            }
            first_text
        }
        None => {
            let t = doc.create_element(w::T);
            let run = doc.create_element(w::R);
            doc.append_child(run, t);
            if inline {
                doc.append_child(content, run);
            } else if let Some(paragraph) = doc.child(content, w::P) {
                doc.append_child(paragraph, run);
            } else {
                let paragraph = doc.create_element(w::P);
                doc.append_child(paragraph, run);
                doc.append_child(content, paragraph);
            }
            t
        }
    };

    write_text(doc, target, value);
}

/// Set the text of `t`, turning line breaks into `w:br` siblings
fn write_text(doc: &mut XmlDocument, t: NodeId, value: &str) {
    let normalized = value.replace("\r\n", "\n");
    let mut lines = normalized.split('\n');
    set_run_text(doc, t, lines.next().unwrap_or_default());

    let mut last = t;
    for line in lines {
        let br = doc.create_element(w::BR);
        doc.insert_after(last, br);
        let next = doc.create_element(w::T);
        set_run_text(doc, next, line);
        doc.insert_after(br, next);
        last = next;
    }
}

fn set_run_text(doc: &mut XmlDocument, t: NodeId, text: &str) {
    doc.set_text(t, text);
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        doc.set_attribute(t, XML_SPACE, "preserve");
    }
}

/// Replace the control with its inner content, keeping document order.
///
/// A control without `w:sdtContent` is removed. For a detached control the
/// inner nodes are detached too. Returns the former inner nodes.
pub fn remove_control(doc: &mut XmlDocument, sdt: NodeId) -> Vec<NodeId> {
    let Some(content) = control_content(doc, sdt) else {
        doc.detach(sdt);
        return Vec::new();
    };

    let inner = doc.children(content).to_vec();
    if doc.parent(sdt).is_some() {
        doc.replace_with(sdt, &inner);
    } else {
        for &node in &inner {
            doc.detach(node);
        }
    }
    inner
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(doc: &XmlDocument) -> NodeId {
        doc.child(doc.root(), w::BODY).unwrap()
    }

    const NESTED: &str = r#"<w:document xmlns:w="urn:w"><w:body><w:sdt><w:sdtPr><w:tag w:val="Outer"/></w:sdtPr><w:sdtContent><w:sdt><w:sdtPr><w:tag w:val="Name"/></w:sdtPr><w:sdtContent><w:p/></w:sdtContent></w:sdt></w:sdtContent></w:sdt><w:sdt><w:sdtPr><w:tag w:val="Name"/></w:sdtPr><w:sdtContent><w:p/></w:sdtContent></w:sdt></w:body></w:document>"#;

    #[test]
    fn test_tag_of() {
        let doc = XmlDocument::parse(NESTED).unwrap();
        let controls = top_level_controls(&doc, body(&doc));
        assert_eq!(controls.len(), 2);
        assert_eq!(tag_of(&doc, controls[0]), Some("Outer"));
        assert_eq!(tag_of(&doc, body(&doc)), None);
    }

    #[test]
    fn test_nested_controls_are_hidden() {
        let doc = XmlDocument::parse(NESTED).unwrap();
        let found = find_top_level_controls(&doc, body(&doc), "Name");
        assert_eq!(found.len(), 1);

        let outer = find_top_level_controls(&doc, body(&doc), "Outer")[0];
        let inner_scope = control_content(&doc, outer).unwrap();
        assert_eq!(find_top_level_controls(&doc, inner_scope, "Name").len(), 1);
        assert!(find_top_level_controls(&doc, body(&doc), "Missing").is_empty());
    }

    #[test]
    fn test_replace_value_keeps_first_run() {
        let xml = r#"<w:document xmlns:w="urn:w"><w:body><w:sdt><w:sdtPr><w:tag w:val="Name"/></w:sdtPr><w:sdtContent><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Old</w:t></w:r><w:r><w:t>er</w:t></w:r></w:p><w:p><w:r><w:t>tail</w:t></w:r></w:p></w:sdtContent></w:sdt></w:body></w:document>"#;
        let mut doc = XmlDocument::parse(xml).unwrap();
        let sdt = find_top_level_controls(&doc, body(&doc), "Name")[0];
        replace_value(&mut doc, sdt, "New");

        let content = control_content(&doc, sdt).unwrap();
        assert_eq!(doc.text(content), "New");
        assert_eq!(doc.descendants_named(content, w::T).len(), 1);
        assert_eq!(doc.descendants_named(content, "w:b").len(), 1);
        assert_eq!(doc.children_named(content, w::P).count(), 1);
    }

    #[test]
    fn test_replace_value_skips_nested_controls() {
        let xml = r#"<w:document xmlns:w="urn:w"><w:body><w:sdt><w:sdtPr><w:tag w:val="Name"/></w:sdtPr><w:sdtContent><w:sdt><w:sdtPr><w:tag w:val="Inner"/></w:sdtPr><w:sdtContent><w:p><w:r><w:t>keep</w:t></w:r></w:p></w:sdtContent></w:sdt><w:p><w:r><w:t>Old</w:t></w:r></w:p></w:sdtContent></w:sdt></w:body></w:document>"#;
        let mut doc = XmlDocument::parse(xml).unwrap();
        let sdt = find_top_level_controls(&doc, body(&doc), "Name")[0];
        replace_value(&mut doc, sdt, "New");
        assert_eq!(doc.text(sdt), "keepNew");
    }

    #[test]
    fn test_replace_value_without_text() {
        let xml = r#"<w:document xmlns:w="urn:w"><w:body><w:sdt><w:sdtPr><w:tag w:val="Name"/></w:sdtPr><w:sdtContent><w:p/></w:sdtContent></w:sdt><w:p><w:sdt><w:sdtPr><w:tag w:val="Inline"/></w:sdtPr></w:sdt></w:p></w:body></w:document>"#;
        let mut doc = XmlDocument::parse(xml).unwrap();
        let block = find_top_level_controls(&doc, body(&doc), "Name")[0];
        replace_value(&mut doc, block, "Block");
        let content = control_content(&doc, block).unwrap();
        let paragraph = doc.child(content, w::P).unwrap();
        assert_eq!(doc.text(paragraph), "Block");

        let inline = find_top_level_controls(&doc, body(&doc), "Inline")[0];
        replace_value(&mut doc, inline, "Inline");
        let content = control_content(&doc, inline).unwrap();
        assert!(doc.child(content, w::R).is_some());
        assert_eq!(doc.text(content), "Inline");
    }

    #[test]
    fn test_replace_value_line_breaks_and_spaces() {
        let xml = r#"<w:document xmlns:w="urn:w"><w:body><w:p><w:sdt><w:sdtPr><w:tag w:val="Name"/></w:sdtPr><w:sdtContent><w:r><w:t>x</w:t></w:r></w:sdtContent></w:sdt></w:p></w:body></w:document>"#;
        let mut doc = XmlDocument::parse(xml).unwrap();
        let sdt = find_top_level_controls(&doc, body(&doc), "Name")[0];
        replace_value(&mut doc, sdt, "one\r\ntwo\n three");

        let run = doc.descendants_named(sdt, w::R)[0];
        let names: Vec<&str> = doc.elements(run).filter_map(|node| doc.name(node)).collect();
        assert_eq!(names, vec!["w:t", "w:br", "w:t", "w:br", "w:t"]);

        let texts = doc.descendants_named(run, w::T);
        assert_eq!(doc.text(texts[2]), " three");
        assert_eq!(doc.attribute(texts[2], XML_SPACE), Some("preserve"));
        assert_eq!(doc.attribute(texts[0], XML_SPACE), None);
    }

    #[test]
    fn test_remove_control_unwraps_in_place() {
        let xml = r#"<w:document xmlns:w="urn:w"><w:body><w:p/><w:sdt><w:sdtPr><w:tag w:val="Name"/></w:sdtPr><w:sdtContent><w:p><w:r><w:t>a</w:t></w:r></w:p><w:p><w:r><w:t>b</w:t></w:r></w:p></w:sdtContent></w:sdt><w:tbl/></w:body></w:document>"#;
        let mut doc = XmlDocument::parse(xml).unwrap();
        let sdt = find_top_level_controls(&doc, body(&doc), "Name")[0];
        let inner = remove_control(&mut doc, sdt);

        assert_eq!(inner.len(), 2);
        let names: Vec<&str> = doc.elements(body(&doc)).filter_map(|node| doc.name(node)).collect();
        assert_eq!(names, vec!["w:p", "w:p", "w:p", "w:tbl"]);
        assert_eq!(doc.text(body(&doc)), "ab");
    }

    #[test]
    fn test_remove_empty_and_detached_controls() {
        let xml = r#"<w:document xmlns:w="urn:w"><w:body><w:sdt><w:sdtPr><w:tag w:val="Empty"/></w:sdtPr></w:sdt><w:sdt><w:sdtPr><w:tag w:val="Loose"/></w:sdtPr><w:sdtContent><w:p/></w:sdtContent></w:sdt></w:body></w:document>"#;
        let mut doc = XmlDocument::parse(xml).unwrap();
        let empty = find_top_level_controls(&doc, body(&doc), "Empty")[0];
        assert!(remove_control(&mut doc, empty).is_empty());
        assert!(!doc.is_attached(empty));

        let loose = find_top_level_controls(&doc, body(&doc), "Loose")[0];
        doc.detach(loose);
        let inner = remove_control(&mut doc, loose);
        assert_eq!(inner.len(), 1);
        assert_eq!(doc.parent(inner[0]), None);
    }
}
