use std::collections::HashMap;

use log::{trace, warn};

use super::{find_abstract_num, find_num, int_attribute, int_value};
use crate::ooxml::names::w;
use crate::ooxml::{NodeId, XmlDocument};

/// Deepest `w:numStyleLink` chain followed before giving up
const MAX_STYLE_LINK_DEPTH: usize = 8;

/// Effective list identity of a paragraph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListItemInfo {
    pub is_list_item: bool,
    /// `w:numId` referenced by the paragraph or its style
    pub num_id: Option<i32>,
    pub abstract_num_id: Option<i32>,
    /// Indent level (`w:ilvl`)
    pub level: Option<i32>,
    pub start: Option<i32>,
    /// The `w:lvl` definition in the numbering part
    pub lvl: Option<NodeId>,
}

impl ListItemInfo {
    fn not_a_list_item() -> Self {
        ListItemInfo::default()
    }

    fn list_item() -> Self {
        ListItemInfo {
            is_list_item: true,
            ..ListItemInfo::default()
        }
    }
}

/// Resolves paragraphs to their numbering identity.
///
/// Results are cached per paragraph node for the life of the resolver, which
/// is one fill pass.
#[derive(Debug, Default)]
pub struct ListItemResolver {
    cache: HashMap<NodeId, ListItemInfo>,
}

impl ListItemResolver {
    pub fn new() -> Self {
        ListItemResolver::default()
    }

    pub fn resolve(
        &mut self,
        doc: &XmlDocument,
        paragraph: NodeId,
        numbering: Option<&XmlDocument>,
        styles: Option<&XmlDocument>,
    ) -> ListItemInfo {
        if let Some(info) = self.cache.get(&paragraph) {
            return *info;
        }
        let info = Self::compute(doc, paragraph, numbering, styles);
        trace!("paragraph {:?} resolved to {:?}", paragraph, info);
        self.cache.insert(paragraph, info);
        info
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn compute(
        doc: &XmlDocument,
        paragraph: NodeId,
        numbering: Option<&XmlDocument>,
        styles: Option<&XmlDocument>,
    ) -> ListItemInfo {
        let properties = doc.child(paragraph, w::P_PR);
        let paragraph_style = properties.and_then(|properties| doc.child_attribute(properties, w::P_STYLE, w::VAL));
        let num_pr = properties
            .and_then(|properties| doc.child(properties, w::NUM_PR))
            .filter(|&num_pr| doc.child(num_pr, w::NUM_ID).is_some());

        if let Some(num_pr) = num_pr {
            let num_id = int_value(doc, num_pr, w::NUM_ID).unwrap_or(0);
            let ilvl = int_value(doc, num_pr, w::ILVL);

            let mut info = match (numbering, ilvl, paragraph_style) {
                (Some(numbering), Some(ilvl), _) => by_num_id_and_ilvl(numbering, styles, num_id, ilvl, 0),
                (Some(numbering), None, Some(style_id)) => by_num_id_and_style(numbering, styles, num_id, style_id, 0),
                _ => ListItemInfo::not_a_list_item(),
            };
            info.num_id = Some(num_id);
            info.level = ilvl.or(info.level);
            return info;
        }

        let (Some(style_id), Some(styles)) = (paragraph_style, styles) else {
            return ListItemInfo::not_a_list_item();
        };
        let Some(style_num_pr) = paragraph_style_num_pr(styles, style_id) else {
            return ListItemInfo::not_a_list_item();
        };

        let num_id = int_value(styles, style_num_pr, w::NUM_ID).unwrap_or(0);
        let ilvl = int_value(styles, style_num_pr, w::ILVL).unwrap_or(0);
        let mut info = match numbering {
            Some(numbering) => by_num_id_and_ilvl(numbering, Some(styles), num_id, ilvl, 0),
            None => ListItemInfo::not_a_list_item(),
        };
        info.num_id = Some(num_id);
        info.level = Some(ilvl);
        info
    }
}

/// `w:numPr` (with a `w:numId`) of a paragraph style
fn paragraph_style_num_pr(styles: &XmlDocument, style_id: &str) -> Option<NodeId> {
    let style = styles.children_named(styles.root(), w::STYLE).find(|&style| {
        styles.attribute(style, w::TYPE) == Some("paragraph") && styles.attribute(style, w::STYLE_ID) == Some(style_id)
    })?;
    style_num_pr(styles, style)
}

fn style_num_pr(styles: &XmlDocument, style: NodeId) -> Option<NodeId> {
    styles
        .child(style, w::P_PR)
        .and_then(|properties| styles.child(properties, w::NUM_PR))
        .filter(|&num_pr| styles.child(num_pr, w::NUM_ID).is_some())
}

/// `w:numId` behind a `w:numStyleLink`
fn linked_num_id(styles: Option<&XmlDocument>, link: &str) -> Option<i32> {
    let styles = styles?;
    let style = styles
        .children_named(styles.root(), w::STYLE)
        .find(|&style| styles.attribute(style, w::STYLE_ID) == Some(link))?;
    let num_pr = style_num_pr(styles, style)?;
    int_value(styles, num_pr, w::NUM_ID)
}

fn by_num_id_and_ilvl(
    numbering: &XmlDocument,
    styles: Option<&XmlDocument>,
    num_id: i32,
    ilvl: i32,
    depth: usize,
) -> ListItemInfo {
    if num_id == 0 || depth > MAX_STYLE_LINK_DEPTH {
        return ListItemInfo::not_a_list_item();
    }
    let Some(num) = find_num(numbering, num_id) else {
        warn!("numbering definition {} not found", num_id);
        return ListItemInfo::not_a_list_item();
    };

    let mut info = ListItemInfo::list_item();
    info.abstract_num_id = int_value(numbering, num, w::ABSTRACT_NUM_ID);
    info.level = Some(ilvl);

    let level_override = numbering
        .children_named(num, w::LVL_OVERRIDE)
        .find(|&level_override| int_attribute(numbering, level_override, w::ILVL) == Some(ilvl));
    if let Some(level_override) = level_override {
        info.start = int_value(numbering, level_override, w::START_OVERRIDE);
        if let Some(lvl) = numbering.child(level_override, w::LVL) {
            info.lvl = Some(lvl);
            info.start = info.start.or_else(|| int_value(numbering, lvl, w::START));
            return info;
        }
    }

    let Some(abstract_num) = info.abstract_num_id.and_then(|id| find_abstract_num(numbering, id)) else {
        warn!("abstract numbering for numId {} not found", num_id);
        return ListItemInfo::not_a_list_item();
    };

    if let Some(link) = numbering.child_attribute(abstract_num, w::NUM_STYLE_LINK, w::VAL) {
        let Some(linked) = linked_num_id(styles, link) else {
            warn!("numbering style link '{}' cannot be followed", link);
            return ListItemInfo::not_a_list_item();
        };
        let mut linked_info = by_num_id_and_ilvl(numbering, styles, linked, ilvl, depth + 1);
        if info.start.is_some() {
            linked_info.start = info.start;
        }
        return linked_info;
    }

    for level in (0..=ilvl).rev() {
        let lvl = numbering
            .children_named(abstract_num, w::LVL)
            .find(|&lvl| int_attribute(numbering, lvl, w::ILVL) == Some(level));
        if let Some(lvl) = lvl {
            info.lvl = Some(lvl);
            info.start = info.start.or_else(|| int_value(numbering, lvl, w::START));
            return info;
        }
    }
    ListItemInfo::not_a_list_item()
}

/// Level lookup when the paragraph has a `w:numId` but no `w:ilvl`: the
/// level is the one whose `w:pStyle` names the paragraph's style
fn by_num_id_and_style(
    numbering: &XmlDocument,
    styles: Option<&XmlDocument>,
    num_id: i32,
    style_id: &str,
    depth: usize,
) -> ListItemInfo {
    if num_id == 0 || depth > MAX_STYLE_LINK_DEPTH {
        return ListItemInfo::not_a_list_item();
    }
    let Some(num) = find_num(numbering, num_id) else {
        return ListItemInfo::not_a_list_item();
    };

    let mut info = ListItemInfo::list_item();
    info.abstract_num_id = int_value(numbering, num, w::ABSTRACT_NUM_ID);
    let Some(abstract_num) = info.abstract_num_id.and_then(|id| find_abstract_num(numbering, id)) else {
        return ListItemInfo::not_a_list_item();
    };

    if let Some(link) = numbering.child_attribute(abstract_num, w::NUM_STYLE_LINK, w::VAL) {
        return match linked_num_id(styles, link) {
            Some(linked) => by_num_id_and_style(numbering, styles, linked, style_id, depth + 1),
            None => ListItemInfo::not_a_list_item(),
        };
    }

    info.lvl = numbering
        .children_named(abstract_num, w::LVL)
        .find(|&lvl| numbering.child_attribute(lvl, w::P_STYLE, w::VAL) == Some(style_id));
    if let Some(lvl) = info.lvl {
        info.start = int_value(numbering, lvl, w::START);
        info.level = int_attribute(numbering, lvl, w::ILVL);
    }
    info
}
