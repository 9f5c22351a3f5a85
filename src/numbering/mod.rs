//! List numbering: identity lookup and per-copy re-allocation

mod allocator;
mod resolver;

pub use allocator::NumberingAllocator;
pub use resolver::{ListItemInfo, ListItemResolver};

use crate::ooxml::names::w;
use crate::ooxml::{NodeId, XmlDocument};

fn int_attribute(doc: &XmlDocument, node: NodeId, name: &str) -> Option<i32> {
    doc.attribute(node, name).and_then(|value| value.trim().parse().ok())
}

/// `w:val` of the first `child` element, as an integer
fn int_value(doc: &XmlDocument, node: NodeId, child: &str) -> Option<i32> {
    doc.child(node, child)
        .and_then(|child| int_attribute(doc, child, w::VAL))
}

/// `w:num` with the given `w:numId`
fn find_num(numbering: &XmlDocument, num_id: i32) -> Option<NodeId> {
    numbering
        .children_named(numbering.root(), w::NUM)
        .find(|&num| int_attribute(numbering, num, w::NUM_ID) == Some(num_id))
}

/// `w:abstractNum` with the given `w:abstractNumId`
fn find_abstract_num(numbering: &XmlDocument, abstract_num_id: i32) -> Option<NodeId> {
    numbering
        .children_named(numbering.root(), w::ABSTRACT_NUM)
        .find(|&abstract_num| int_attribute(numbering, abstract_num, w::ABSTRACT_NUM_ID) == Some(abstract_num_id))
}
