//! Fill processors, one per content kind, and the orchestrator that
//! dispatches to them

mod content;
mod context;
mod field;
mod image;
mod list;
mod single;
mod table;

pub use content::ContentProcessor;
pub use context::ProcessContext;
pub use field::FieldProcessor;
pub use image::ImageProcessor;
pub use list::ListProcessor;
pub use single::SingleProcessor;
pub use table::TableProcessor;

use crate::content::ContentItem;
use crate::control;
use crate::ooxml::names::w;
use crate::ooxml::{NodeId, XmlDocument};
use crate::result::ProcessResult;

/// Fills the items of one kind into a matched control.
///
/// `control` is `None` when no control carries the items' name; the
/// processor then reports its own items as not found. Items of other kinds
/// are ignored.
pub trait Processor {
    fn fill_content(
        &self,
        doc: &mut XmlDocument,
        ctx: &mut ProcessContext<'_>,
        control: Option<NodeId>,
        items: &[&ContentItem],
    ) -> ProcessResult;
}

/// Unwrap `control` in removal mode once something was filled into it
fn finish_control(doc: &mut XmlDocument, ctx: &ProcessContext<'_>, control: Option<NodeId>, result: &ProcessResult) {
    if let Some(control) = control {
        if ctx.remove_content_controls() && result.has_handled() {
            control::remove_control(doc, control);
        }
    }
}

/// Index range (inclusive) of the elements that hold a control named after
/// one of `names`. Everything between the first and the last hit belongs
/// to the template.
fn template_range(doc: &XmlDocument, elements: &[NodeId], names: &[String]) -> Option<(usize, usize)> {
    let holds_field = |element: NodeId| {
        doc.descendants_and_self_named(element, w::SDT)
            .into_iter()
            .any(|sdt| control::tag_of(doc, sdt).map_or(false, |tag| names.iter().any(|name| name == tag)))
    };
    let first = elements.iter().position(|&element| holds_field(element))?;
    let last = elements.iter().rposition(|&element| holds_field(element))?;
    Some((first, last))
}

/// Deep-clone `template` into a detached wrapper element
fn clone_into_wrapper(doc: &mut XmlDocument, wrapper_name: &str, template: &[NodeId]) -> NodeId {
    let wrapper = doc.create_element(wrapper_name);
    for &element in template {
        let copy = doc.deep_clone(element);
        doc.append_child(wrapper, copy);
    }
    wrapper
}

/// Children of a wrapper, detached from it
fn take_children(doc: &mut XmlDocument, wrapper: NodeId) -> Vec<NodeId> {
    let children = doc.children(wrapper).to_vec();
    for &child in &children {
        doc.detach(child);
    }
    children
}
