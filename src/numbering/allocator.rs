use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{find_abstract_num, find_num, int_attribute, int_value};
use crate::ooxml::names::w;
use crate::ooxml::{NodeId, XmlDocument};

/// Gives duplicated list branches their own numbering definitions.
///
/// Tracks the last `w:numId` used at each indent level. When a freshly
/// inserted branch reuses a level that was already seen, its `w:num` and
/// `w:abstractNum` are cloned under new ids so the copies restart
/// numbering instead of continuing each other.
#[derive(Debug)]
pub struct NumberingAllocator {
    last_num_ids: HashMap<i32, i32>,
    settled: HashSet<NodeId>,
    rng: StdRng,
}

impl Default for NumberingAllocator {
    fn default() -> Self {
        NumberingAllocator::new()
    }
}

impl NumberingAllocator {
    pub fn new() -> Self {
        NumberingAllocator {
            last_num_ids: HashMap::new(),
            settled: HashSet::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic `w:nsid` values
    pub fn with_seed(seed: u64) -> Self {
        NumberingAllocator {
            last_num_ids: HashMap::new(),
            settled: HashSet::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn last_num_id(&self, level: i32) -> Option<i32> {
        self.last_num_ids.get(&level).copied()
    }

    /// Re-number the list paragraphs inside `elements`.
    ///
    /// Returns how many numbering definitions were cloned.
    pub fn reset_numbering(
        &mut self,
        doc: &mut XmlDocument,
        numbering: Option<&mut XmlDocument>,
        elements: &[NodeId],
    ) -> usize {
        let mut groups: Vec<((i32, i32), Vec<NodeId>)> = Vec::new();
        for &element in elements {
            for num_pr in doc.descendants_and_self_named(element, w::NUM_PR) {
                if self.settled.contains(&num_pr) {
                    continue;
                }
                let Some(num_id_node) = doc.child(num_pr, w::NUM_ID) else {
                    continue;
                };
                let Some(num_id) = int_attribute(doc, num_id_node, w::VAL) else {
                    continue;
                };
                let ilvl = int_value(doc, num_pr, w::ILVL).unwrap_or(0);
                self.settled.insert(num_pr);

                match groups.iter_mut().find(|(key, _)| *key == (num_id, ilvl)) {
                    Some((_, nodes)) => nodes.push(num_id_node),
                    None => groups.push(((num_id, ilvl), vec![num_id_node])),
                }
            }
        }

        let Some(numbering) = numbering else {
            if !groups.is_empty() {
                debug!("no numbering part, {} list group(s) left as is", groups.len());
            }
            return 0;
        };

        let mut cloned = 0;
        for ((num_id, ilvl), num_id_nodes) in groups {
            if num_id == 0 || !self.last_num_ids.contains_key(&ilvl) {
                self.last_num_ids.insert(ilvl, num_id);
                continue;
            }

            let Some(next_num_id) = self.clone_definition(numbering, num_id) else {
                continue;
            };
            for node in num_id_nodes {
                doc.set_attribute(node, w::VAL, next_num_id.to_string());
            }
            debug!("level {} renumbered from numId {} to {}", ilvl, num_id, next_num_id);
            self.last_num_ids.insert(ilvl, next_num_id);
            cloned += 1;
        }
        cloned
    }

    /// Clone `w:num` `num_id` and its abstract definition; returns the new numId
    fn clone_definition(&mut self, numbering: &mut XmlDocument, num_id: i32) -> Option<i32> {
        let root = numbering.root();
        let Some(num) = find_num(numbering, num_id) else {
            warn!("numbering definition {} not found, list copy keeps it", num_id);
            return None;
        };
        let abstract_num = int_value(numbering, num, w::ABSTRACT_NUM_ID)
            .and_then(|abstract_num_id| find_abstract_num(numbering, abstract_num_id));
        let Some(abstract_num) = abstract_num else {
            warn!("abstract numbering for numId {} not found", num_id);
            return None;
        };

        let (last_num, last_num_id) = highest_id(numbering, w::NUM, w::NUM_ID)?;
        let (_, last_abstract_num_id) = highest_id(numbering, w::ABSTRACT_NUM, w::ABSTRACT_NUM_ID)?;
        let last_abstract_num = numbering.children_named(root, w::ABSTRACT_NUM).last()?;
        let next_num_id = last_num_id + 1;
        let next_abstract_num_id = last_abstract_num_id + 1;

        let new_abstract_num = numbering.deep_clone(abstract_num);
        numbering.set_attribute(new_abstract_num, w::ABSTRACT_NUM_ID, next_abstract_num_id.to_string());
        if let Some(nsid) = numbering.child(new_abstract_num, w::NSID) {
            let value: u32 = self.rng.gen();
            numbering.set_attribute(nsid, w::VAL, format!("{:08X}", value));
        }
        numbering.insert_after(last_abstract_num, new_abstract_num);

        let new_num = numbering.deep_clone(num);
        numbering.set_attribute(new_num, w::NUM_ID, next_num_id.to_string());
        let abstract_reference = next_abstract_num_id.to_string();
        match numbering.child(new_num, w::ABSTRACT_NUM_ID) {
            Some(reference) => numbering.set_attribute(reference, w::VAL, abstract_reference),
            None => {
                let reference = numbering.create_element_with(w::ABSTRACT_NUM_ID, &[(w::VAL, abstract_reference.as_str())]);
                numbering.insert_child(new_num, 0, reference);
            }
        }
        numbering.insert_after(last_num, new_num);

        Some(next_num_id)
    }
}

/// Child of the root named `name` with the largest integer `id_attribute`
fn highest_id(doc: &XmlDocument, name: &str, id_attribute: &str) -> Option<(NodeId, i32)> {
    doc.children_named(doc.root(), name)
        .filter_map(|node| int_attribute(doc, node, id_attribute).map(|id| (node, id)))
        .max_by_key(|&(_, id)| id)
}
