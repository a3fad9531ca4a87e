use chrono::Utc;

use crate::wbs::{Dependency, WbsItem, ROOT_PARENT};

/// Inserts `node` as the last child of the item matching `parent_id`,
/// or as a new top-level item when `parent_id` is the `"root"`
/// sentinel. The input forest is consumed and a new forest returned;
/// an unknown parent id leaves the forest unchanged.
pub fn insert_child(mut forest: Vec<WbsItem>, parent_id: &str, node: WbsItem) -> Vec<WbsItem> {
    if parent_id == ROOT_PARENT {
        forest.push(node);
        return forest;
    }
    let mut pending = Some(node);
    for item in &mut forest {
        attach_to_parent(item, parent_id, &mut pending);
        if pending.is_none() {
            break;
        }
    }
    forest
}

fn attach_to_parent(item: &mut WbsItem, parent_id: &str, pending: &mut Option<WbsItem>) {
    if pending.is_none() {
        return;
    }
    if item.id == parent_id {
        if let Some(node) = pending.take() {
            item.children.push(node);
        }
        return;
    }
    for child in &mut item.children {
        attach_to_parent(child, parent_id, pending);
        if pending.is_none() {
            return;
        }
    }
}

/// Replaces the item whose id matches `updated.id` anywhere in the
/// forest, keeping the existing children of the matched node and
/// re-stamping its `updated_at`. An id with no match is a no-op: the
/// forest comes back unchanged and callers treat the update as an
/// idempotent merge.
pub fn update_node(mut forest: Vec<WbsItem>, updated: &WbsItem) -> Vec<WbsItem> {
    for item in &mut forest {
        if replace_in_place(item, updated) {
            break;
        }
    }
    forest
}

fn replace_in_place(item: &mut WbsItem, updated: &WbsItem) -> bool {
    if item.id == updated.id {
        let children = std::mem::take(&mut item.children);
        *item = updated.clone();
        item.children = children;
        item.updated_at = Utc::now();
        return true;
    }
    for child in &mut item.children {
        if replace_in_place(child, updated) {
            return true;
        }
    }
    false
}

/// Appends a dependency to the item matching `node_id`, assigning it a
/// generated id. Unknown node ids are a silent no-op, same as
/// [`update_node`].
pub fn add_dependency(mut forest: Vec<WbsItem>, node_id: &str, dep: Dependency) -> Vec<WbsItem> {
    let mut pending = Some(dep);
    for item in &mut forest {
        append_dependency(item, node_id, &mut pending);
        if pending.is_none() {
            break;
        }
    }
    forest
}

fn append_dependency(item: &mut WbsItem, node_id: &str, pending: &mut Option<Dependency>) {
    if pending.is_none() {
        return;
    }
    if item.id == node_id {
        if let Some(mut dep) = pending.take() {
            dep.id = format!("dep-{}-{}", item.id, item.dependencies.len() + 1);
            item.dependencies.push(dep);
            item.updated_at = Utc::now();
        }
        return;
    }
    for child in &mut item.children {
        append_dependency(child, node_id, pending);
        if pending.is_none() {
            return;
        }
    }
}

/// Finds an item by id anywhere in the forest.
pub fn find_node<'a>(forest: &'a [WbsItem], id: &str) -> Option<&'a WbsItem> {
    for item in forest {
        if item.id == id {
            return Some(item);
        }
        if let Some(found) = find_node(&item.children, id) {
            return Some(found);
        }
    }
    None
}

/// Display code for a new item. Top-level items are numbered by the
/// current root count; children reuse the child's level as the suffix
/// (`parent.code + "." + level`). Two children of the same parent can
/// therefore share a code; consumers key on ids, codes are labels.
pub fn next_code(forest: &[WbsItem], parent_id: &str) -> String {
    if parent_id == ROOT_PARENT {
        return (forest.len() + 1).to_string();
    }
    match find_node(forest, parent_id) {
        Some(parent) => format!("{}.{}", parent.code, parent.level + 1),
        None => (forest.len() + 1).to_string(),
    }
}
