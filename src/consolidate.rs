use crate::attr::{Attr, AttrValue};

/// Merge handler-level attributes and a record's own attributes into one
/// de-duplicated tree.
///
/// Record attributes are placed inside `active_group` when one is open.
/// The merge walks the input left to right, outer to inner:
///
/// - a repeated key keeps its first position and takes the last value;
/// - groups sharing a key are merged recursively;
/// - a group with an empty key is inlined into its parent;
/// - scalar attributes with an empty key are dropped;
/// - groups that end up empty are removed.
pub fn consolidate_attrs(
    handler_attrs: &[Attr],
    active_group: Option<&str>,
    record_attrs: &[Attr],
) -> Vec<Attr> {
    let mut merged = Vec::with_capacity(handler_attrs.len() + record_attrs.len());
    merge_into(&mut merged, handler_attrs.iter().cloned());

    match active_group {
        Some(group) if !group.is_empty() => {
            merge_into(&mut merged, [Attr::group(group, record_attrs.to_vec())]);
        }
        _ => merge_into(&mut merged, record_attrs.iter().cloned()),
    }

    prune_empty_groups(&mut merged);
    merged
}

fn merge_into(target: &mut Vec<Attr>, attrs: impl IntoIterator<Item = Attr>) {
    for attr in attrs {
        let Attr { key, value } = attr;
        match value {
            AttrValue::Group(children) if key.is_empty() => merge_into(target, children),
            AttrValue::Group(children) => match target.iter_mut().find(|a| a.key == key) {
                Some(slot) => match &mut slot.value {
                    AttrValue::Group(existing) => merge_into(existing, children),
                    other => *other = AttrValue::Group(merged_group(children)),
                },
                None => target.push(Attr::group(key, merged_group(children))),
            },
            AttrValue::Value(_) if key.is_empty() => {}
            value => match target.iter_mut().find(|a| a.key == key) {
                Some(slot) => slot.value = value,
                None => target.push(Attr { key, value }),
            },
        }
    }
}

fn merged_group(children: Vec<Attr>) -> Vec<Attr> {
    let mut group = Vec::with_capacity(children.len());
    merge_into(&mut group, children);
    group
}

fn prune_empty_groups(attrs: &mut Vec<Attr>) {
    attrs.retain_mut(|attr| match &mut attr.value {
        AttrValue::Group(children) => {
            prune_empty_groups(children);
            !children.is_empty()
        }
        AttrValue::Value(_) => true,
    });
}
