//! Keyed Children Reconciliation
//!
//! Two child lists are reconciled in five steps:
//!
//! 1. Patch the common prefix (same type and key at the same index).
//! 2. Patch the common suffix.
//! 3. Old list exhausted: mount what is left of the new list.
//! 4. New list exhausted: unmount what is left of the old list.
//! 5. Otherwise, match the unsorted middle by key (or, for unkeyed nodes,
//!    by the first unmatched node of the same type), unmount what has no
//!    match, and move only the nodes that are not on the longest increasing
//!    subsequence of old positions.
//!
//! Step 5 issues exactly `matched - LIS length` moves. The unkeyed fallback
//! scans the new range once per unkeyed old node, so an unsorted region of
//! unkeyed nodes costs quadratic time.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{trace, warn};

use super::RendererInner;
use crate::component::ComponentId;
use crate::host::{Host, HostNode};
use crate::vnode::{VNode, VNodeKey};

impl<H: Host + 'static> RendererInner<H> {
    pub(crate) fn patch_keyed_children(
        self: &Rc<Self>,
        old: &[VNode],
        next: &mut [VNode],
        container: HostNode,
        parent: Option<ComponentId>,
        parent_anchor: Option<HostNode>,
    ) {
        let len = next.len();
        let mut i = 0usize;
        let mut old_end = old.len() as isize - 1;
        let mut new_end = len as isize - 1;

        // 1. common prefix
        while i as isize <= old_end && i as isize <= new_end {
            if !old[i].same_vnode_type(&next[i]) {
                break;
            }
            self.patch(Some(&old[i]), &mut next[i], container, parent, None);
            i += 1;
        }

        // 2. common suffix
        while i as isize <= old_end && i as isize <= new_end {
            let (o, n) = (old_end as usize, new_end as usize);
            if !old[o].same_vnode_type(&next[n]) {
                break;
            }
            self.patch(Some(&old[o]), &mut next[n], container, parent, None);
            old_end -= 1;
            new_end -= 1;
        }

        // 3. only additions left
        if i as isize > old_end {
            if i as isize <= new_end {
                let next_pos = (new_end + 1) as usize;
                let anchor = if next_pos < len {
                    self.first_host_node(&next[next_pos])
                } else {
                    parent_anchor
                };
                for index in i..=new_end as usize {
                    self.patch(None, &mut next[index], container, parent, anchor);
                }
            }
            return;
        }

        // 4. only removals left
        if i as isize > new_end {
            for vnode in &old[i..=old_end as usize] {
                self.unmount(vnode, true);
            }
            return;
        }

        // 5. unsorted middle
        let (old_start, new_start) = (i, i);
        let (old_end, new_end) = (old_end as usize, new_end as usize);

        let mut key_to_new_index: HashMap<VNodeKey, usize> = HashMap::new();
        for index in new_start..=new_end {
            let Some(key) = next[index].key.clone() else {
                continue;
            };
            if let Some(&first) = key_to_new_index.get(&key) {
                warn!(
                    target: "sprig::renderer",
                    ?key,
                    first,
                    duplicate = index,
                    "duplicate key among siblings, later node is mounted fresh"
                );
                continue;
            }
            key_to_new_index.insert(key, index);
        }

        let to_be_patched = new_end - new_start + 1;
        let mut patched = 0;
        // Old index + 1 for every new position; 0 means mount fresh.
        let mut new_index_to_old_index = vec![0usize; to_be_patched];
        let mut moved = false;
        let mut max_new_index_so_far = 0;

        for (old_index, prev) in old.iter().enumerate().take(old_end + 1).skip(old_start) {
            if patched >= to_be_patched {
                self.unmount(prev, true);
                continue;
            }

            let new_index = match &prev.key {
                Some(key) => key_to_new_index
                    .get(key)
                    .copied()
                    .filter(|&index| new_index_to_old_index[index - new_start] == 0),
                None => (new_start..=new_end).find(|&index| {
                    new_index_to_old_index[index - new_start] == 0
                        && next[index].key.is_none()
                        && prev.same_vnode_type(&next[index])
                }),
            };

            let Some(new_index) = new_index else {
                self.unmount(prev, true);
                continue;
            };

            new_index_to_old_index[new_index - new_start] = old_index + 1;
            if new_index >= max_new_index_so_far {
                max_new_index_so_far = new_index;
            } else {
                moved = true;
            }
            self.patch(Some(prev), &mut next[new_index], container, parent, None);
            patched += 1;
        }

        let increasing = if moved {
            longest_increasing_subsequence(&new_index_to_old_index)
        } else {
            Vec::new()
        };
        trace!(
            target: "sprig::renderer",
            to_be_patched,
            patched,
            moved,
            stable = increasing.len(),
            "reconciling unsorted children"
        );

        let mut stable = increasing.iter().rev().peekable();
        for offset in (0..to_be_patched).rev() {
            let index = new_start + offset;
            let anchor = if index + 1 < len {
                self.first_host_node(&next[index + 1])
            } else {
                parent_anchor
            };

            if new_index_to_old_index[offset] == 0 {
                self.patch(None, &mut next[index], container, parent, anchor);
            } else if moved {
                if stable.peek() == Some(&&offset) {
                    stable.next();
                } else {
                    self.move_node(&next[index], container, anchor);
                }
            }
        }
    }
}

/// Positions of a longest strictly increasing subsequence of `seq`,
/// ignoring zero entries.
///
/// Returns indices into `seq`, in ascending order.
pub fn longest_increasing_subsequence(seq: &[usize]) -> Vec<usize> {
    let mut predecessors: Vec<Option<usize>> = vec![None; seq.len()];
    // tails[k] is the index of the smallest tail of an increasing run of
    // length k + 1.
    let mut tails: Vec<usize> = Vec::new();

    for (index, &value) in seq.iter().enumerate() {
        if value == 0 {
            continue;
        }
        let position = tails.partition_point(|&tail| seq[tail] < value);
        if position > 0 {
            predecessors[index] = Some(tails[position - 1]);
        }
        if position == tails.len() {
            tails.push(index);
        } else {
            tails[position] = index;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        result.push(index);
        cursor = predecessors[index];
    }
    result.reverse();
    result
}
