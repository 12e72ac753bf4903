//! Navigation menu trees.

use serde::Serialize;

/// A navigation entry, linked to its children by `parent == url`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    pub title: String,
    pub weight: i64,
    pub icon: String,
    pub url: String,
    pub subtitle: String,
    pub mobile_title: String,
    pub lead: String,
    pub in_mobile: bool,
    pub is_at_end: bool,
    pub is_dropdown: bool,
    pub hx_disable: bool,
    /// Url of the parent entry, empty for top-level entries.
    pub parent: String,
    pub children: Vec<MenuEntry>,
}

impl MenuEntry {
    /// Returns `true` for entries without a parent.
    pub fn is_top_level(&self) -> bool {
        self.parent.is_empty()
    }

    /// Count this entry and all of its descendants.
    pub fn len_recursive(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(entry) = stack.pop() {
            count += 1;
            stack.extend(entry.children.iter());
        }
        count
    }
}

/// Stable-sort a menu level and every descendant level by weight.
///
/// Entries with equal weights keep their insertion order. Levels are visited
/// with an explicit stack so deep trees do not grow the call stack.
pub fn sort_menu(entries: &mut Vec<MenuEntry>) {
    let mut stack: Vec<&mut Vec<MenuEntry>> = vec![entries];
    while let Some(level) = stack.pop() {
        level.sort_by_key(|entry| entry.weight);
        for entry in level {
            if !entry.children.is_empty() {
                stack.push(&mut entry.children);
            }
        }
    }
}
