//! Group descriptors and the published grouping result.

use crate::error::{Error, Result};
use crate::value::GroupKey;

/// One ordered group of record indices.
///
/// A group owns its member list; hosts receive read-only access to it, while
/// the label and presentation metadata stay open for the column's per-group
/// formatting hook.
#[derive(Debug, Clone)]
pub struct Group {
    label: String,
    subtitle: Option<String>,
    footer: Option<String>,
    collapsible: bool,
    collapsed: bool,
    sort_key: Option<GroupKey>,
    members: Vec<usize>,
}

impl Group {
    pub(crate) fn new(label: String, sort_key: Option<GroupKey>, members: Vec<usize>) -> Self {
        Self {
            label,
            subtitle: None,
            footer: None,
            collapsible: true,
            collapsed: false,
            sort_key,
            members,
        }
    }

    /// Returns the display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replaces the display label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Returns the subtitle, if any.
    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    /// Sets or clears the subtitle.
    pub fn set_subtitle(&mut self, subtitle: Option<String>) {
        self.subtitle = subtitle;
    }

    /// Returns the footer, if any.
    pub fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }

    /// Sets or clears the footer.
    pub fn set_footer(&mut self, footer: Option<String>) {
        self.footer = footer;
    }

    /// Returns `true` if the host may collapse this group.
    pub fn collapsible(&self) -> bool {
        self.collapsible
    }

    /// Sets whether the host may collapse this group.
    pub fn set_collapsible(&mut self, collapsible: bool) {
        self.collapsible = collapsible;
    }

    /// Returns `true` if the group starts out collapsed.
    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    /// Sets whether the group starts out collapsed.
    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    /// Returns the orderable sort key, when the group key admits one.
    ///
    /// The ungrouped (null-key) group has no sort key and participates in
    /// group ordering by label only.
    pub fn sort_key(&self) -> Option<&GroupKey> {
        self.sort_key.as_ref()
    }

    /// Returns the member record indices, in display order.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Returns the number of members.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Renders a group title through a two-slot template.
///
/// `{0}` is the base label and `{1}` the member count; `{{`/`}}` escape
/// literal braces. A malformed template degrades to an inline diagnostic
/// label so a bad format string can never abort a rebuild.
pub(crate) fn format_group_title(template: &str, label: &str, count: usize) -> String {
    match try_format_title(template, label, count) {
        Some(title) => title,
        None => format!("Invalid group title format: {template}"),
    }
}

fn try_format_title(template: &str, label: &str, count: usize) -> Option<String> {
    let mut out = String::with_capacity(template.len() + label.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut slot = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(d) => slot.push(d),
                        None => return None,
                    }
                }
                match slot.as_str() {
                    "0" => out.push_str(label),
                    "1" => out.push_str(&count.to_string()),
                    _ => return None,
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                } else {
                    return None;
                }
            }
            c => out.push(c),
        }
    }
    Some(out)
}

/// The published result of one rebuild: an ordered group list plus the
/// reverse index from record index to group position.
///
/// A `Grouping` is immutable once published; the engine swaps in a freshly
/// built instance on every rebuild and hands out shared handles, so queries
/// never observe a partially rebuilt state.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    groups: Vec<Group>,
    item_to_group: Vec<usize>,
}

impl Grouping {
    /// Builds the reverse index over a final, ordered group list.
    pub(crate) fn new(groups: Vec<Group>, source_count: usize) -> Self {
        let mut item_to_group = vec![usize::MAX; source_count];
        for (position, group) in groups.iter().enumerate() {
            for &index in group.members() {
                debug_assert_eq!(
                    item_to_group[index],
                    usize::MAX,
                    "record {index} assigned to two groups"
                );
                item_to_group[index] = position;
            }
        }
        debug_assert!(
            item_to_group.iter().all(|&g| g != usize::MAX),
            "every record must land in exactly one group"
        );
        Self {
            groups,
            item_to_group,
        }
    }

    /// Returns the ordered groups.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Returns the number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the number of source records this result was built from.
    pub fn source_count(&self) -> usize {
        self.item_to_group.len()
    }

    /// Returns the position of the group owning the record at `index`.
    ///
    /// O(1).
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the published result's source range,
    /// e.g. after the source shrank but before a rebuild.
    pub fn group_of_item(&self, index: usize) -> usize {
        self.try_group_of_item(index)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Fallible variant of [`Grouping::group_of_item`].
    pub fn try_group_of_item(&self, index: usize) -> Result<usize> {
        self.item_to_group
            .get(index)
            .copied()
            .ok_or(Error::ItemOutOfRange {
                index,
                count: self.item_to_group.len(),
            })
    }

    /// Returns the record index at `position` within the group at `group`.
    ///
    /// O(1).
    ///
    /// # Panics
    ///
    /// Panics if `group` or `position` is out of range.
    pub fn member_of_group(&self, group: usize, position: usize) -> usize {
        self.try_member_of_group(group, position)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Fallible variant of [`Grouping::member_of_group`].
    pub fn try_member_of_group(&self, group: usize, position: usize) -> Result<usize> {
        let members = self.group_members(group)?;
        members
            .get(position)
            .copied()
            .ok_or(Error::PositionOutOfRange {
                position,
                count: members.len(),
            })
    }

    /// Returns the position of record `index` within the group at `group`,
    /// or `None` when the record belongs to a different group.
    ///
    /// O(k) in the group's size; reverse-lookup queries are local to one
    /// group, never over the whole dataset.
    ///
    /// # Panics
    ///
    /// Panics if `group` is out of range.
    pub fn position_within_group(&self, group: usize, index: usize) -> Option<usize> {
        match self.try_position_within_group(group, index) {
            Ok(position) => Some(position),
            Err(Error::NotAMember { .. }) => None,
            Err(e) => panic!("{e}"),
        }
    }

    /// Fallible variant of [`Grouping::position_within_group`].
    pub fn try_position_within_group(&self, group: usize, index: usize) -> Result<usize> {
        let members = self.group_members(group)?;
        members
            .iter()
            .position(|&member| member == index)
            .ok_or(Error::NotAMember { index, group })
    }

    fn group_members(&self, group: usize) -> Result<&[usize]> {
        self.groups
            .get(group)
            .map(Group::members)
            .ok_or(Error::GroupOutOfRange {
                group,
                count: self.groups.len(),
            })
    }
}
