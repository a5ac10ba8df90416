//! The grouping engine: partition, sort, build, publish.
//!
//! Every rebuild runs the same top-to-bottom pipeline over the source:
//!
//! ```text
//! ┌───────────┐   ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ Partition │──>│ Sort bucket │──>│ Build groups │──>│ Sort groups │
//! │ (one pass)│   │   members   │   │ (label/hook) │   │             │
//! └───────────┘   └─────────────┘   └──────────────┘   └─────────────┘
//!                                                             │
//!                                              ┌──────────────▼─────┐
//!                                              │ Build reverse index│
//!                                              │ and publish        │
//!                                              └────────────────────┘
//! ```
//!
//! The previously published [`Grouping`] stays fully queryable until the new
//! one is swapped in as a single unit.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use parking_lot::RwLock;

use strata_core::Signal;

use crate::collation::{CaseInsensitiveCollation, Collation};
use crate::column::{Column, SortOrder, SortSpec};
use crate::compare::RowComparer;
use crate::error::Result;
use crate::group::{Group, Grouping, format_group_title};
use crate::source::RowSource;
use crate::value::{GroupKey, ValueOrdering, compare_keys};

/// Type alias for an explicit group comparator.
pub type GroupComparer = Arc<dyn Fn(&Group, &Group) -> Ordering + Send + Sync>;

/// Type alias for an explicit item comparator.
///
/// When supplied, it replaces the column-driven intra-group sort entirely.
pub type ItemComparer<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Everything one rebuild needs to know: the group-by column and order, the
/// intra-group sort columns, optional comparator overrides, and the title
/// templates.
///
/// # Example
///
/// ```
/// use strata::{Column, GroupingParameters, SortSpec, Value};
///
/// #[derive(Clone)]
/// struct Ticket { queue: &'static str, priority: i64 }
///
/// let queue = Column::new("Queue", |t: &Ticket| Value::from(t.queue));
/// let priority = Column::new("Priority", |t: &Ticket| Value::from(t.priority));
///
/// let params = GroupingParameters::new(SortSpec::ascending(queue))
///     .with_primary_sort(SortSpec::descending(priority))
///     .with_title_format("{0} ({1})")
///     .with_title_format_singular("{0} (1 ticket)");
/// ```
pub struct GroupingParameters<T> {
    group_by: SortSpec<T>,
    primary_sort: Option<SortSpec<T>>,
    secondary_sort: Option<SortSpec<T>>,
    group_comparer: Option<GroupComparer>,
    item_comparer: Option<ItemComparer<T>>,
    title_format: Option<String>,
    title_format_singular: Option<String>,
    sort_by_display_column: bool,
    display_column: Option<Arc<Column<T>>>,
}

impl<T> Clone for GroupingParameters<T> {
    fn clone(&self) -> Self {
        Self {
            group_by: self.group_by.clone(),
            primary_sort: self.primary_sort.clone(),
            secondary_sort: self.secondary_sort.clone(),
            group_comparer: self.group_comparer.clone(),
            item_comparer: self.item_comparer.clone(),
            title_format: self.title_format.clone(),
            title_format_singular: self.title_format_singular.clone(),
            sort_by_display_column: self.sort_by_display_column,
            display_column: self.display_column.clone(),
        }
    }
}

impl<T> GroupingParameters<T> {
    /// Creates parameters grouping by the given column and order.
    pub fn new(group_by: SortSpec<T>) -> Self {
        Self {
            group_by,
            primary_sort: None,
            secondary_sort: None,
            group_comparer: None,
            item_comparer: None,
            title_format: None,
            title_format_singular: None,
            sort_by_display_column: false,
            display_column: None,
        }
    }

    /// Sets the primary intra-group sort.
    pub fn with_primary_sort(mut self, spec: SortSpec<T>) -> Self {
        self.primary_sort = Some(spec);
        self
    }

    /// Sets the secondary (tie-break) intra-group sort.
    pub fn with_secondary_sort(mut self, spec: SortSpec<T>) -> Self {
        self.secondary_sort = Some(spec);
        self
    }

    /// Supplies an explicit group comparator, replacing the default
    /// sort-key/label ordering. The comparator is used as given; it is
    /// expected to encode the desired direction itself.
    pub fn with_group_comparer<F>(mut self, comparer: F) -> Self
    where
        F: Fn(&Group, &Group) -> Ordering + Send + Sync + 'static,
    {
        self.group_comparer = Some(Arc::new(comparer));
        self
    }

    /// Supplies an explicit item comparator, replacing the column-driven
    /// intra-group sort entirely.
    pub fn with_item_comparer<F>(mut self, comparer: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.item_comparer = Some(Arc::new(comparer));
        self
    }

    /// Sets the group title template (`{0}` label, `{1}` count).
    pub fn with_title_format(mut self, template: impl Into<String>) -> Self {
        self.title_format = Some(template.into());
        self
    }

    /// Sets the template used instead of the title format when a group has
    /// exactly one member.
    pub fn with_title_format_singular(mut self, template: impl Into<String>) -> Self {
        self.title_format_singular = Some(template.into());
        self
    }

    /// Sorts group members by the host's primary display column instead of
    /// the configured primary-sort column. The primary sort direction still
    /// applies.
    pub fn with_display_column_sort(mut self, column: Arc<Column<T>>) -> Self {
        self.sort_by_display_column = true;
        self.display_column = Some(column);
        self
    }

    /// Returns the group-by spec.
    pub fn group_by(&self) -> &SortSpec<T> {
        &self.group_by
    }

    /// Returns the primary intra-group sort spec, if set.
    pub fn primary_sort(&self) -> Option<&SortSpec<T>> {
        self.primary_sort.as_ref()
    }

    /// Returns the secondary intra-group sort spec, if set.
    pub fn secondary_sort(&self) -> Option<&SortSpec<T>> {
        self.secondary_sort.as_ref()
    }

    /// Returns the explicit group comparator, if set.
    pub fn group_comparer(&self) -> Option<&GroupComparer> {
        self.group_comparer.as_ref()
    }

    /// Returns the explicit item comparator, if set.
    pub fn item_comparer(&self) -> Option<&ItemComparer<T>> {
        self.item_comparer.as_ref()
    }

    /// Returns the group title template, if set.
    pub fn title_format(&self) -> Option<&str> {
        self.title_format.as_deref()
    }

    /// Returns the singular group title template, if set.
    pub fn title_format_singular(&self) -> Option<&str> {
        self.title_format_singular.as_deref()
    }

    /// Returns `true` when members sort by the display column.
    pub fn sorts_by_display_column(&self) -> bool {
        self.sort_by_display_column
    }

    /// Returns the designated display column, if set.
    pub fn display_column(&self) -> Option<&Arc<Column<T>>> {
        self.display_column.as_ref()
    }
}

/// Extension point for prefetch strategies.
///
/// The engine forwards range signals from the host verbatim; the default
/// sink ignores them. Implementations carry no correctness obligation.
pub trait CacheHintSink: Send + Sync {
    /// Signals that records between the two group positions are about to be
    /// read.
    fn cache_hint(
        &self,
        from_group: usize,
        from_position: usize,
        to_group: usize,
        to_position: usize,
    );
}

/// The default, do-nothing cache-hint sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheHint;

impl CacheHintSink for NoopCacheHint {
    fn cache_hint(&self, _: usize, _: usize, _: usize, _: usize) {}
}

/// Collection of signals emitted by a [`GroupedView`].
pub struct GroupSignals {
    /// Emitted just before a rebuild recomputes the grouping.
    pub about_to_regroup: Signal<()>,
    /// Emitted after a rebuild published its result. Args: group count.
    pub regrouped: Signal<usize>,
}

impl Default for GroupSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupSignals {
    /// Creates a new set of group signals.
    pub fn new() -> Self {
        Self {
            about_to_regroup: Signal::new(),
            regrouped: Signal::new(),
        }
    }
}

/// Resolved intra-group ordering for one rebuild.
enum ItemOrdering<T> {
    Explicit(ItemComparer<T>),
    Computed(RowComparer<T>),
    Unsorted,
}

fn resolve_item_ordering<T>(
    params: &GroupingParameters<T>,
    collation: &Arc<dyn Collation>,
) -> ItemOrdering<T> {
    if let Some(comparer) = params.item_comparer() {
        return ItemOrdering::Explicit(comparer.clone());
    }

    let primary = if params.sorts_by_display_column()
        && let Some(column) = params.display_column()
    {
        let order = params
            .primary_sort()
            .map(|spec| spec.order)
            .unwrap_or(SortOrder::Ascending);
        Some(SortSpec::new(column.clone(), order))
    } else {
        params.primary_sort().cloned()
    };

    match primary {
        Some(spec) => ItemOrdering::Computed(RowComparer::with_secondary(
            &spec,
            params.secondary_sort(),
            collation.clone(),
        )),
        None => ItemOrdering::Unsorted,
    }
}

/// Single pass over the source: snapshot the rows and bucket their indices
/// by group key, keys in first-seen order, source order within each bucket.
fn partition<S: RowSource>(
    source: &S,
    column: &Arc<Column<S::Row>>,
) -> (Vec<S::Row>, Vec<(GroupKey, Vec<usize>)>) {
    let count = source.count();
    let mut rows = Vec::with_capacity(count);
    let mut buckets: Vec<(GroupKey, Vec<usize>)> = Vec::new();
    let mut slots: HashMap<GroupKey, usize> = HashMap::new();

    for index in 0..count {
        let model = source.row(index);
        let key = column.group_key(&model);
        match slots.entry(key) {
            Entry::Occupied(slot) => buckets[*slot.get()].1.push(index),
            Entry::Vacant(slot) => {
                let position = buckets.len();
                buckets.push((slot.key().clone(), vec![index]));
                slot.insert(position);
            }
        }
        rows.push(model);
    }

    (rows, buckets)
}

fn build_group<T>(
    column: &Arc<Column<T>>,
    key: GroupKey,
    members: Vec<usize>,
    params: &GroupingParameters<T>,
) -> Group {
    let base = column.group_title(&key);
    let count = members.len();

    let label = if count == 1
        && let Some(template) = params.title_format_singular()
    {
        format_group_title(template, &base, count)
    } else if let Some(template) = params.title_format() {
        format_group_title(template, &base, count)
    } else {
        base
    };

    let sort_key = (!key.is_null()).then_some(key);
    let mut group = Group::new(label, sort_key, members);
    column.format_group(&mut group, params);
    group
}

fn default_group_order(a: &Group, b: &Group, collation: &dyn Collation) -> Ordering {
    let keyed = match (a.sort_key(), b.sort_key()) {
        (Some(ka), Some(kb)) => compare_keys(ka, kb, collation),
        _ => ValueOrdering::Incomparable,
    };
    match keyed {
        ValueOrdering::Ordered(ord) => ord,
        // Keyless or incomparably keyed groups order by label instead.
        ValueOrdering::Incomparable => collation.compare(a.label(), b.label()),
    }
}

fn sort_groups<T>(
    groups: &mut [Group],
    params: &GroupingParameters<T>,
    collation: &Arc<dyn Collation>,
) {
    let order = params.group_by().order;
    if order == SortOrder::None {
        return;
    }

    if let Some(comparer) = params.group_comparer() {
        groups.sort_by(|a, b| comparer(a, b));
    } else {
        groups.sort_by(|a, b| {
            let ord = default_group_order(a, b, &**collation);
            if order == SortOrder::Descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }
}

/// Grouped, sorted view over a row source.
///
/// The view owns its published [`Grouping`] and rebuilds it wholesale on
/// every [`build_groups`](GroupedView::build_groups) /
/// [`regroup`](GroupedView::regroup) call; queries in between run against
/// the last published result. All operations are expected to be driven from
/// one logical thread; a rebuild runs to completion synchronously.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use strata::{Column, GroupedView, GroupingParameters, SortSpec, Value};
///
/// #[derive(Clone)]
/// struct Employee { name: &'static str, dept: &'static str, year: i64 }
///
/// let dept = Column::new("Department", |e: &Employee| Value::from(e.dept));
/// let year = Column::new("Hired", |e: &Employee| Value::from(e.year));
///
/// let staff = Arc::new(vec![
///     Employee { name: "Amy", dept: "Eng", year: 2020 },
///     Employee { name: "Bob", dept: "Eng", year: 2019 },
///     Employee { name: "Cara", dept: "Sales", year: 2021 },
/// ]);
///
/// let view = GroupedView::new(staff);
/// let grouping = view.build_groups(
///     GroupingParameters::new(SortSpec::ascending(dept))
///         .with_primary_sort(SortSpec::ascending(year)),
/// );
///
/// assert_eq!(grouping.groups()[0].label(), "Eng");
/// assert_eq!(grouping.groups()[0].members(), &[1, 0]); // Bob hired first
/// assert_eq!(view.group_of_item(2), 1); // Cara is in "Sales"
/// ```
pub struct GroupedView<S: RowSource> {
    source: Arc<S>,
    params: RwLock<Option<GroupingParameters<S::Row>>>,
    grouping: RwLock<Arc<Grouping>>,
    collation: RwLock<Arc<dyn Collation>>,
    cache_sink: RwLock<Arc<dyn CacheHintSink>>,
    signals: GroupSignals,
}

impl<S: RowSource> GroupedView<S> {
    /// Creates a view over the given source. No grouping is published until
    /// the first [`build_groups`](GroupedView::build_groups) call.
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            params: RwLock::new(None),
            grouping: RwLock::new(Arc::new(Grouping::default())),
            collation: RwLock::new(Arc::new(CaseInsensitiveCollation)),
            cache_sink: RwLock::new(Arc::new(NoopCacheHint)),
            signals: GroupSignals::new(),
        }
    }

    /// Returns a reference to the source.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Returns the signals for this view.
    pub fn signals(&self) -> &GroupSignals {
        &self.signals
    }

    /// Replaces the text-comparison strategy used by subsequent rebuilds.
    pub fn set_collation(&self, collation: Arc<dyn Collation>) {
        *self.collation.write() = collation;
    }

    /// Replaces the cache-hint sink.
    pub fn set_cache_hint_sink(&self, sink: Arc<dyn CacheHintSink>) {
        *self.cache_sink.write() = sink;
    }

    /// Returns the parameters of the last build, if any.
    pub fn parameters(&self) -> Option<GroupingParameters<S::Row>> {
        self.params.read().clone()
    }

    /// Stores the parameters and rebuilds the grouping.
    ///
    /// Returns a handle to the freshly published result. An empty source
    /// yields an empty group list.
    pub fn build_groups(&self, params: GroupingParameters<S::Row>) -> Arc<Grouping> {
        *self.params.write() = Some(params);
        self.regroup()
    }

    /// Rebuilds the grouping with the last-used parameters.
    ///
    /// Call after the source, the collation, or anything a column reads has
    /// changed. Without stored parameters this leaves the published result
    /// untouched.
    pub fn regroup(&self) -> Arc<Grouping> {
        let Some(params) = self.params.read().clone() else {
            tracing::trace!(
                target: "strata::engine",
                "regroup requested before any parameters were set"
            );
            return self.grouping();
        };
        let collation = self.collation.read().clone();

        self.signals.about_to_regroup.emit(());
        let grouping = Arc::new(self.compute(&params, &collation));
        *self.grouping.write() = grouping.clone();
        tracing::debug!(
            target: "strata::engine",
            rows = grouping.source_count(),
            groups = grouping.len(),
            "regrouped"
        );
        self.signals.regrouped.emit(grouping.len());
        grouping
    }

    /// Returns a handle to the currently published result.
    ///
    /// The handle stays valid and internally consistent even if the view
    /// rebuilds afterwards.
    pub fn grouping(&self) -> Arc<Grouping> {
        self.grouping.read().clone()
    }

    /// Returns the position of the group owning the record at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the published result's source range.
    pub fn group_of_item(&self, index: usize) -> usize {
        self.grouping.read().group_of_item(index)
    }

    /// Fallible variant of [`GroupedView::group_of_item`].
    pub fn try_group_of_item(&self, index: usize) -> Result<usize> {
        self.grouping.read().try_group_of_item(index)
    }

    /// Returns the record index at `position` within the group at `group`.
    ///
    /// # Panics
    ///
    /// Panics if `group` or `position` is out of range.
    pub fn member_of_group(&self, group: usize, position: usize) -> usize {
        self.grouping.read().member_of_group(group, position)
    }

    /// Fallible variant of [`GroupedView::member_of_group`].
    pub fn try_member_of_group(&self, group: usize, position: usize) -> Result<usize> {
        self.grouping.read().try_member_of_group(group, position)
    }

    /// Returns the position of record `index` within the group at `group`,
    /// or `None` when it belongs to a different group.
    ///
    /// # Panics
    ///
    /// Panics if `group` is out of range.
    pub fn position_within_group(&self, group: usize, index: usize) -> Option<usize> {
        self.grouping.read().position_within_group(group, index)
    }

    /// Fallible variant of [`GroupedView::position_within_group`].
    pub fn try_position_within_group(&self, group: usize, index: usize) -> Result<usize> {
        self.grouping.read().try_position_within_group(group, index)
    }

    /// Forwards a requested-range signal to the cache-hint sink.
    pub fn cache_hint(
        &self,
        from_group: usize,
        from_position: usize,
        to_group: usize,
        to_position: usize,
    ) {
        self.cache_sink
            .read()
            .cache_hint(from_group, from_position, to_group, to_position);
    }

    fn compute(
        &self,
        params: &GroupingParameters<S::Row>,
        collation: &Arc<dyn Collation>,
    ) -> Grouping {
        let column = params.group_by().column.clone();
        let (rows, mut buckets) = partition(&*self.source, &column);

        // Stable sorts keep equal-ranked members in source order, so
        // repeated rebuilds of unchanged data are repeatable.
        match resolve_item_ordering(params, collation) {
            ItemOrdering::Explicit(comparer) => {
                for (_, members) in &mut buckets {
                    members.sort_by(|&a, &b| comparer(&rows[a], &rows[b]));
                }
            }
            ItemOrdering::Computed(comparer) => {
                for (_, members) in &mut buckets {
                    members.sort_by(|&a, &b| comparer.compare(&rows[a], &rows[b]));
                }
            }
            ItemOrdering::Unsorted => {}
        }

        let mut groups: Vec<Group> = buckets
            .into_iter()
            .map(|(key, members)| build_group(&column, key, members, params))
            .collect();
        sort_groups(&mut groups, params, collation);

        Grouping::new(groups, rows.len())
    }
}
