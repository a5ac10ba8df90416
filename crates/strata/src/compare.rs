//! The leaf comparator: chained two-column ordering of model records.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::collation::Collation;
use crate::column::{Column, SortOrder, SortSpec};
use crate::value::compare_values;

/// Orders two model records by a primary column, optionally tie-breaking on
/// a secondary column.
///
/// The comparator operates directly on records, so it serves both the
/// engine's intra-group sort and host-side sorting of plain rows.
///
/// # Ordering rules
///
/// - A direction of [`SortOrder::None`] disables this level entirely: every
///   pair compares equal and the secondary is not consulted.
/// - A missing value ([`Value::None`](crate::Value::None)) ranks before any
///   present value; both missing compare equal. `Descending` inverts the
///   whole comparison, missingness included, so missing records lead under
///   `Ascending` and trail under `Descending`.
/// - Textual values compare through the injected [`Collation`].
/// - Heterogeneous or unordered value pairs compare equal, never an error.
/// - The secondary comparator is consulted only on ties, and is never built
///   for the identical column handle (a second pass over the same column
///   cannot break a tie).
pub struct RowComparer<T> {
    column: Arc<Column<T>>,
    order: SortOrder,
    collation: Arc<dyn Collation>,
    secondary: Option<Box<RowComparer<T>>>,
}

impl<T> RowComparer<T> {
    /// Creates a single-level comparator.
    pub fn new(spec: &SortSpec<T>, collation: Arc<dyn Collation>) -> Self {
        Self {
            column: spec.column.clone(),
            order: spec.order,
            collation,
            secondary: None,
        }
    }

    /// Creates a comparator with a tie-breaking secondary level.
    ///
    /// The secondary level is skipped when it names the same column handle
    /// as the primary.
    pub fn with_secondary(
        primary: &SortSpec<T>,
        secondary: Option<&SortSpec<T>>,
        collation: Arc<dyn Collation>,
    ) -> Self {
        let mut comparer = Self::new(primary, collation.clone());
        if let Some(spec) = secondary
            && !Column::same(&primary.column, &spec.column)
        {
            comparer.secondary = Some(Box::new(Self::new(spec, collation)));
        }
        comparer
    }

    /// Compares two records.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        if self.order == SortOrder::None {
            return Ordering::Equal;
        }

        let va = self.column.value(a);
        let vb = self.column.value(b);

        let mut ord = compare_values(&va, &vb, &*self.collation).or_equal();
        if self.order == SortOrder::Descending {
            ord = ord.reverse();
        }

        if ord == Ordering::Equal
            && let Some(secondary) = &self.secondary
        {
            return secondary.compare(a, b);
        }
        ord
    }
}
