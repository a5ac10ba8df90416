//! Column descriptors.
//!
//! A [`Column`] tells the engine how to read one aspect of an opaque model
//! record: the sortable value, the group key, the key's display title, and
//! an optional per-group formatting hook. Extraction is closure-based; the
//! engine never reflects over the record itself.
//!
//! Columns are shared as `Arc<Column<T>>`; two handles describe "the same
//! column" when they point at the same descriptor ([`Column::same`]), which
//! the comparator uses to suppress a pointless secondary sort.

use std::sync::Arc;

use crate::engine::GroupingParameters;
use crate::group::Group;
use crate::value::{GroupKey, Value};

/// Type alias for a value extractor function.
pub type ValueGetter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// Type alias for a group-key extractor function.
pub type GroupKeyGetter<T> = Arc<dyn Fn(&T) -> GroupKey + Send + Sync>;

/// Type alias for a key-to-title converter.
pub type KeyTitleFn = Arc<dyn Fn(&GroupKey) -> String + Send + Sync>;

/// Type alias for a per-group formatting hook.
///
/// The hook may restyle a group's label and presentation metadata; it cannot
/// reach the member list.
pub type GroupFormatterFn<T> = Arc<dyn Fn(&mut Group, &GroupingParameters<T>) + Send + Sync>;

/// Sort direction for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
    /// Sorting disabled at this level.
    None,
}

impl SortOrder {
    /// Returns `true` unless sorting is disabled.
    pub fn is_sorted(&self) -> bool {
        !matches!(self, SortOrder::None)
    }
}

/// Describes how to read one aspect of a model record.
///
/// # Example
///
/// ```
/// use strata::{Column, Value};
///
/// struct Employee { department: String }
///
/// let by_department = Column::new("Department", |e: &Employee| {
///     Value::from(e.department.as_str())
/// });
/// assert_eq!(by_department.title(), "Department");
/// ```
pub struct Column<T> {
    title: String,
    value_getter: ValueGetter<T>,
    group_key_getter: Option<GroupKeyGetter<T>>,
    key_title: Option<KeyTitleFn>,
    group_formatter: Option<GroupFormatterFn<T>>,
}

impl<T> Column<T> {
    /// Creates a column with the given title and value extractor.
    ///
    /// The group key defaults to keying the extracted value and the group
    /// title defaults to the key's display rendering; use
    /// [`Column::builder`] to override either.
    pub fn new<F>(title: impl Into<String>, value_getter: F) -> Arc<Self>
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self::builder(title, value_getter).build()
    }

    /// Starts building a column with the given title and value extractor.
    pub fn builder<F>(title: impl Into<String>, value_getter: F) -> ColumnBuilder<T>
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        ColumnBuilder {
            title: title.into(),
            value_getter: Arc::new(value_getter),
            group_key_getter: None,
            key_title: None,
            group_formatter: None,
        }
    }

    /// Returns the column's display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Extracts the sortable value from a record.
    pub fn value(&self, model: &T) -> Value {
        (self.value_getter)(model)
    }

    /// Extracts the group key from a record.
    ///
    /// Without an explicit key getter, the key is derived from the extracted
    /// value. A [`GroupKey::Null`] answer is always valid and routes the
    /// record to the ungrouped bucket.
    pub fn group_key(&self, model: &T) -> GroupKey {
        match &self.group_key_getter {
            Some(getter) => getter(model),
            None => GroupKey::from_value(&self.value(model)),
        }
    }

    /// Converts a group key into the group's base title.
    pub fn group_title(&self, key: &GroupKey) -> String {
        match &self.key_title {
            Some(convert) => convert(key),
            None => key.to_label(),
        }
    }

    /// Returns `true` if this column carries a per-group formatting hook.
    pub fn has_group_formatter(&self) -> bool {
        self.group_formatter.is_some()
    }

    /// Runs the per-group formatting hook, if any.
    pub(crate) fn format_group(&self, group: &mut Group, parameters: &GroupingParameters<T>) {
        if let Some(formatter) = &self.group_formatter {
            formatter(group, parameters);
        }
    }

    /// Returns `true` when both handles describe the same column.
    pub fn same(a: &Arc<Column<T>>, b: &Arc<Column<T>>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("title", &self.title)
            .field("has_group_key_getter", &self.group_key_getter.is_some())
            .field("has_group_formatter", &self.group_formatter.is_some())
            .finish()
    }
}

/// Builder for [`Column`].
pub struct ColumnBuilder<T> {
    title: String,
    value_getter: ValueGetter<T>,
    group_key_getter: Option<GroupKeyGetter<T>>,
    key_title: Option<KeyTitleFn>,
    group_formatter: Option<GroupFormatterFn<T>>,
}

impl<T> ColumnBuilder<T> {
    /// Sets an explicit group-key extractor.
    pub fn group_key<F>(mut self, getter: F) -> Self
    where
        F: Fn(&T) -> GroupKey + Send + Sync + 'static,
    {
        self.group_key_getter = Some(Arc::new(getter));
        self
    }

    /// Sets an explicit key-to-title converter.
    pub fn group_title<F>(mut self, convert: F) -> Self
    where
        F: Fn(&GroupKey) -> String + Send + Sync + 'static,
    {
        self.key_title = Some(Arc::new(convert));
        self
    }

    /// Sets a per-group formatting hook, run after a group is built.
    pub fn group_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&mut Group, &GroupingParameters<T>) + Send + Sync + 'static,
    {
        self.group_formatter = Some(Arc::new(formatter));
        self
    }

    /// Builds the column.
    pub fn build(self) -> Arc<Column<T>> {
        Arc::new(Column {
            title: self.title,
            value_getter: self.value_getter,
            group_key_getter: self.group_key_getter,
            key_title: self.key_title,
            group_formatter: self.group_formatter,
        })
    }
}

/// A column paired with a sort direction.
#[derive(Debug)]
pub struct SortSpec<T> {
    /// The column to read.
    pub column: Arc<Column<T>>,
    /// The direction to apply.
    pub order: SortOrder,
}

impl<T> Clone for SortSpec<T> {
    fn clone(&self) -> Self {
        Self {
            column: self.column.clone(),
            order: self.order,
        }
    }
}

impl<T> SortSpec<T> {
    /// Creates a sort spec.
    pub fn new(column: Arc<Column<T>>, order: SortOrder) -> Self {
        Self { column, order }
    }

    /// Creates an ascending sort spec.
    pub fn ascending(column: Arc<Column<T>>) -> Self {
        Self::new(column, SortOrder::Ascending)
    }

    /// Creates a descending sort spec.
    pub fn descending(column: Arc<Column<T>>) -> Self {
        Self::new(column, SortOrder::Descending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        city: Option<String>,
        population: i64,
    }

    #[test]
    fn test_default_group_key_follows_value() {
        let column = Column::new("City", |r: &Row| match &r.city {
            Some(c) => Value::from(c.as_str()),
            None => Value::None,
        });

        let row = Row {
            city: Some("Oslo".into()),
            population: 700_000,
        };
        assert_eq!(column.group_key(&row), GroupKey::String("Oslo".into()));

        let missing = Row {
            city: None,
            population: 0,
        };
        assert_eq!(column.group_key(&missing), GroupKey::Null);
    }

    #[test]
    fn test_explicit_group_key_and_title() {
        // Bucket by population magnitude instead of the raw value.
        let column = Column::builder("Population", |r: &Row| Value::from(r.population))
            .group_key(|r| GroupKey::Int(r.population / 1_000_000))
            .group_title(|key| match key {
                GroupKey::Int(m) => format!("{}M+", m),
                _ => "Unknown".into(),
            })
            .build();

        let row = Row {
            city: None,
            population: 3_400_000,
        };
        assert_eq!(column.group_key(&row), GroupKey::Int(3));
        assert_eq!(column.group_title(&GroupKey::Int(3)), "3M+");
    }

    #[test]
    fn test_column_identity() {
        let a = Column::new("A", |_: &Row| Value::None);
        let b = Column::new("A", |_: &Row| Value::None);
        let a2 = a.clone();

        assert!(Column::same(&a, &a2));
        assert!(!Column::same(&a, &b));
    }
}
