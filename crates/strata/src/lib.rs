//! Grouping and sorting engine for index-addressed model collections.
//!
//! Strata partitions a collection of opaque records into ordered groups and
//! answers reverse-lookup queries (record→group, group-position→record)
//! without the host ever materializing the dataset: the host only asks
//! "what is at index N" and "which group owns index N". This enables:
//!
//! - Grouped presentation of virtual lists of any size
//! - Multi-key sorting with null tolerance and tie-breaking
//! - Atomic rebuilds: the previous result stays queryable until the new one
//!   is published as a single unit
//!
//! # Core Types
//!
//! - [`Value`] / [`GroupKey`]: type-erased cell values and hashable group keys
//! - [`Column`]: closure-based extraction of one aspect of a record
//! - [`SortSpec`] / [`SortOrder`]: a column paired with a direction
//! - [`RowComparer`]: the chained two-column leaf comparator
//! - [`GroupingParameters`]: everything one rebuild needs to know
//! - [`Group`] / [`Grouping`]: the published result and its reverse index
//! - [`GroupedView`]: the engine facade hosts query
//! - [`RowSource`] / [`RecordList`]: where the records come from
//!
//! # Pipeline
//!
//! ```text
//! ┌───────────┐   ┌─────────────┐   ┌───────────┐   ┌─────────────┐
//! │ Extractor │──>│ Partitioner │──>│ Bucket    │──>│ Group       │
//! │ (Column)  │   │ (one pass)  │   │ sorter    │   │ builder     │
//! └───────────┘   └─────────────┘   └───────────┘   └──────┬──────┘
//!                                                          │
//!                              ┌───────────────┐   ┌───────▼──────┐
//!                              │ Reverse-index │<──│ Group sorter │
//!                              │ builder       │   │              │
//!                              └───────────────┘   └──────────────┘
//! ```
//!
//! Data flows strictly top-to-bottom on every rebuild; the host then issues
//! read-only queries against the published [`Grouping`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use strata::{Column, GroupedView, GroupingParameters, SortSpec, Value};
//!
//! #[derive(Clone)]
//! struct Employee { name: &'static str, dept: &'static str, year: i64 }
//!
//! let dept = Column::new("Department", |e: &Employee| Value::from(e.dept));
//! let year = Column::new("Hired", |e: &Employee| Value::from(e.year));
//!
//! let staff = Arc::new(vec![
//!     Employee { name: "Amy", dept: "Eng", year: 2020 },
//!     Employee { name: "Bob", dept: "Eng", year: 2019 },
//!     Employee { name: "Cara", dept: "Sales", year: 2021 },
//! ]);
//!
//! let view = GroupedView::new(staff);
//! let grouping = view.build_groups(
//!     GroupingParameters::new(SortSpec::ascending(dept))
//!         .with_primary_sort(SortSpec::ascending(year))
//!         .with_title_format("{0} ({1})"),
//! );
//!
//! assert_eq!(grouping.groups()[0].label(), "Eng (2)");
//! assert_eq!(view.member_of_group(0, 0), 1); // Bob, hired 2019
//! assert_eq!(view.group_of_item(2), 1);      // Cara is in "Sales"
//! ```

mod collation;
mod column;
mod compare;
mod engine;
mod error;
mod group;
mod source;
mod value;

pub use collation::{CaseInsensitiveCollation, Collation, OrdinalCollation};
pub use column::{
    Column, ColumnBuilder, GroupFormatterFn, GroupKeyGetter, KeyTitleFn, SortOrder, SortSpec,
    ValueGetter,
};
pub use compare::RowComparer;
pub use engine::{
    CacheHintSink, GroupComparer, GroupSignals, GroupedView, GroupingParameters, ItemComparer,
    NoopCacheHint,
};
pub use error::{Error, Result};
pub use group::{Group, Grouping};
pub use source::{ListSignals, RecordList, RowSource};
pub use value::{FloatKey, GroupKey, Value, ValueOrdering, compare_keys, compare_values};
