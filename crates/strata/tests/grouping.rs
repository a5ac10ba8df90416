//! Cross-module behavior of the grouping pipeline over randomized datasets.

use std::cmp::Ordering;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use strata::{
    CaseInsensitiveCollation, Column, GroupKey, GroupedView, GroupingParameters, SortSpec, Value,
    compare_values,
};

/// Installs a subscriber so `RUST_LOG=strata=debug cargo test` shows the
/// engine's rebuild traces. Safe to call from every test.
fn trace_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Clone)]
struct Order {
    region: Option<&'static str>,
    amount: i64,
    priority: i64,
}

const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

fn random_orders(count: usize, seed: u64) -> Vec<Order> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| Order {
            // Roughly one in five orders has no region at all.
            region: if rng.gen_range(0..5) == 0 {
                None
            } else {
                Some(REGIONS[rng.gen_range(0..REGIONS.len())])
            },
            amount: rng.gen_range(0..50),
            priority: rng.gen_range(0..5),
        })
        .collect()
}

fn region_column() -> Arc<Column<Order>> {
    Column::new("Region", |o: &Order| match o.region {
        Some(r) => Value::from(r),
        None => Value::None,
    })
}

fn amount_column() -> Arc<Column<Order>> {
    Column::new("Amount", |o: &Order| Value::from(o.amount))
}

fn priority_column() -> Arc<Column<Order>> {
    Column::new("Priority", |o: &Order| Value::from(o.priority))
}

fn standard_params() -> GroupingParameters<Order> {
    GroupingParameters::new(SortSpec::ascending(region_column()))
        .with_primary_sort(SortSpec::ascending(amount_column()))
        .with_secondary_sort(SortSpec::descending(priority_column()))
}

#[test]
fn partition_is_complete_and_disjoint() {
    trace_init();
    let orders = random_orders(500, 7);
    let count = orders.len();
    let view = GroupedView::new(Arc::new(orders));
    let grouping = view.build_groups(standard_params());

    let total: usize = grouping.groups().iter().map(|g| g.count()).sum();
    assert_eq!(total, count);

    let mut seen = vec![false; count];
    for group in grouping.groups() {
        assert_eq!(group.count(), group.members().len());
        for &index in group.members() {
            assert!(!seen[index], "index {index} appeared twice");
            seen[index] = true;
        }
    }
    assert!(seen.into_iter().all(|s| s));
}

#[test]
fn equal_keys_share_a_group() {
    let orders = random_orders(300, 11);
    let column = region_column();
    let view = GroupedView::new(Arc::new(orders.clone()));
    view.build_groups(standard_params());

    for i in 0..orders.len() {
        for j in (i + 1)..orders.len() {
            let same_key = column.group_key(&orders[i]) == column.group_key(&orders[j]);
            let same_group = view.group_of_item(i) == view.group_of_item(j);
            assert_eq!(same_key, same_group, "records {i} and {j} disagree");
        }
    }
}

#[test]
fn reverse_lookups_round_trip() {
    trace_init();
    let orders = random_orders(400, 13);
    let count = orders.len();
    let view = GroupedView::new(Arc::new(orders));
    view.build_groups(standard_params());

    for index in 0..count {
        let group = view.group_of_item(index);
        let position = view
            .position_within_group(group, index)
            .expect("record must be a member of its own group");
        assert_eq!(view.member_of_group(group, position), index);
    }
}

#[test]
fn members_follow_primary_then_secondary_order() {
    let orders = random_orders(400, 17);
    let amount = amount_column();
    let priority = priority_column();
    let view = GroupedView::new(Arc::new(orders.clone()));
    let grouping = view.build_groups(standard_params());

    let collation = CaseInsensitiveCollation;
    for group in grouping.groups() {
        for pair in group.members().windows(2) {
            let (a, b) = (&orders[pair[0]], &orders[pair[1]]);
            let primary =
                compare_values(&amount.value(a), &amount.value(b), &collation).or_equal();
            assert_ne!(primary, Ordering::Greater, "primary ascending violated");
            if primary == Ordering::Equal {
                let secondary =
                    compare_values(&priority.value(a), &priority.value(b), &collation).or_equal();
                // Secondary is descending.
                assert_ne!(secondary, Ordering::Less, "secondary descending violated");
            }
        }
    }
}

#[test]
fn rebuilds_of_unchanged_input_are_identical() {
    let orders = random_orders(350, 19);
    let view = GroupedView::new(Arc::new(orders));

    let first = view.build_groups(standard_params());
    let second = view.build_groups(standard_params());

    assert_eq!(first.len(), second.len());
    for (a, b) in first.groups().iter().zip(second.groups()) {
        assert_eq!(a.label(), b.label());
        assert_eq!(a.members(), b.members());
    }
}

#[test]
fn shuffled_ties_keep_source_order() {
    // Every record ties on the primary sort; stability must preserve the
    // source order within each group.
    let mut rng = StdRng::seed_from_u64(23);
    let mut orders: Vec<Order> = (0..100)
        .map(|_| Order {
            region: Some(REGIONS[rng.gen_range(0..REGIONS.len())]),
            amount: 1,
            priority: 1,
        })
        .collect();
    orders.shuffle(&mut rng);

    let view = GroupedView::new(Arc::new(orders));
    let grouping = view.build_groups(standard_params());

    for group in grouping.groups() {
        for pair in group.members().windows(2) {
            assert!(pair[0] < pair[1], "tie broke source order");
        }
    }
}

#[test]
fn groups_order_by_key_then_label_and_invert() {
    let orders = random_orders(300, 29);
    let view = GroupedView::new(Arc::new(orders.clone()));

    let ascending = view.build_groups(standard_params());
    let keys: Vec<Option<GroupKey>> = ascending
        .groups()
        .iter()
        .map(|g| g.sort_key().cloned())
        .collect();
    let collation = CaseInsensitiveCollation;
    for pair in ascending.groups().windows(2) {
        match (pair[0].sort_key(), pair[1].sort_key()) {
            (Some(a), Some(b)) => {
                let ord = strata::compare_keys(a, b, &collation).or_equal();
                assert_ne!(ord, Ordering::Greater);
            }
            // The keyless (null) group sorts by its label, here "".
            _ => {}
        }
    }

    let descending = view.build_groups(
        GroupingParameters::new(SortSpec::descending(region_column()))
            .with_primary_sort(SortSpec::ascending(amount_column())),
    );
    let reversed: Vec<Option<GroupKey>> = descending
        .groups()
        .iter()
        .rev()
        .map(|g| g.sort_key().cloned())
        .collect();
    assert_eq!(keys, reversed);
}

#[test]
fn null_region_forms_its_own_group() {
    let orders = vec![
        Order { region: Some("North"), amount: 1, priority: 0 },
        Order { region: None, amount: 2, priority: 0 },
        Order { region: Some("North"), amount: 3, priority: 0 },
        Order { region: None, amount: 4, priority: 0 },
    ];
    let view = GroupedView::new(Arc::new(orders));
    let grouping = view.build_groups(standard_params());

    assert_eq!(grouping.len(), 2);
    assert_eq!(view.group_of_item(1), view.group_of_item(3));
    assert_ne!(view.group_of_item(0), view.group_of_item(1));

    let null_group = view.group_of_item(1);
    assert!(grouping.groups()[null_group].sort_key().is_none());
    assert_eq!(grouping.groups()[null_group].count(), 2);
}

#[test]
fn empty_source_builds_empty_grouping() {
    let view = GroupedView::new(Arc::new(Vec::<Order>::new()));
    let grouping = view.build_groups(standard_params());

    assert!(grouping.is_empty());
    assert!(view.try_group_of_item(0).is_err());
    assert!(view.try_member_of_group(0, 0).is_err());
}

#[test]
fn stale_handles_answer_from_their_own_layout() {
    let orders = random_orders(50, 31);
    let view = GroupedView::new(Arc::new(orders));
    let before = view.build_groups(standard_params());
    let before_count = before.len();

    // Regroup by a different column; the old handle keeps its layout.
    view.build_groups(GroupingParameters::new(SortSpec::ascending(
        priority_column(),
    )));

    assert_eq!(before.len(), before_count);
    for index in 0..before.source_count() {
        let group = before.group_of_item(index);
        assert!(before.groups()[group].members().contains(&index));
    }
}
