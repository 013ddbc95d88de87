mod common;

use std::sync::atomic::Ordering;

use common::{Answer, Scripted, columns, coordinator, populated};
use mindy::request::Conjunction;
use mindy::{MindyError, Request, Row};

fn request(indexes: &[&str], includes: Vec<Row>, excludes: Vec<Row>, conjunction: Conjunction) -> Request {
    Request::new(indexes.iter().map(|s| s.to_string()).collect(), includes, excludes, conjunction)
}

#[tokio::test]
async fn and_over_three_indexes() {
    let coordinator = coordinator(populated(), 2);
    let req = request(
        &["p1", "two", "p3"],
        vec![Row::new(0, "f1"), Row::new(0, "f2")],
        vec![],
        Conjunction::And,
    );
    let results = coordinator.execute(req).await.expect("query ok");
    assert_eq!(results.len(), 3, "one entry per requested index");
    assert_eq!(results.get("p1"), Some(columns(1, 2).as_slice()));
    // f1 row 0 of "two" only holds even columns, f2 only odd ones
    assert_eq!(results.get("two"), Some(&[][..]));
    assert_eq!(results.get("p3"), Some(columns(3, 6).as_slice()));
    assert!(results.get("p4").is_none(), "unrequested index absent");
}

#[tokio::test]
async fn or_unions_includes() {
    let coordinator = coordinator(populated(), 2);
    // p4 is index 3: row 0 of f1 is every 4th column, row 1 every 5th
    let req = request(&["p4"], vec![Row::new(0, "f1"), Row::new(1, "f1")], vec![], Conjunction::Or);
    let results = coordinator.execute(req).await.unwrap();
    let mut expected: Vec<u64> = columns(0, 4).into_iter().chain(columns(0, 5)).collect();
    expected.sort_unstable();
    expected.dedup();
    assert_eq!(results.get("p4"), Some(expected.as_slice()));
}

#[tokio::test]
async fn excludes_are_subtracted_in_order() {
    let coordinator = coordinator(populated(), 2);
    // p1: f1 row 0 is every column, row 1 every 2nd, row 2 every 3rd
    let req = request(
        &["p1"],
        vec![Row::new(0, "f1")],
        vec![Row::new(1, "f1"), Row::new(2, "f1"), Row::new(2, "f1")],
        Conjunction::And,
    );
    let results = coordinator.execute(req).await.unwrap();
    let expected: Vec<u64> = (0..100).filter(|c| c % 2 != 0 && c % 3 != 0).collect();
    assert_eq!(results.get("p1"), Some(expected.as_slice()), "repeated exclude is idempotent");
}

#[tokio::test]
async fn exclude_drops_only_present_columns() {
    let engine = populated();
    engine.set_bit("p1", "f1", 5, 5).unwrap();
    engine.set_bit("p1", "f1", 5, 1000).unwrap();
    let coordinator = coordinator(engine, 2);
    let req = request(
        &["p1", "p3"],
        vec![Row::new(0, "f1"), Row::new(0, "f2")],
        vec![Row::new(5, "f1")],
        Conjunction::And,
    );
    let results = coordinator.execute(req).await.unwrap();
    let p1: Vec<u64> = columns(1, 2).into_iter().filter(|&c| c != 5).collect();
    assert_eq!(results.get("p1"), Some(p1.as_slice()));
    assert_eq!(results.get("p3"), Some(columns(3, 6).as_slice()));
}

#[tokio::test]
async fn indexes_are_independent() {
    let coordinator = coordinator(populated(), 3);
    let includes = vec![Row::new(1, "f1"), Row::new(2, "f2")];
    let excludes = vec![Row::new(4, "f1")];
    let both = coordinator
        .execute(request(&["p1", "p3"], includes.clone(), excludes.clone(), Conjunction::Or))
        .await
        .unwrap();
    for idx in ["p1", "p3"] {
        let alone = coordinator
            .execute(request(&[idx], includes.clone(), excludes.clone(), Conjunction::Or))
            .await
            .unwrap();
        assert_eq!(both.get(idx), alone.get(idx), "{idx} differs when queried alone");
    }
}

#[tokio::test]
async fn duplicate_index_yields_one_entry() {
    let coordinator = coordinator(populated(), 2);
    let req = request(&["p1", "p1", "p3", "p1"], vec![Row::new(0, "f2")], vec![], Conjunction::And);
    let results = coordinator.execute(req).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.get("p1"), Some(columns(1, 2).as_slice()));
}

#[tokio::test]
async fn zero_includes_match_nothing() {
    let coordinator = coordinator(populated(), 2);
    for conjunction in [Conjunction::And, Conjunction::Or] {
        let results = coordinator
            .execute(request(&["p1", "p3"], vec![], vec![Row::new(1, "f1")], conjunction))
            .await
            .unwrap();
        assert_eq!(results.get("p1"), Some(&[][..]), "{conjunction} of no rows");
        assert_eq!(results.get("p3"), Some(&[][..]), "{conjunction} of no rows");
    }
}

#[tokio::test]
async fn zero_includes_never_reach_the_engine() {
    // this engine would answer with columns if it were asked
    let engine = Scripted::new(&[("p1", Answer::Bits(vec![1, 2, 3])), ("p3", Answer::Bits(vec![4]))]);
    let coordinator = coordinator(engine, 2);
    for conjunction in [Conjunction::And, Conjunction::Or] {
        let results = coordinator
            .execute(request(&["p1", "p3"], vec![], vec![Row::new(0, "f2")], conjunction))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results.get("p1"), Some(&[][..]));
        assert_eq!(results.get("p3"), Some(&[][..]));
    }
    assert_eq!(coordinator.engine().completed.load(Ordering::SeqCst), 0);

    // excludes are still checked against the schema
    let err = coordinator
        .execute(request(&["p1"], vec![], vec![Row::new(0, "f9")], Conjunction::And))
        .await
        .unwrap_err();
    assert!(matches!(err, MindyError::UnknownCategory { .. }));
}

#[tokio::test]
async fn engine_order_is_kept() {
    let engine = Scripted::new(&[("p1", Answer::Bits(vec![9, 3, 7])), ("p3", Answer::Bits(vec![2, 1]))]);
    let coordinator = coordinator(engine, 1);
    let results = coordinator
        .execute(request(&["p1", "p3"], vec![Row::new(0, "f1")], vec![], Conjunction::And))
        .await
        .unwrap();
    assert_eq!(results.get("p1"), Some(&[9, 3, 7][..]));
    assert_eq!(results.get("p3"), Some(&[2, 1][..]));
}

#[tokio::test]
async fn empty_index_list_is_an_empty_response() {
    let coordinator = coordinator(populated(), 2);
    let results = coordinator
        .execute(request(&[], vec![Row::new(0, "f1")], vec![], Conjunction::And))
        .await
        .unwrap();
    assert!(results.is_empty());
}
