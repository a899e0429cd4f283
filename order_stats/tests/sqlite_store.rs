mod common;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use diesel::connection::SimpleConnection;
use order_stats::{
    models::NewOrder,
    status::OrderStatus,
    store::{RecordStore, StoreError},
    tz::parse_tz,
    window::Window,
};
use rust_decimal::Decimal;

#[test]
fn pragmas_are_applied() {
    let (db, _store) = common::setup_store();
    let mut conn = db.connect();
    common::assert_sqlite_pragmas(&mut conn);
}

#[tokio::test]
async fn insert_defaults_to_pending_and_canonicalizes_synonyms() {
    let (_db, store) = common::setup_store();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

    store
        .insert_order(NewOrder {
            id: "o-1".into(),
            price: Decimal::new(12_950, 3),
            status: None,
            created_at: at,
        })
        .await
        .unwrap();
    store.insert_order(common::order("o-2", 500, "Payée", at)).await.unwrap();

    let o1 = store.get("o-1").await.unwrap().unwrap();
    assert_eq!(o1.status, "Pending");
    assert_eq!(o1.price, Decimal::new(12_950, 3));
    assert_eq!(o1.created_at, at);
    assert_eq!(store.get("o-2").await.unwrap().unwrap().status, "Delivered");
    assert!(store.get("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn insert_many_is_all_or_nothing() {
    let (_db, store) = common::setup_store();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

    store.insert_order(common::order("dup", 100, "Pending", at)).await.unwrap();
    let err = store
        .insert_many(vec![
            common::order("fresh", 100, "Pending", at),
            common::order("dup", 100, "Pending", at),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Query(_)), "{err:?}");
    assert!(!err.is_retryable());
    assert!(store.get("fresh").await.unwrap().is_none());

    let err = store
        .insert_many(vec![common::order("x", 100, "Lost at sea", at)])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[tokio::test]
async fn update_status_keeps_created_at() {
    let (_db, store) = common::setup_store();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let later = at + Duration::days(2);

    store.insert_order(common::order("o", 100, "Pending", at)).await.unwrap();
    store.update_status("o", OrderStatus::Delivered, later).await.unwrap();

    let o = store.get("o").await.unwrap().unwrap();
    assert_eq!(o.status, "Delivered");
    assert_eq!(o.created_at, at);
    assert_eq!(o.updated_at, later);

    let err = store
        .update_status("ghost", OrderStatus::Shipped, later)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == "ghost"));
}

#[tokio::test]
async fn window_totals_are_exact_and_inclusive() {
    let (_db, store) = common::setup_store();
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let end = start + Duration::hours(1);

    store
        .insert_many(vec![
            common::order("before", 1, "Pending", start - Duration::milliseconds(1)),
            common::order("lo", 10, "Pending", start),
            common::order("mid", 20, "Pending", start + Duration::minutes(30)),
            common::order("hi", 30, "Pending", end),
            common::order("after", 1, "Pending", end + Duration::milliseconds(1)),
        ])
        .await
        .unwrap();

    let t = store.window_totals(Window::closed(start, end)).await.unwrap();
    assert_eq!(t.count, 3);
    assert_eq!(t.revenue_sum, Decimal::new(60, 2));

    let all = store.window_totals(Window::until(end)).await.unwrap();
    assert_eq!(all.count, 4);
}

#[tokio::test]
async fn status_groups_carry_raw_labels() {
    let (db, store) = common::setup_store();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    store.insert_order(common::order("a", 100, "Pending", at)).await.unwrap();

    // legacy label written by another client
    db.connect()
        .batch_execute(
            "INSERT INTO orders (id, price, status, created_at, updated_at) \
             VALUES ('b', '5.00', 'Retour', '2024-05-01T10:00:00.000Z', '2024-05-01T10:00:00.000Z')",
        )
        .unwrap();

    let groups = store.status_groups().await.unwrap();
    let labels: Vec<_> = groups.iter().map(|g| (g.status.as_str(), g.sample_id.as_str())).collect();
    assert_eq!(labels, [("Pending", "a"), ("Retour", "b")]);
}

#[tokio::test]
async fn orders_on_day_uses_local_midnights() {
    let (_db, store) = common::setup_store();
    let tunis = parse_tz("Africa/Tunis").unwrap();

    store
        .insert_many(vec![
            // 2024-05-14 23:59:59.999 local
            common::order("prev", 1, "Pending", Utc.with_ymd_and_hms(2024, 5, 14, 22, 59, 59).unwrap() + Duration::milliseconds(999)),
            // 2024-05-15 00:00 local
            common::order("first", 1, "Pending", Utc.with_ymd_and_hms(2024, 5, 14, 23, 0, 0).unwrap()),
            common::order("noon", 1, "Pending", Utc.with_ymd_and_hms(2024, 5, 15, 11, 0, 0).unwrap()),
            // 2024-05-16 00:00 local
            common::order("next", 1, "Pending", Utc.with_ymd_and_hms(2024, 5, 15, 23, 0, 0).unwrap()),
        ])
        .await
        .unwrap();

    let day = store
        .orders_on_day(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(), tunis)
        .await
        .unwrap();
    let ids: Vec<_> = day.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, ["noon", "first"]);
}

#[tokio::test]
async fn corrupt_rows_fail_reads_instead_of_counting_zero() {
    let (db, store) = common::setup_store();
    db.connect()
        .batch_execute(
            "INSERT INTO orders (id, price, status, created_at, updated_at) \
             VALUES ('bad', 'abc', 'Pending', '2024-05-01T10:00:00.000Z', '2024-05-01T10:00:00.000Z')",
        )
        .unwrap();

    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let err = store.window_totals(Window::until(now)).await.unwrap_err();
    assert!(matches!(err, StoreError::CorruptRow { ref id, .. } if id == "bad"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn offset_timestamps_are_corrupt_not_miscounted() {
    let (db, store) = common::setup_store();
    // 2024-04-30T23:59Z written with an offset by some other client
    db.connect()
        .batch_execute(
            "INSERT INTO orders (id, price, status, created_at, updated_at) \
             VALUES ('offset', '1.00', 'Pending', '2024-05-01T00:59:00+01:00', '2024-05-01T00:59:00+01:00')",
        )
        .unwrap();

    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let err = store.window_totals(Window::closed(start, end)).await.unwrap_err();
    assert!(matches!(err, StoreError::CorruptRow { ref id, .. } if id == "offset"), "{err:?}");

    // the category read touches every row, so the dashboard cannot skip it either
    let err = store.status_groups().await.unwrap_err();
    assert!(matches!(err, StoreError::CorruptRow { ref id, .. } if id == "offset"), "{err:?}");
}

#[tokio::test]
async fn delete_order_removes_it_from_the_categories() {
    let (_db, store) = common::setup_store();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    store
        .insert_many(vec![
            common::order("keep", 1_000, "Delivered", at),
            common::order("drop", 2_500, "Delivered", at),
        ])
        .await
        .unwrap();

    store.delete_order("drop").await.unwrap();
    assert!(store.get("drop").await.unwrap().is_none());

    let groups = store.status_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].count, 1);
    assert_eq!(groups[0].cash_sum, Decimal::new(1_000, 2));
    assert_eq!(store.window_totals(Window::until(at)).await.unwrap().count, 1);

    let err = store.delete_order("drop").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == "drop"));
}

#[tokio::test]
async fn overflowing_prices_are_not_retryable() {
    let (_db, store) = common::setup_store();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let huge = |id: &str| NewOrder {
        id: id.into(),
        price: Decimal::MAX,
        status: None,
        created_at: at,
    };
    store.insert_many(vec![huge("a"), huge("b")]).await.unwrap();

    let err = store.window_totals(Window::until(at)).await.unwrap_err();
    assert!(matches!(err, StoreError::Overflow(_)), "{err:?}");
    assert!(!err.is_retryable());
}
