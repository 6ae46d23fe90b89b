use std::time::Duration;

use bytes::Bytes;
use miniredis::key_value_store::DataType;
use tokio::time::{advance, Instant};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test(start_paused = true)]
async fn test_expired_key_is_gone_without_sweep() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["SET", "temp", "v", "PX", "100"], TestUtils::ok()),
            (vec!["SET", "kept", "v"], TestUtils::ok()),
            (vec!["GET", "temp"], TestUtils::bulk("v")),
        ],
    )
    .await;

    advance(Duration::from_millis(100)).await;

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["GET", "temp"], TestUtils::nil()),
            (vec!["EXISTS", "temp"], TestUtils::integer(0)),
            (vec!["KEYS", "*"], TestUtils::bulk_array(&["kept"])),
            (vec!["DBSIZE"], TestUtils::integer(1)),
            (vec!["TTL", "temp"], TestUtils::integer(-2)),
        ],
    )
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_ttl_family() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["SET", "k", "v"], TestUtils::ok()),
            (vec!["TTL", "k"], TestUtils::integer(-1)),
            (vec!["TTL", "missing"], TestUtils::integer(-2)),
            (vec!["EXPIRE", "k", "10"], TestUtils::integer(1)),
            (vec!["EXPIRE", "missing", "10"], TestUtils::integer(0)),
            (vec!["TTL", "k"], TestUtils::integer(10)),
            (vec!["PTTL", "k"], TestUtils::integer(10_000)),
        ],
    )
    .await;

    advance(Duration::from_millis(2_600)).await;

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["TTL", "k"], TestUtils::integer(7)),
            (vec!["PTTL", "k"], TestUtils::integer(7_400)),
            (vec!["PERSIST", "k"], TestUtils::integer(1)),
            (vec!["PERSIST", "k"], TestUtils::integer(0)),
            (vec!["TTL", "k"], TestUtils::integer(-1)),
            (vec!["PEXPIRE", "k", "500"], TestUtils::integer(1)),
            (vec!["TTL", "k"], TestUtils::integer(1)),
            (
                vec!["EXPIRE", "k", "soon"],
                TestUtils::error("ERR value is not an integer or out of range"),
            ),
        ],
    )
    .await;

    advance(Duration::from_millis(500)).await;
    env.exec_expect(&mut client, &["EXISTS", "k"], TestUtils::integer(0))
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_non_positive_timeout_deletes_key() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["SET", "a", "v"], TestUtils::ok()),
            (vec!["EXPIRE", "a", "0"], TestUtils::integer(1)),
            (vec!["EXISTS", "a"], TestUtils::integer(0)),
            (vec!["SET", "b", "v"], TestUtils::ok()),
            (vec!["EXPIREAT", "b", "1"], TestUtils::integer(1)),
            (vec!["EXISTS", "b"], TestUtils::integer(0)),
        ],
    )
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_overwrite_clears_deadline_unless_keepttl() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["SET", "k", "v", "EX", "5"], TestUtils::ok()),
            (vec!["SET", "k", "w", "KEEPTTL"], TestUtils::ok()),
            (vec!["TTL", "k"], TestUtils::integer(5)),
            (vec!["APPEND", "k", "x"], TestUtils::integer(2)),
            (vec!["INCR", "n"], TestUtils::integer(1)),
            (vec!["TTL", "k"], TestUtils::integer(5)),
            (vec!["SET", "k", "plain"], TestUtils::ok()),
            (vec!["TTL", "k"], TestUtils::integer(-1)),
        ],
    )
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_fixture_seeded_deadline() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.with_database(0, |db| {
        db.insert_with_expiration(
            "seeded",
            DataType::String(Bytes::from("v")),
            Instant::now() + Duration::from_secs(1),
        );
    })
    .await;

    env.exec_expect(&mut client, &["GET", "seeded"], TestUtils::bulk("v"))
        .await;
    advance(Duration::from_secs(1)).await;
    env.exec_expect(&mut client, &["GET", "seeded"], TestUtils::nil())
        .await;
}
