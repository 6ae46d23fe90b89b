use miniredis::commands::CommandResult;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_exec_returns_results_in_order() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["MULTI"], TestUtils::ok()),
            (vec!["SET", "a", "1"], TestUtils::simple("QUEUED")),
            (vec!["SET", "b", "2"], TestUtils::simple("QUEUED")),
            (vec!["INCR", "a"], TestUtils::simple("QUEUED")),
        ],
    )
    .await;

    // Nothing runs before EXEC.
    env.with_database(0, |db| assert!(db.is_empty())).await;

    env.exec_expect(
        &mut client,
        &["EXEC"],
        TestUtils::array(vec![TestUtils::ok(), TestUtils::ok(), TestUtils::integer(2)]),
    )
    .await;

    assert!(!client.state.in_transaction());
    env.exec_expect(&mut client, &["GET", "b"], TestUtils::bulk("2"))
        .await;
}

#[tokio::test]
async fn test_tainted_transaction_applies_nothing() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["MULTI"], TestUtils::ok()),
            (vec!["SET", "a", "1"], TestUtils::simple("QUEUED")),
            (vec!["SET", "b"], TestUtils::wrong_arguments("set")),
            (vec!["SET", "c", "3"], TestUtils::simple("QUEUED")),
            (
                vec!["EXEC"],
                TestUtils::error("EXECABORT Transaction discarded because of previous errors."),
            ),
            (vec!["DBSIZE"], TestUtils::integer(0)),
        ],
    )
    .await;

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["MULTI"], TestUtils::ok()),
            (
                vec!["BOGUS"],
                TestUtils::error("ERR unknown command 'BOGUS', with args beginning with: "),
            ),
            (vec!["SET", "a", "1"], TestUtils::simple("QUEUED")),
            (
                vec!["EXEC"],
                TestUtils::error("EXECABORT Transaction discarded because of previous errors."),
            ),
            (vec!["EXISTS", "a"], TestUtils::integer(0)),
        ],
    )
    .await;
}

#[tokio::test]
async fn test_runtime_errors_do_not_stop_exec() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["MULTI"], TestUtils::ok()),
            (vec!["SET", "s", "x"], TestUtils::simple("QUEUED")),
            (vec!["LPUSH", "s", "y"], TestUtils::simple("QUEUED")),
            (vec!["GET", "s"], TestUtils::simple("QUEUED")),
            (
                vec!["EXEC"],
                TestUtils::array(vec![
                    TestUtils::ok(),
                    TestUtils::wrong_type(),
                    TestUtils::bulk("x"),
                ]),
            ),
        ],
    )
    .await;
}

#[tokio::test]
async fn test_transaction_state_errors() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["EXEC"], TestUtils::error("ERR EXEC without MULTI")),
            (vec!["DISCARD"], TestUtils::error("ERR DISCARD without MULTI")),
            (vec!["MULTI"], TestUtils::ok()),
            (vec!["MULTI"], TestUtils::error("ERR MULTI calls can not be nested")),
            (vec!["SET", "a", "1"], TestUtils::simple("QUEUED")),
            (vec!["DISCARD"], TestUtils::ok()),
            (vec!["EXISTS", "a"], TestUtils::integer(0)),
            (vec!["EXEC"], TestUtils::error("ERR EXEC without MULTI")),
        ],
    )
    .await;
}

#[tokio::test]
async fn test_subscribe_inside_multi_taints() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["MULTI"], TestUtils::ok()),
            (
                vec!["SUBSCRIBE", "news"],
                TestUtils::error("ERR Command not allowed inside a transaction"),
            ),
            (
                vec!["EXEC"],
                TestUtils::error("EXECABORT Transaction discarded because of previous errors."),
            ),
        ],
    )
    .await;

    assert!(!client.state.is_subscribed());
}

#[tokio::test]
async fn test_queued_commands_see_latest_state() {
    let mut env = TestEnv::new();
    let mut first = env.client();
    let mut second = env.client();

    env.exec_sequence(
        &mut first,
        vec![
            (vec!["MULTI"], TestUtils::ok()),
            (vec!["INCR", "counter"], TestUtils::simple("QUEUED")),
            (vec!["GET", "counter"], TestUtils::simple("QUEUED")),
        ],
    )
    .await;

    env.exec_expect(&mut second, &["SET", "counter", "10"], TestUtils::ok())
        .await;

    env.exec_expect(
        &mut first,
        &["EXEC"],
        TestUtils::array(vec![TestUtils::integer(11), TestUtils::bulk("11")]),
    )
    .await;
}

#[tokio::test]
async fn test_quit_drops_transaction() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_expect(&mut client, &["MULTI"], TestUtils::ok()).await;
    env.exec_expect(&mut client, &["SET", "a", "1"], TestUtils::simple("QUEUED"))
        .await;

    assert_eq!(
        env.exec(&mut client, &["QUIT"]).await,
        CommandResult::Close(TestUtils::ok())
    );
    assert!(!client.state.in_transaction());
    env.with_database(0, |db| assert!(!db.contains(b"a"))).await;
}
