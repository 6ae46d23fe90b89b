use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_membership() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["SADD", "s", "a", "b", "a"], TestUtils::integer(2)),
            (vec!["SADD", "s", "b", "c"], TestUtils::integer(1)),
            (vec!["SCARD", "s"], TestUtils::integer(3)),
            (vec!["SISMEMBER", "s", "a"], TestUtils::integer(1)),
            (vec!["SISMEMBER", "s", "z"], TestUtils::integer(0)),
            (vec!["SREM", "s", "a", "z"], TestUtils::integer(1)),
            (vec!["SCARD", "missing"], TestUtils::integer(0)),
        ],
    )
    .await;

    let members = TestUtils::sorted(env.reply(&mut client, &["SMEMBERS", "s"]).await);
    assert_eq!(members, TestUtils::bulk_array(&["b", "c"]));

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["SREM", "s", "b", "c"], TestUtils::integer(2)),
            (vec!["EXISTS", "s"], TestUtils::integer(0)),
            (vec!["SMEMBERS", "s"], TestUtils::bulk_array(&[])),
        ],
    )
    .await;
}

#[tokio::test]
async fn test_set_algebra() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_expect(&mut client, &["SADD", "a", "1", "2", "3"], TestUtils::integer(3))
        .await;
    env.exec_expect(&mut client, &["SADD", "b", "2", "3", "4"], TestUtils::integer(3))
        .await;

    let test_cases = vec![
        (vec!["SUNION", "a", "b"], vec!["1", "2", "3", "4"]),
        (vec!["SINTER", "a", "b"], vec!["2", "3"]),
        (vec!["SDIFF", "a", "b"], vec!["1"]),
        (vec!["SDIFF", "b", "a", "missing"], vec!["4"]),
        (vec!["SINTER", "a", "missing"], vec![]),
        (vec!["SUNION", "missing", "a"], vec!["1", "2", "3"]),
    ];

    for (command, expected) in test_cases {
        let reply = TestUtils::sorted(env.reply(&mut client, &command).await);
        assert_eq!(reply, TestUtils::bulk_array(&expected), "command: {:?}", command);
    }

    env.exec_expect(&mut client, &["SET", "str", "x"], TestUtils::ok())
        .await;
    env.exec_expect(&mut client, &["SUNION", "a", "str"], TestUtils::wrong_type())
        .await;
}
