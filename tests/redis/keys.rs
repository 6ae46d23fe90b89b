use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_exists_del_and_type() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["SET", "s", "v"], TestUtils::ok()),
            (vec!["RPUSH", "l", "x"], TestUtils::integer(1)),
            (vec!["HSET", "h", "f", "v"], TestUtils::integer(1)),
            (vec!["SADD", "set", "m"], TestUtils::integer(1)),
            (vec!["ZADD", "z", "1", "m"], TestUtils::integer(1)),
            (vec!["TYPE", "s"], TestUtils::simple("string")),
            (vec!["TYPE", "l"], TestUtils::simple("list")),
            (vec!["TYPE", "h"], TestUtils::simple("hash")),
            (vec!["TYPE", "set"], TestUtils::simple("set")),
            (vec!["TYPE", "z"], TestUtils::simple("zset")),
            (vec!["TYPE", "missing"], TestUtils::simple("none")),
            (vec!["EXISTS", "s", "l", "missing", "s"], TestUtils::integer(3)),
            (vec!["DBSIZE"], TestUtils::integer(5)),
            (vec!["DEL", "s", "l", "missing"], TestUtils::integer(2)),
            (vec!["DBSIZE"], TestUtils::integer(3)),
        ],
    )
    .await;
}

#[tokio::test]
async fn test_keys_pattern() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_expect(
        &mut client,
        &["MSET", "hello", "1", "hallo", "2", "hxllo", "3", "world", "4"],
        TestUtils::ok(),
    )
    .await;

    let test_cases = vec![
        ("h?llo", vec!["hallo", "hello", "hxllo"]),
        ("h[ae]llo", vec!["hallo", "hello"]),
        ("h[^e]llo", vec!["hallo", "hxllo"]),
        ("*o*", vec!["hallo", "hello", "hxllo", "world"]),
        ("w*", vec!["world"]),
        ("nothing*", vec![]),
    ];

    for (pattern, expected) in test_cases {
        let reply = TestUtils::sorted(env.reply(&mut client, &["KEYS", pattern]).await);
        assert_eq!(reply, TestUtils::bulk_array(&expected), "pattern: {}", pattern);
    }
}

#[tokio::test]
async fn test_rename() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["SET", "a", "1"], TestUtils::ok()),
            (vec!["SET", "b", "2"], TestUtils::ok()),
            (vec!["RENAME", "a", "c"], TestUtils::ok()),
            (vec!["GET", "c"], TestUtils::bulk("1")),
            (vec!["EXISTS", "a"], TestUtils::integer(0)),
            (vec!["RENAMENX", "c", "b"], TestUtils::integer(0)),
            (vec!["RENAMENX", "c", "d"], TestUtils::integer(1)),
            (vec!["RENAME", "d", "b"], TestUtils::ok()),
            (vec!["GET", "b"], TestUtils::bulk("1")),
            (vec!["RENAME", "missing", "x"], TestUtils::error("ERR no such key")),
            (vec!["RENAMENX", "missing", "x"], TestUtils::error("ERR no such key")),
        ],
    )
    .await;
}

#[tokio::test]
async fn test_flush_and_randomkey() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["RANDOMKEY"], TestUtils::nil()),
            (vec!["SET", "only", "v"], TestUtils::ok()),
            (vec!["RANDOMKEY"], TestUtils::bulk("only")),
            (vec!["SELECT", "1"], TestUtils::ok()),
            (vec!["SET", "other", "v"], TestUtils::ok()),
            (vec!["FLUSHDB"], TestUtils::ok()),
            (vec!["DBSIZE"], TestUtils::integer(0)),
            (vec!["SELECT", "0"], TestUtils::ok()),
            (vec!["DBSIZE"], TestUtils::integer(1)),
            (vec!["FLUSHALL", "ASYNC"], TestUtils::ok()),
            (vec!["DBSIZE"], TestUtils::integer(0)),
            (vec!["FLUSHALL", "LATER"], TestUtils::error("ERR syntax error")),
        ],
    )
    .await;
}
