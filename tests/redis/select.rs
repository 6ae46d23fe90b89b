use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_databases_are_independent() {
    let mut env = TestEnv::new();
    let mut first = env.client();
    let mut second = env.client();

    env.exec_sequence(
        &mut first,
        vec![
            (vec!["SET", "k", "zero"], TestUtils::ok()),
            (vec!["SELECT", "3"], TestUtils::ok()),
            (vec!["GET", "k"], TestUtils::nil()),
            (vec!["SET", "k", "three"], TestUtils::ok()),
        ],
    )
    .await;

    // Selection is per connection.
    env.exec_expect(&mut second, &["GET", "k"], TestUtils::bulk("zero"))
        .await;

    env.exec_sequence(
        &mut first,
        vec![
            (vec!["MOVE", "k", "0"], TestUtils::integer(0)),
            (vec!["SET", "other", "v"], TestUtils::ok()),
            (vec!["MOVE", "other", "0"], TestUtils::integer(1)),
            (vec!["EXISTS", "other"], TestUtils::integer(0)),
            (
                vec!["MOVE", "k", "3"],
                TestUtils::error("ERR source and destination objects are the same"),
            ),
            (
                vec!["MOVE", "k", "16"],
                TestUtils::error("ERR DB index is out of range"),
            ),
        ],
    )
    .await;

    env.exec_expect(&mut second, &["GET", "other"], TestUtils::bulk("v"))
        .await;
}

#[tokio::test]
async fn test_select_invalid_index() {
    let mut env = TestEnv::with_databases(2);
    let mut client = env.client();

    let test_cases = vec![
        (vec!["SELECT", "2"], TestUtils::error("ERR DB index is out of range")),
        (vec!["SELECT", "-1"], TestUtils::error("ERR DB index is out of range")),
        (
            vec!["SELECT", "one"],
            TestUtils::error("ERR value is not an integer or out of range"),
        ),
        (vec!["SELECT", "1"], TestUtils::ok()),
    ];

    env.exec_sequence(&mut client, test_cases).await;
    assert_eq!(client.state.db_index, 1);
}

#[tokio::test]
async fn test_connection_commands() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec_sequence(
        &mut client,
        vec![
            (vec!["PING"], TestUtils::simple("PONG")),
            (vec!["ping", "hi"], TestUtils::bulk("hi")),
            (vec!["PING", "a", "b"], TestUtils::wrong_arguments("ping")),
            (vec!["ECHO", "hello world"], TestUtils::bulk("hello world")),
            (
                vec!["NOSUCH", "x", "y"],
                TestUtils::error("ERR unknown command 'NOSUCH', with args beginning with: 'x' 'y' "),
            ),
            (vec!["GET"], TestUtils::wrong_arguments("get")),
        ],
    )
    .await;

    let result = env.exec(&mut client, &["QUIT"]).await;
    assert_eq!(
        result,
        miniredis::commands::CommandResult::Close(TestUtils::ok())
    );
}
