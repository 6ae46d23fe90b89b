use miniredis::{commands::CommandResult, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils};

fn confirmation(kind: &str, name: Option<&str>, count: i64) -> RespValue {
    TestUtils::array(vec![
        TestUtils::bulk(kind),
        name.map_or(TestUtils::nil(), TestUtils::bulk),
        TestUtils::integer(count),
    ])
}

#[tokio::test]
async fn test_publish_reaches_channel_and_pattern_subscribers() {
    let mut env = TestEnv::new();
    let mut first = env.client();
    let mut second = env.client();
    let mut pattern = env.client();
    let mut publisher = env.client();

    assert_eq!(
        env.exec(&mut first, &["SUBSCRIBE", "ch"]).await,
        CommandResult::Replies(vec![confirmation("subscribe", Some("ch"), 1)])
    );
    env.exec(&mut second, &["SUBSCRIBE", "ch"]).await;
    assert_eq!(
        env.exec(&mut pattern, &["PSUBSCRIBE", "c*"]).await,
        CommandResult::Replies(vec![confirmation("psubscribe", Some("c*"), 1)])
    );

    env.exec_expect(&mut publisher, &["PUBLISH", "ch", "hello"], TestUtils::integer(3))
        .await;

    let message = TestUtils::bulk_array(&["message", "ch", "hello"]);
    assert_eq!(first.next_push(), Some(message.clone()));
    assert_eq!(second.next_push(), Some(message));
    assert_eq!(
        pattern.next_push(),
        Some(TestUtils::bulk_array(&["pmessage", "c*", "ch", "hello"]))
    );
    assert_eq!(publisher.next_push(), None);

    env.exec_expect(&mut publisher, &["PUBLISH", "other", "x"], TestUtils::integer(0))
        .await;
    assert_eq!(pattern.next_push(), None);
}

#[tokio::test]
async fn test_subscription_counts_and_unsubscribe() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    assert_eq!(
        env.exec(&mut client, &["SUBSCRIBE", "a", "b", "a"]).await,
        CommandResult::Replies(vec![
            confirmation("subscribe", Some("a"), 1),
            confirmation("subscribe", Some("b"), 2),
            confirmation("subscribe", Some("a"), 2),
        ])
    );
    assert_eq!(
        env.exec(&mut client, &["PSUBSCRIBE", "n*"]).await,
        CommandResult::Replies(vec![confirmation("psubscribe", Some("n*"), 3)])
    );
    assert_eq!(
        env.exec(&mut client, &["UNSUBSCRIBE", "a"]).await,
        CommandResult::Replies(vec![confirmation("unsubscribe", Some("a"), 2)])
    );

    let CommandResult::Replies(replies) = env.exec(&mut client, &["UNSUBSCRIBE"]).await else {
        panic!("expected one reply per channel");
    };
    assert_eq!(replies, vec![confirmation("unsubscribe", Some("b"), 1)]);

    assert_eq!(
        env.exec(&mut client, &["PUNSUBSCRIBE"]).await,
        CommandResult::Replies(vec![confirmation("punsubscribe", Some("n*"), 0)])
    );
    assert_eq!(
        env.exec(&mut client, &["PUNSUBSCRIBE"]).await,
        CommandResult::Replies(vec![confirmation("punsubscribe", None, 0)])
    );

    // Back to normal mode.
    env.exec_expect(&mut client, &["SET", "k", "v"], TestUtils::ok())
        .await;
}

#[tokio::test]
async fn test_subscribed_mode_restrictions() {
    let mut env = TestEnv::new();
    let mut client = env.client();

    env.exec(&mut client, &["SUBSCRIBE", "news"]).await;

    env.exec_sequence(
        &mut client,
        vec![
            (
                vec!["GET", "k"],
                TestUtils::error(
                    "ERR Can't execute 'get': only (P)SUBSCRIBE / (P)UNSUBSCRIBE / PING / QUIT are allowed in this context",
                ),
            ),
            (
                vec!["PUBLISH", "news", "x"],
                TestUtils::error(
                    "ERR Can't execute 'publish': only (P)SUBSCRIBE / (P)UNSUBSCRIBE / PING / QUIT are allowed in this context",
                ),
            ),
            (vec!["PING"], TestUtils::bulk_array(&["pong", ""])),
            (vec!["PING", "hi"], TestUtils::bulk_array(&["pong", "hi"])),
        ],
    )
    .await;
}

#[tokio::test]
async fn test_pubsub_introspection() {
    let mut env = TestEnv::new();
    let mut first = env.client();
    let mut second = env.client();
    let mut observer = env.client();

    env.exec(&mut first, &["SUBSCRIBE", "news.tech", "news.art"]).await;
    env.exec(&mut second, &["SUBSCRIBE", "news.tech", "weather"]).await;
    env.exec(&mut second, &["PSUBSCRIBE", "news.*", "w*"]).await;

    let channels = TestUtils::sorted(env.reply(&mut observer, &["PUBSUB", "CHANNELS"]).await);
    assert_eq!(
        channels,
        TestUtils::bulk_array(&["news.art", "news.tech", "weather"])
    );

    let channels = TestUtils::sorted(
        env.reply(&mut observer, &["PUBSUB", "channels", "news.*"])
            .await,
    );
    assert_eq!(channels, TestUtils::bulk_array(&["news.art", "news.tech"]));

    env.exec_sequence(
        &mut observer,
        vec![
            (
                vec!["PUBSUB", "NUMSUB", "news.tech", "missing"],
                TestUtils::array(vec![
                    TestUtils::bulk("news.tech"),
                    TestUtils::integer(2),
                    TestUtils::bulk("missing"),
                    TestUtils::integer(0),
                ]),
            ),
            (vec!["PUBSUB", "NUMPAT"], TestUtils::integer(2)),
            (
                vec!["PUBSUB", "FROB"],
                TestUtils::error("ERR unknown subcommand 'FROB'. Try PUBSUB HELP."),
            ),
        ],
    )
    .await;

    env.state.lock().await.pub_sub.remove_client(second.state.id);
    env.exec_expect(
        &mut observer,
        &["PUBSUB", "NUMSUB", "news.tech"],
        TestUtils::array(vec![TestUtils::bulk("news.tech"), TestUtils::integer(1)]),
    )
    .await;
    env.exec_expect(&mut observer, &["PUBSUB", "NUMPAT"], TestUtils::integer(0))
        .await;
}

#[tokio::test]
async fn test_multiple_matching_patterns_deliver_once_each() {
    let mut env = TestEnv::new();
    let mut subscriber = env.client();
    let mut publisher = env.client();

    env.exec(&mut subscriber, &["PSUBSCRIBE", "a*", "*b", "zzz"]).await;
    env.exec(&mut subscriber, &["SUBSCRIBE", "ab"]).await;

    env.exec_expect(&mut publisher, &["PUBLISH", "ab", "m"], TestUtils::integer(3))
        .await;

    let mut received = Vec::new();
    while let Some(push) = subscriber.next_push() {
        received.push(push);
    }
    assert_eq!(received.len(), 3);
    assert!(received.contains(&TestUtils::bulk_array(&["message", "ab", "m"])));
    assert!(received.contains(&TestUtils::bulk_array(&["pmessage", "a*", "ab", "m"])));
    assert!(received.contains(&TestUtils::bulk_array(&["pmessage", "*b", "ab", "m"])));
}
