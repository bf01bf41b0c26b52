use std::collections::HashSet;
use std::time::Duration;

use tonic::Code;
use user_management::proto::CreateUserReq;
use user_management::proto::DeleteUserReq;
use user_management::proto::GetUserReq;
use user_management::proto::ListUsersReq;
use user_management::proto::UpdateUserReq;
use user_management::UserServiceConfig;

use crate::common::assert_quiet;
use crate::common::create;
use crate::common::next_action;
use crate::common::user;
use crate::common::TestService;

#[tokio::test]
async fn test_subscriber_observes_crud_lifecycle_in_order() {
    let service = TestService::start(UserServiceConfig::default()).await;
    let mut subscriber = service.subscriber().await;
    let mut client = service.client().await;

    let created = create(&mut client, "a@a.com").await;
    let key = created.id.clone();
    client
        .get_user(GetUserReq {
            user_id: "a@a.com".into(),
        })
        .await
        .unwrap();
    client
        .get_user(GetUserReq {
            user_id: key.clone(),
        })
        .await
        .unwrap();
    client
        .delete_user(DeleteUserReq {
            user_id: key.clone(),
        })
        .await
        .unwrap();

    assert_eq!(
        next_action(&mut subscriber).await,
        "User action performed: a@a.com - Created"
    );
    assert_eq!(
        next_action(&mut subscriber).await,
        "User action performed: a@a.com - Retrieved"
    );
    assert_eq!(
        next_action(&mut subscriber).await,
        format!("User action performed: {key} - Retrieved")
    );
    assert_eq!(
        next_action(&mut subscriber).await,
        format!("User action performed: {key} - Deleted")
    );

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_requests_and_lists_publish_nothing() {
    let service = TestService::start(UserServiceConfig::default()).await;
    let mut subscriber = service.subscriber().await;
    let mut client = service.client().await;

    let status = client
        .update_user(UpdateUserReq {
            user_id: "65a1f0c2b3d4e5f601234567".into(),
            user: Some(user("x@x.com")),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);

    let status = client
        .create_user(CreateUserReq {
            user: Some(user("bad")),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    client
        .list_users(ListUsersReq { filter: None })
        .await
        .unwrap();

    assert_quiet(&mut subscriber, Duration::from_millis(300)).await;
    assert_eq!(service.node.notification_channel().pending(), 0);

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_read_notifications_can_be_disabled() {
    let mut config = UserServiceConfig::default();
    config.notification.notify_reads = false;
    let service = TestService::start(config).await;
    let mut subscriber = service.subscriber().await;
    let mut client = service.client().await;

    create(&mut client, "a@a.com").await;
    client
        .get_user(GetUserReq {
            user_id: "a@a.com".into(),
        })
        .await
        .unwrap();
    client
        .delete_user(DeleteUserReq {
            user_id: "a@a.com".into(),
        })
        .await
        .unwrap();

    assert_eq!(
        next_action(&mut subscriber).await,
        "User action performed: a@a.com - Created"
    );
    assert_eq!(
        next_action(&mut subscriber).await,
        "User action performed: a@a.com - Deleted"
    );

    service.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_subscribers_share_events_without_duplicates() {
    const USERS: usize = 10;
    let service = TestService::start(UserServiceConfig::default()).await;
    let mut first = service.subscriber().await;
    let mut second = service.subscriber().await;
    let mut client = service.client().await;

    for n in 0..USERS {
        create(&mut client, &format!("user{n}@example.com")).await;
    }

    let mut received = Vec::new();
    for subscriber in [&mut first, &mut second] {
        while let Ok(Ok(Some(action))) =
            tokio::time::timeout(Duration::from_millis(500), subscriber.next_action()).await
        {
            received.push(action);
        }
    }
    let unique: HashSet<_> = received.iter().cloned().collect();

    assert_eq!(received.len(), USERS);
    assert_eq!(unique.len(), USERS);

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_departed_subscriber_does_not_affect_writes() {
    let service = TestService::start(UserServiceConfig::default()).await;
    let channel = service.node.notification_channel().clone();
    let subscriber = service.subscriber().await;
    assert_eq!(channel.subscribers(), 1);
    drop(subscriber);
    tokio::time::timeout(Duration::from_secs(3), async {
        while channel.subscribers() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("handler should notice the disconnect");

    let mut client = service.client().await;
    create(&mut client, "a@a.com").await;
    client
        .delete_user(DeleteUserReq {
            user_id: "a@a.com".into(),
        })
        .await
        .unwrap();

    // Nobody is listening, so nothing is kept for later
    assert_eq!(channel.pending(), 0);

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_late_subscriber_receives_no_history() {
    let service = TestService::start(UserServiceConfig::default()).await;
    let mut client = service.client().await;

    create(&mut client, "early@a.com").await;

    let mut late = service.subscriber().await;
    assert_quiet(&mut late, Duration::from_millis(300)).await;

    create(&mut client, "late@a.com").await;
    assert_eq!(
        next_action(&mut late).await,
        "User action performed: late@a.com - Created"
    );
    assert_quiet(&mut late, Duration::from_millis(300)).await;

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_ends_streams_without_error() {
    let service = TestService::start(UserServiceConfig::default()).await;
    let mut subscriber = service.subscriber().await;
    let channel = service.node.notification_channel().clone();

    service.shutdown().await.unwrap();

    assert!(channel.is_closed());
    let end = tokio::time::timeout(Duration::from_secs(3), subscriber.next_action())
        .await
        .expect("stream should end");
    assert!(matches!(end, Ok(None)));
}
