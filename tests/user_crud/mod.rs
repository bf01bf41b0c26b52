use tonic::Code;
use user_management::proto::CreateUserReq;
use user_management::proto::DeleteUserReq;
use user_management::proto::GetUserReq;
use user_management::proto::ListUsersReq;
use user_management::proto::UpdateUserReq;
use user_management::proto::User;
use user_management::UserServiceConfig;

use crate::common::create;
use crate::common::user;
use crate::common::TestService;

#[tokio::test]
async fn test_create_and_get_by_key_or_email() {
    let service = TestService::start(UserServiceConfig::default()).await;
    let mut client = service.client().await;

    let created = create(&mut client, "a@a.com").await;
    assert_eq!(created.id.len(), 24);
    assert_eq!(created.created_at, created.updated_at);

    let by_email = client
        .get_user(GetUserReq {
            user_id: "a@a.com".into(),
        })
        .await
        .unwrap()
        .into_inner();
    let by_key = client
        .get_user(GetUserReq {
            user_id: created.id.clone(),
        })
        .await
        .unwrap()
        .into_inner();

    assert_eq!(by_email, created);
    assert_eq!(by_key, created);
    assert_eq!(by_key.user.unwrap().password, "hunter2");

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_create_rejects_invalid_and_duplicate_emails() {
    let service = TestService::start(UserServiceConfig::default()).await;
    let mut client = service.client().await;
    create(&mut client, "a@a.com").await;

    let duplicate = client
        .create_user(CreateUserReq {
            user: Some(user("a@a.com")),
        })
        .await
        .unwrap_err();
    assert_eq!(duplicate.code(), Code::AlreadyExists);

    let invalid = client
        .create_user(CreateUserReq {
            user: Some(user("not an email")),
        })
        .await
        .unwrap_err();
    assert_eq!(invalid.code(), Code::InvalidArgument);

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_update_returns_updated_record_and_keeps_email() {
    let service = TestService::start(UserServiceConfig::default()).await;
    let mut client = service.client().await;
    let created = create(&mut client, "a@a.com").await;

    let updated = client
        .update_user(UpdateUserReq {
            user_id: created.id.clone(),
            user: Some(User {
                nickname: "countess".into(),
                email: "b@b.com".into(),
                ..Default::default()
            }),
        })
        .await
        .unwrap()
        .into_inner();

    let profile = updated.user.unwrap();
    assert_eq!(profile.nickname, "countess");
    assert_eq!(profile.email, "a@a.com");
    assert_eq!(profile.first_name, "Ada");
    assert_eq!(updated.created_at, created.created_at);

    let missing = client
        .update_user(UpdateUserReq {
            user_id: "65a1f0c2b3d4e5f601234567".into(),
            user: None,
        })
        .await
        .unwrap_err();
    assert_eq!(missing.code(), Code::NotFound);

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let service = TestService::start(UserServiceConfig::default()).await;
    let mut client = service.client().await;
    let created = create(&mut client, "a@a.com").await;

    let response = client
        .delete_user(DeleteUserReq {
            user_id: created.id.clone(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(response.deleted);

    for user_id in [created.id.clone(), "a@a.com".to_string()] {
        let status = client.get_user(GetUserReq { user_id }).await.unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }

    let again = client
        .delete_user(DeleteUserReq {
            user_id: created.id.clone(),
        })
        .await
        .unwrap_err();
    assert_eq!(again.code(), Code::NotFound);

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_list_filters_by_equality() {
    let service = TestService::start(UserServiceConfig::default()).await;
    let mut client = service.client().await;
    create(&mut client, "a@a.com").await;
    client
        .create_user(CreateUserReq {
            user: Some(User {
                country: "FR".into(),
                ..user("b@b.com")
            }),
        })
        .await
        .unwrap();

    let all = client
        .list_users(ListUsersReq { filter: None })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(all.users.len(), 2);

    let french = client
        .list_users(ListUsersReq {
            filter: Some(User {
                country: "FR".into(),
                ..Default::default()
            }),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(french.users.len(), 1);
    assert_eq!(french.users[0].user.as_ref().unwrap().email, "b@b.com");

    service.shutdown().await.unwrap();
}
