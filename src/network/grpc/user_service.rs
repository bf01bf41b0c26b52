//! gRPC handlers for the `UserManagement` service.
//!
//! Each CRUD handler resolves the caller's identifier, runs exactly one store
//! operation (Create runs a second, silent read-back) and, on success only,
//! publishes one notification. Publishing never fails the request.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use autometrics::autometrics;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Request;
use tonic::Response;
use tonic::Status;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::metrics::record_operation;
use crate::proto::user_management_server::UserManagement;
use crate::proto::CreateUserReq;
use crate::proto::DeleteUserReq;
use crate::proto::DeletionActionResponse;
use crate::proto::EmptyMsg;
use crate::proto::GetUserReq;
use crate::proto::ListActionResponse;
use crate::proto::ListUsersReq;
use crate::proto::UpdateUserReq;
use crate::proto::UserActionResponse;
use crate::proto::UserActionStream;
use crate::resolve;
use crate::ActionKind;
use crate::MutationEvent;
use crate::NotificationChannel;
use crate::NotificationConfig;
use crate::NotificationStreamHandler;
use crate::UserProfile;
use crate::UserStore;
use crate::API_SLO;

pub struct UserManagementService<S: UserStore> {
    store: Arc<S>,
    channel: NotificationChannel,
    config: NotificationConfig,
    next_subscriber_id: AtomicU64,
}

impl<S: UserStore> std::fmt::Debug for UserManagementService<S> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("UserManagementService")
            .field("pending_notifications", &self.channel.pending())
            .field("subscribers", &self.channel.subscribers())
            .field("notify_reads", &self.config.notify_reads)
            .finish()
    }
}

impl<S: UserStore> UserManagementService<S> {
    pub fn new(
        store: Arc<S>,
        channel: NotificationChannel,
        config: NotificationConfig,
    ) -> Self {
        Self {
            store,
            channel,
            config,
            next_subscriber_id: AtomicU64::new(1),
        }
    }

    pub fn notification_channel(&self) -> &NotificationChannel {
        &self.channel
    }

    fn notify(
        &self,
        subject: impl Into<String>,
        action: ActionKind,
    ) {
        let outcome = self.channel.publish(MutationEvent::new(subject, action));
        debug!(%action, ?outcome, "Notification published");
    }
}

/// Logs and counts a finished operation, converting failures to a gRPC status.
fn finish<T>(
    operation: &str,
    result: crate::Result<T>,
) -> std::result::Result<T, Status> {
    match result {
        Ok(value) => {
            record_operation(operation, true);
            Ok(value)
        }
        Err(e) => Err(reject(operation, e)),
    }
}

fn reject(
    operation: &str,
    e: crate::Error,
) -> Status {
    record_operation(operation, false);
    if e.user_error().is_some() {
        debug!(operation, error = %e, "Request rejected");
    } else {
        error!(operation, error = ?e, "Request failed");
    }
    Status::from(e)
}

#[tonic::async_trait]
impl<S: UserStore> UserManagement for UserManagementService<S> {
    type NotifyUserChangesStream = ReceiverStream<std::result::Result<UserActionStream, Status>>;

    /// Inserts a user and returns it as stored, read back by its new key.
    ///
    /// The read-back publishes nothing. If it fails after the insert has
    /// committed, the request fails and the status message names the new key.
    #[cfg_attr(not(doc), autometrics(objective = API_SLO))]
    #[tracing::instrument(skip_all)]
    async fn create_user(
        &self,
        request: Request<CreateUserReq>,
    ) -> std::result::Result<Response<UserActionResponse>, Status> {
        let profile = request
            .into_inner()
            .user
            .map(UserProfile::from)
            .unwrap_or_default();
        debug!(email = %profile.email, "Received create_user request");

        let key = self
            .store
            .create_user(profile)
            .await
            .map_err(|e| reject("create_user", e))?;
        let created = self.store.get_user(&resolve(key.as_str())).await.map_err(|e| {
            warn!(%key, error = ?e, "Created user could not be read back");
            record_operation("create_user", false);
            let status = Status::from(e);
            Status::new(
                status.code(),
                format!("user {key} was created but could not be read back: {}", status.message()),
            )
        })?;
        record_operation("create_user", true);

        info!(%key, "User created");
        self.notify(created.profile.email.clone(), ActionKind::Created);
        Ok(Response::new(created.into()))
    }

    #[cfg_attr(not(doc), autometrics(objective = API_SLO))]
    #[tracing::instrument(skip_all)]
    async fn get_user(
        &self,
        request: Request<GetUserReq>,
    ) -> std::result::Result<Response<UserActionResponse>, Status> {
        let user_id = request.into_inner().user_id;
        let predicate = resolve(&user_id);
        debug!(%predicate, "Received get_user request");

        let record = finish("get_user", self.store.get_user(&predicate).await)?;

        if self.config.notify_reads {
            self.notify(user_id, ActionKind::Retrieved);
        }
        Ok(Response::new(record.into()))
    }

    #[cfg_attr(not(doc), autometrics(objective = API_SLO))]
    #[tracing::instrument(skip_all)]
    async fn update_user(
        &self,
        request: Request<UpdateUserReq>,
    ) -> std::result::Result<Response<UserActionResponse>, Status> {
        let UpdateUserReq { user_id, user } = request.into_inner();
        let predicate = resolve(&user_id);
        let patch = user.map(UserProfile::from).unwrap_or_default();
        debug!(%predicate, "Received update_user request");

        let updated = finish("update_user", self.store.update_user(&predicate, patch).await)?;

        info!(key = %updated.key, "User updated");
        self.notify(user_id, ActionKind::Updated);
        Ok(Response::new(updated.into()))
    }

    #[cfg_attr(not(doc), autometrics(objective = API_SLO))]
    #[tracing::instrument(skip_all)]
    async fn delete_user(
        &self,
        request: Request<DeleteUserReq>,
    ) -> std::result::Result<Response<DeletionActionResponse>, Status> {
        let user_id = request.into_inner().user_id;
        let predicate = resolve(&user_id);
        debug!(%predicate, "Received delete_user request");

        finish("delete_user", self.store.delete_user(&predicate).await)?;

        info!(%predicate, "User deleted");
        self.notify(user_id, ActionKind::Deleted);
        Ok(Response::new(DeletionActionResponse { deleted: true }))
    }

    /// Lists matching users. Never publishes.
    #[cfg_attr(not(doc), autometrics(objective = API_SLO))]
    #[tracing::instrument(skip_all)]
    async fn list_users(
        &self,
        request: Request<ListUsersReq>,
    ) -> std::result::Result<Response<ListActionResponse>, Status> {
        let filter = request.into_inner().to_filter();
        debug!(?filter, "Received list_users request");

        let records = finish("list_users", self.store.list_users(&filter).await)?;

        Ok(Response::new(ListActionResponse {
            users: records.into_iter().map(UserActionResponse::from).collect(),
        }))
    }

    /// Attaches a subscriber to the shared notification channel.
    ///
    /// Events are distributed across all attached subscribers: each event is
    /// delivered to at most one of them.
    async fn notify_user_changes(
        &self,
        _request: Request<EmptyMsg>,
    ) -> std::result::Result<Response<Self::NotifyUserChangesStream>, Status> {
        if self.channel.is_closed() {
            warn!("notify_user_changes: notification channel is closed");
            return Err(Status::unavailable("Service is shutting down"));
        }

        let subscriber_id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (response_sender, response_receiver) = mpsc::channel(self.config.response_buffer_size);
        let mut handler = NotificationStreamHandler::new(subscriber_id, self.channel.clone());

        tokio::spawn(async move {
            handler.run(response_sender).await;
        });

        Ok(Response::new(ReceiverStream::new(response_receiver)))
    }
}
