//! One method per backend endpoint.

use super::client::{ApiClient, Reply, RequestOptions};
use super::models::{
    AssignExecutor, Comment, CommentWithUser, DashboardStats, LoginRequest, NewComment,
    NewServiceRequest, RegisterRequest, RequestType, RequestUpdate, ServiceInfo, ServiceRequest,
    ServiceRequestDetails, SettingUpdate, SystemSetting, Token, User, UserUpdate, UserUpdateAdmin,
};
use super::query::QueryParams;
use super::transport::Transport;
use crate::error::Result;
use reqwest::Method;
use serde::de::IgnoredAny;
use tracing::info;

impl<T: Transport> ApiClient<T> {
    // ==================== Auth ====================

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        fullname: &str,
        address: Option<&str>,
    ) -> Result<Reply<User>> {
        let body = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            fullname: fullname.to_string(),
            address: address.map(str::to_string),
        };
        self.send_json(Method::POST, "/api/auth/register", &body).await
    }

    /// Logs in, keeping the issued access token for later requests.
    pub async fn login(&self, username: &str, password: &str) -> Result<Reply<Token>> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let reply: Reply<Token> = self.send_json(Method::POST, "/api/auth/login", &body).await?;

        if let Reply::Data(Token {
            access_token: Some(token),
            ..
        }) = &reply
        {
            if !token.is_empty() {
                self.session().store(token)?;
                info!(username, "logged in");
            }
        }
        Ok(reply)
    }

    /// Forgets the stored credential. Nothing is sent to the server.
    pub fn logout(&self) -> Result<()> {
        self.session().clear()?;
        Ok(())
    }

    pub async fn get_current_user(&self) -> Result<Reply<User>> {
        self.get("/api/auth/me").await
    }

    // ==================== Users ====================

    /// Lists users. `params` is passed through as the query string.
    pub async fn get_users(&self, params: &QueryParams) -> Result<Reply<Vec<User>>> {
        self.get(&params.apply("/api/users")).await
    }

    pub async fn get_user(&self, id: i64) -> Result<Reply<User>> {
        self.get(&format!("/api/users/{id}")).await
    }

    pub async fn update_user(&self, id: i64, data: &UserUpdate) -> Result<Reply<User>> {
        self.send_json(Method::PUT, &format!("/api/users/{id}"), data)
            .await
    }

    pub async fn update_user_admin(&self, id: i64, data: &UserUpdateAdmin) -> Result<Reply<User>> {
        self.send_json(Method::PUT, &format!("/api/users/{id}/admin"), data)
            .await
    }

    pub async fn delete_user(&self, id: i64) -> Result<Reply<()>> {
        self.delete(&format!("/api/users/{id}")).await
    }

    // ==================== Service requests ====================

    pub async fn get_requests(
        &self,
        params: &QueryParams,
    ) -> Result<Reply<Vec<ServiceRequestDetails>>> {
        self.get(&params.apply("/api/requests")).await
    }

    pub async fn get_request(&self, id: i64) -> Result<Reply<ServiceRequestDetails>> {
        self.get(&format!("/api/requests/{id}")).await
    }

    pub async fn create_request(
        &self,
        kind: RequestType,
        description: &str,
    ) -> Result<Reply<ServiceRequest>> {
        let body = NewServiceRequest {
            kind,
            description: description.to_string(),
        };
        self.send_json(Method::POST, "/api/requests", &body).await
    }

    pub async fn update_request(
        &self,
        id: i64,
        data: &RequestUpdate,
    ) -> Result<Reply<ServiceRequest>> {
        self.send_json(Method::PUT, &format!("/api/requests/{id}"), data)
            .await
    }

    pub async fn assign_executor(
        &self,
        request_id: i64,
        executor_id: i64,
    ) -> Result<Reply<ServiceRequest>> {
        self.send_json(
            Method::POST,
            &format!("/api/requests/{request_id}/assign"),
            &AssignExecutor { executor_id },
        )
        .await
    }

    pub async fn delete_request(&self, id: i64) -> Result<Reply<()>> {
        self.delete(&format!("/api/requests/{id}")).await
    }

    // ==================== Comments ====================

    pub async fn get_request_comments(&self, id: i64) -> Result<Reply<Vec<CommentWithUser>>> {
        self.get(&format!("/api/requests/{id}/comments")).await
    }

    pub async fn create_comment(&self, request_id: i64, text: &str) -> Result<Reply<Comment>> {
        let body = NewComment {
            request_id,
            text: text.to_string(),
        };
        self.send_json(Method::POST, "/api/comments", &body).await
    }

    // ==================== Stats & settings ====================

    pub async fn get_dashboard_stats(&self) -> Result<Reply<DashboardStats>> {
        self.get("/api/stats/dashboard").await
    }

    pub async fn get_settings(&self) -> Result<Reply<Vec<SystemSetting>>> {
        self.get("/api/settings").await
    }

    /// `key` is used verbatim as a path segment.
    pub async fn update_setting(&self, key: &str, value: &str) -> Result<Reply<SystemSetting>> {
        let body = SettingUpdate {
            value: value.to_string(),
        };
        self.send_json(Method::PUT, &format!("/api/settings/{key}"), &body)
            .await
    }

    /// The unauthenticated health check.
    pub async fn service_info(&self) -> Result<Reply<ServiceInfo>> {
        self.get("/").await
    }

    async fn delete(&self, endpoint: &str) -> Result<Reply<()>> {
        let reply: Reply<IgnoredAny> = self
            .request(endpoint, RequestOptions::new(Method::DELETE))
            .await?;
        Ok(reply.map(|_| ()))
    }
}
