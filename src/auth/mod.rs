//! Admin authentication gate
//! 管理员认证关卡
//!
//! Signing in needs both a valid password session and an email on the admin
//! allow-list. Every failure looks the same to the caller.
//! 登录需要有效的密码会话且邮箱在管理员白名单中；所有失败对调用方看起来都一样。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::{AuthService, AuthUser, ContentBackend, SelectQuery, Session};
use crate::constants::tables;
use crate::content::{ContentError, ContentResult};


/// Derived authentication state / 派生的认证状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub session: Option<Session>,
    pub user: Option<AuthUser>,
    pub is_admin: bool,
    pub is_loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            session: None,
            user: None,
            is_admin: false,
            is_loading: true,
        }
    }
}

/// Session change notifications / 会话变更通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession(Option<Session>),
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
}

/// Authentication gate / 认证关卡
#[derive(Debug)]
pub struct AuthGate {
    auth: Arc<dyn AuthService>,
    backend: Arc<dyn ContentBackend>,
    state: watch::Sender<AuthState>,
}

impl AuthGate {
    pub fn new(auth: Arc<dyn AuthService>, backend: Arc<dyn ContentBackend>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            auth,
            backend,
            state,
        }
    }

    /// Receive every published state / 接收每次发布的状态
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Derive the state from whatever session the backend already holds
    /// 根据后端已有的会话派生状态
    pub async fn initialize(&self) -> AuthState {
        let session = self.auth.current_session();
        self.handle_event(AuthEvent::InitialSession(session)).await
    }

    /// Allow-list membership; lookup errors count as "not an admin"
    /// 白名单成员检查；查询出错视为非管理员
    pub async fn is_admin_email(&self, email: &str) -> bool {
        let query = SelectQuery::columns("email").eq("email", email);
        match self.backend.select(tables::ADMINS, &query).await {
            Ok(rows) => rows.len() == 1,
            Err(e) => {
                warn!(error = %e, "Admin allow-list lookup failed");
                false
            }
        }
    }

    /// Re-derive session, user and admin flag from scratch and publish them
    /// 从头重新派生会话、用户和管理员标记并发布
    pub async fn handle_event(&self, event: AuthEvent) -> AuthState {
        let session = match event {
            AuthEvent::InitialSession(session) => session,
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => Some(session),
            AuthEvent::SignedOut => None,
        };

        let is_admin = match session.as_ref().and_then(|s| s.user.email.as_deref()) {
            Some(email) => self.is_admin_email(email).await,
            None => false,
        };

        let state = AuthState {
            user: session.as_ref().map(|s| s.user.clone()),
            session,
            is_admin,
            is_loading: false,
        };
        self.state.send_replace(state.clone());
        state
    }

    /// Password sign-in restricted to allow-listed accounts
    /// 仅限白名单账户的密码登录
    pub async fn sign_in(&self, email: &str, password: &str) -> ContentResult<AuthState> {
        let session = match self.auth.sign_in_with_password(email, password).await {
            Ok(session) => session,
            Err(e) => {
                debug!(error = %e, "Password sign-in rejected");
                return Err(ContentError::Auth);
            }
        };

        let allowed = match session.user.email.as_deref() {
            Some(account) => self.is_admin_email(account).await,
            None => false,
        };
        if !allowed {
            info!(user_id = %session.user.id, "Account is not on the admin allow-list");
            self.sign_out().await;
            return Err(ContentError::Auth);
        }

        Ok(self.handle_event(AuthEvent::SignedIn(session)).await)
    }

    /// End the session; a failed server call still clears local state
    /// 结束会话；服务端调用失败时也会清除本地状态
    pub async fn sign_out(&self) -> AuthState {
        if let Err(e) = self.auth.sign_out().await {
            warn!(error = %e, "Sign-out request failed");
        }
        self.handle_event(AuthEvent::SignedOut).await
    }

    /// Exchange the refresh token; failure signs the user out
    /// 使用刷新令牌换取新会话；失败则登出
    pub async fn refresh(&self) -> ContentResult<AuthState> {
        let refresh_token = self
            .auth
            .current_session()
            .and_then(|s| s.refresh_token);
        let Some(refresh_token) = refresh_token else {
            return Err(ContentError::Auth);
        };

        match self.auth.refresh_session(&refresh_token).await {
            Ok(session) => Ok(self.handle_event(AuthEvent::TokenRefreshed(session)).await),
            Err(e) => {
                warn!(error = %e, "Session refresh failed");
                self.sign_out().await;
                Err(ContentError::Auth)
            }
        }
    }
}
