use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::AdminConfig;
use crate::handlers;
use crate::middleware::auth_middleware;
use crate::services::access::PermissionEvaluator;
use crate::services::auth::AuthService;
use crate::services::clients::ClientService;
use crate::services::notify::{Notifier, SmtpNotifier};
use crate::services::token::SessionTokens;
use crate::services::users::UserService;
use crate::store::mongo::MongoStore;
use crate::store::{AccountStore, HealthCheck, TenantStore};
use service_core::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub tenants: Arc<dyn TenantStore>,
    pub health: Arc<dyn HealthCheck>,
    pub tokens: SessionTokens,
    pub evaluator: Arc<PermissionEvaluator>,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub clients: Arc<ClientService>,
}

impl AppState {
    /// Wire the services over any store and notifier. Tests drive this with
    /// the in-memory store and mock notifier.
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        tenants: Arc<dyn TenantStore>,
        health: Arc<dyn HealthCheck>,
        notifier: Arc<dyn Notifier>,
        tokens: SessionTokens,
    ) -> Self {
        let evaluator = Arc::new(PermissionEvaluator::new(accounts.clone(), tenants.clone()));
        let auth = Arc::new(AuthService::new(
            accounts.clone(),
            tokens.clone(),
            notifier.clone(),
        ));
        let users = Arc::new(UserService::new(
            accounts.clone(),
            tenants.clone(),
            notifier,
        ));
        let clients = Arc::new(ClientService::new(accounts.clone(), tenants.clone()));

        AppState {
            accounts,
            tenants,
            health,
            tokens,
            evaluator,
            auth,
            users,
            clients,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/password", put(handlers::auth::change_password))
        .route("/users", get(handlers::users::search_users))
        .route("/users", post(handlers::users::create_user))
        .route("/users/:id", get(handlers::users::get_user))
        .route("/users/:id", delete(handlers::users::delete_user))
        .route("/clients", get(handlers::clients::search_clients))
        .route("/clients", post(handlers::clients::create_client))
        .route("/clients/:id", get(handlers::clients::get_client))
        .route("/clients/:id/archive", put(handlers::clients::archive_client))
        .route("/clients/:id", delete(handlers::clients::delete_client))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/auth/confirm", post(handlers::auth::confirm_account))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: AdminConfig) -> Result<Self, AppError> {
        let store = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(AppError::from)?;
        store.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            AppError::from(e)
        })?;

        let notifier: Arc<dyn Notifier> =
            Arc::new(SmtpNotifier::new(&config.smtp).map_err(AppError::from)?);
        let tokens = SessionTokens::new(config.session.token_validity_minutes);

        let store = Arc::new(store);
        let state = AppState::new(
            store.clone(),
            store.clone(),
            store,
            notifier,
            tokens,
        );

        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
