//! Wires every service over one set of stores and collaborators.

use std::sync::Arc;

use flasky_auth::acl::ContentGate;
use flasky_auth::password::{PasswordHasher, PasswordValidator};
use flasky_auth::rbac::RbacEnforcer;
use flasky_auth::token::TokenCodec;
use flasky_core::config::AppConfig;
use flasky_core::error::AppError;
use flasky_core::traits::{Clock, NotificationSink};
use flasky_database::Stores;

use crate::follow::FollowService;
use crate::identity::{IdentityService, IdentitySettings};
use crate::notification::Mailer;
use crate::post::PostService;
use crate::role::RoleService;
use crate::session::ApiAuthService;

/// All application services.
#[derive(Debug, Clone)]
pub struct Services {
    /// Account lifecycle.
    pub identity: Arc<IdentityService>,
    /// Follow graph.
    pub follows: Arc<FollowService>,
    /// Posts.
    pub posts: Arc<PostService>,
    /// Role reconciliation.
    pub roles: Arc<RoleService>,
    /// API authentication.
    pub api_auth: Arc<ApiAuthService>,
    /// Content gate.
    pub gate: Arc<ContentGate>,
    /// Token codec.
    pub codec: Arc<TokenCodec>,
}

impl Services {
    /// Builds every service from configuration.
    ///
    /// Fails when a configured token lifetime cannot be represented.
    pub fn new(
        config: &AppConfig,
        stores: Stores,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self, AppError> {
        let codec = Arc::new(TokenCodec::new(&config.auth, clock.clone()));
        let hasher = Arc::new(PasswordHasher::new());
        let validator = Arc::new(PasswordValidator::new(&config.auth));
        let rbac = Arc::new(RbacEnforcer::new());
        let gate = Arc::new(ContentGate::new());
        let mailer = Arc::new(Mailer::new(sink, &config.mail));

        let identity = Arc::new(IdentityService::new(
            &stores,
            codec.clone(),
            hasher.clone(),
            validator,
            rbac,
            mailer,
            clock.clone(),
            IdentitySettings::from_config(&config.identity, &config.auth)?,
        ));
        let follows = Arc::new(FollowService::new(&stores, clock.clone()));
        let posts = Arc::new(PostService::new(
            stores.posts.clone(),
            gate.clone(),
            clock,
            config.posts.per_page,
        ));
        let roles = Arc::new(RoleService::new(stores.roles.clone()));
        let api_auth = Arc::new(ApiAuthService::new(
            &stores,
            codec.clone(),
            hasher,
            &config.auth,
        )?);

        Ok(Self {
            identity,
            follows,
            posts,
            roles,
            api_auth,
            gate,
            codec,
        })
    }
}
