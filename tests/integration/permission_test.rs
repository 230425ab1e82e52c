//! Integration tests for permissions and role reconciliation.

mod helpers;

use flasky_auth::rbac::RoleDefinition;
use flasky_auth::rbac::catalog::{ADMINISTRATOR, MODERATOR, USER};
use flasky_auth::rbac::RoleCatalog;
use flasky_entity::permission::Permission;

#[tokio::test]
async fn test_add_permission_is_idempotent_for_every_flag() {
    let app = helpers::TestApp::new().await;
    let mut role = app.services.roles.list_roles().await.unwrap().remove(0);

    for base in [Permission::NONE, Permission::FOLLOW | Permission::ADMIN] {
        for perm in Permission::ALL {
            role.permissions = base;
            role.add_permission(perm);
            assert!(role.has_permission(perm));
            let once = role.permissions;
            role.add_permission(perm);
            assert_eq!(role.permissions, once);
        }
    }
}

#[tokio::test]
async fn test_remove_and_reset() {
    let app = helpers::TestApp::new().await;
    let mut role = app.services.roles.list_roles().await.unwrap().remove(0);

    role.permissions = Permission::FOLLOW | Permission::WRITE;
    role.remove_permission(Permission::MODERATE);
    assert_eq!(role.permissions, Permission::FOLLOW | Permission::WRITE);
    role.remove_permission(Permission::WRITE);
    assert_eq!(role.permissions, Permission::FOLLOW);
    role.reset_permissions();
    assert!(role.permissions.is_empty());
}

#[tokio::test]
async fn test_reconcile_twice_yields_identical_masks() {
    let app = helpers::TestApp::without_roles();
    let catalog = RoleCatalog::standard();

    let first = app.services.roles.reconcile_roles(&catalog).await.unwrap();
    let second = app.services.roles.reconcile_roles(&catalog).await.unwrap();

    let masks = |roles: &[flasky_entity::user::Role]| {
        roles
            .iter()
            .map(|r| (r.id, r.name.clone(), r.permissions, r.is_default))
            .collect::<Vec<_>>()
    };
    assert_eq!(masks(&first[..]), masks(&second[..]));
}

#[tokio::test]
async fn test_reconcile_narrows_dropped_permission() {
    let app = helpers::TestApp::new().await;

    let mut catalog = RoleCatalog::standard();
    catalog.roles[0] = RoleDefinition::new(USER, &[Permission::FOLLOW, Permission::COMMENT]);
    app.services.roles.reconcile_roles(&catalog).await.unwrap();

    let roles = app.services.roles.list_roles().await.unwrap();
    let user_role = roles.iter().find(|r| r.name == USER).unwrap();
    assert!(!user_role.has_permission(Permission::WRITE));
    assert_eq!(user_role.permissions, Permission::FOLLOW | Permission::COMMENT);

    let moderator = roles.iter().find(|r| r.name == MODERATOR).unwrap();
    assert!(moderator.has_permission(Permission::WRITE | Permission::MODERATE));
}

#[tokio::test]
async fn test_standard_roles_grant_expected_capabilities() {
    let app = helpers::TestApp::new().await;
    let plain = app.create_user("plain@example.com", "plain", "cat").await;
    let admin = app.create_user(helpers::ADMIN_EMAIL, "admin", "cat").await;

    let plain = app.identity(&plain).await;
    let admin = app.identity(&admin).await;

    assert_eq!(plain.role().unwrap().name, USER);
    assert!(plain.can(Permission::WRITE));
    assert!(!plain.can(Permission::MODERATE));
    assert!(!plain.is_administrator());

    assert_eq!(admin.role().unwrap().name, ADMINISTRATOR);
    for perm in Permission::ALL {
        assert!(admin.can(perm));
    }
    assert!(admin.is_administrator());
}
