//! Integration tests for Tenant and User repositories using in-memory SurrealDB.

use campus_core::error::CampusError;
use campus_core::models::tenant::CreateTenant;
use campus_core::models::user::{CreateUser, UpdateUser, UserStatus};
use campus_core::repository::{Pagination, TenantRepository, UserRepository};
use campus_db::repository::{SurrealTenantRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    campus_db::run_migrations(&db).await.unwrap();
    db
}

fn new_tenant(slug: &str) -> CreateTenant {
    CreateTenant {
        name: format!("Tenant {slug}"),
        slug: slug.into(),
        metadata: None,
    }
}

fn new_user(tenant_id: Uuid, username: &str) -> CreateUser {
    CreateUser {
        tenant_id,
        username: username.into(),
        email: format!("{username}@example.com"),
        display_name: username.to_uppercase(),
        metadata: None,
    }
}

#[tokio::test]
async fn create_and_lookup_tenant() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    let tenant = repo.create(new_tenant("acme")).await.unwrap();
    assert_eq!(tenant.slug, "acme");

    let by_id = repo.get_by_id(tenant.id).await.unwrap();
    assert_eq!(by_id.name, "Tenant acme");

    let by_slug = repo.get_by_slug("acme").await.unwrap();
    assert_eq!(by_slug.id, tenant.id);


    let err = repo.get_by_slug("acme-other").await.unwrap_err();
    assert!(matches!(err, CampusError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn duplicate_tenant_slug_rejected() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    repo.create(new_tenant("dup")).await.unwrap();
    let err = repo.create(new_tenant("dup")).await.unwrap_err();
    assert!(matches!(err, CampusError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn tenant_slug_must_be_url_safe() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    for slug in ["", "Acme", "acme corp", "-acme"] {
        let err = repo.create(new_tenant(slug)).await.unwrap_err();
        assert!(matches!(err, CampusError::Validation { .. }), "{slug:?}: {err:?}");
    }
    let err = repo.get_by_slug("acme corp").await.unwrap_err();
    assert!(matches!(err, CampusError::NotFound { .. }));
}

#[tokio::test]
async fn user_lifecycle() {
    let db = setup().await;
    let tenant = SurrealTenantRepository::new(db.clone())
        .create(new_tenant("life"))
        .await
        .unwrap();
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(new_user(tenant.id, "alice")).await.unwrap();
    assert_eq!(user.status, UserStatus::Active);
    assert_eq!(user.display_name, "ALICE");

    let by_name = repo.get_by_username(tenant.id, "alice").await.unwrap();
    assert_eq!(by_name.id, user.id);

    let renamed = repo
        .update(
            tenant.id,
            user.id,
            UpdateUser {
                display_name: Some("Alice Liddell".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.display_name, "Alice Liddell");
    assert_eq!(renamed.email, "alice@example.com");

    // Soft delete keeps the row around.
    repo.delete(tenant.id, user.id).await.unwrap();
    let deleted = repo.get_by_id(tenant.id, user.id).await.unwrap();
    assert_eq!(deleted.status, UserStatus::Inactive);
}

#[tokio::test]
async fn duplicate_username_rejected_within_tenant_only() {
    let db = setup().await;
    let tenants = SurrealTenantRepository::new(db.clone());
    let a = tenants.create(new_tenant("a")).await.unwrap();
    let b = tenants.create(new_tenant("b")).await.unwrap();
    let repo = SurrealUserRepository::new(db);

    repo.create(new_user(a.id, "bob")).await.unwrap();
    let err = repo.create(new_user(a.id, "bob")).await.unwrap_err();
    assert!(matches!(err, CampusError::AlreadyExists { .. }), "{err:?}");

    repo.create(new_user(b.id, "bob")).await.unwrap();
}

#[tokio::test]
async fn users_are_tenant_scoped() {
    let db = setup().await;
    let tenants = SurrealTenantRepository::new(db.clone());
    let a = tenants.create(new_tenant("iso-a")).await.unwrap();
    let b = tenants.create(new_tenant("iso-b")).await.unwrap();
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(new_user(a.id, "carol")).await.unwrap();

    let err = repo.get_by_id(b.id, user.id).await.unwrap_err();
    assert!(matches!(err, CampusError::NotFound { .. }));

    let listed = repo.list(b.id, Pagination::default()).await.unwrap();
    assert_eq!(listed.total, 0);
    assert!(listed.items.is_empty());
}
