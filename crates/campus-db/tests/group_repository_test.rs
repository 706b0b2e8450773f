//! Integration tests for the Group repository: membership and module
//! assignments as the progress engine sees them.

use campus_core::error::CampusError;
use campus_core::models::assignment::AssignModule;
use campus_core::models::group::{CreateGroup, UpdateGroup};
use campus_core::models::module::CreateModule;
use campus_core::models::tenant::CreateTenant;
use campus_core::models::user::CreateUser;
use campus_core::repository::{
    GroupRepository, ModuleRepository, Pagination, ProgressSource, TenantRepository,
    UserRepository,
};
use campus_db::repository::{
    SurrealGroupRepository, SurrealModuleRepository, SurrealProgressSource,
    SurrealTenantRepository, SurrealUserRepository,
};
use campus_progress::assignment::{AssignedPair, PairFilter, resolve_pairs};
use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// One tenant with two employees.
struct Portal {
    db: Surreal<Db>,
    tenant_id: Uuid,
    alice: Uuid,
    bob: Uuid,
}

async fn setup() -> Portal {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    campus_db::run_migrations(&db).await.unwrap();

    let tenant = SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            name: "Acme".into(),
            slug: "acme".into(),
            metadata: None,
        })
        .await
        .unwrap();
    let alice = employee(&db, tenant.id, "alice").await;
    let bob = employee(&db, tenant.id, "bob").await;

    Portal {
        db,
        tenant_id: tenant.id,
        alice,
        bob,
    }
}

async fn employee(db: &Surreal<Db>, tenant_id: Uuid, username: &str) -> Uuid {
    SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            tenant_id,
            username: username.into(),
            email: format!("{username}@example.com"),
            display_name: username.into(),
            metadata: None,
        })
        .await
        .unwrap()
        .id
}

impl Portal {
    fn groups(&self) -> SurrealGroupRepository<Db> {
        SurrealGroupRepository::new(self.db.clone())
    }

    fn modules(&self) -> SurrealModuleRepository<Db> {
        SurrealModuleRepository::new(self.db.clone())
    }

    async fn group(&self, name: &str) -> Uuid {
        self.groups()
            .create(CreateGroup {
                tenant_id: self.tenant_id,
                name: name.into(),
                description: "".into(),
                metadata: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn module(&self, title: &str) -> Uuid {
        self.modules()
            .create(CreateModule {
                tenant_id: self.tenant_id,
                title: title.into(),
                description: "".into(),
                metadata: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn join(&self, user_id: Uuid, group_id: Uuid) {
        self.groups()
            .add_member(self.tenant_id, user_id, group_id)
            .await
            .unwrap();
    }

    async fn assign(&self, group_id: Uuid, module_id: Uuid, deadline_days: Option<i64>) {
        self.modules()
            .assign_to_group(AssignModule {
                tenant_id: self.tenant_id,
                group_id,
                module_id,
                deadline: deadline_days.map(|d| Utc::now() + Duration::days(d)),
            })
            .await
            .unwrap();
    }

    /// Pairs the progress engine would resolve from what is stored.
    async fn pairs(&self) -> Vec<AssignedPair> {
        let source = SurrealProgressSource::new(self.db.clone());
        let memberships = source.memberships(self.tenant_id, None).await.unwrap();
        let assignments = source.assignments(self.tenant_id).await.unwrap();
        resolve_pairs(&memberships, &assignments, &PairFilter::default())
    }
}

#[tokio::test]
async fn membership_routes_assigned_modules_to_members_only() {
    let portal = setup().await;
    let staff = portal.group("Staff").await;
    let safety = portal.module("Safety").await;
    portal.join(portal.alice, staff).await;
    portal.assign(staff, safety, None).await;

    let pairs = portal.pairs().await;
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].user_id, portal.alice);
    assert_eq!(pairs[0].module_id, safety);
    assert_eq!(pairs[0].groups, vec![staff]);
    assert_eq!(pairs[0].deadline, None);

    let source = SurrealProgressSource::new(portal.db.clone());
    assert!(
        source
            .memberships(portal.tenant_id, Some(portal.bob))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn deadlines_from_several_groups_reduce_to_the_earliest() {
    let portal = setup().await;
    let staff = portal.group("Staff").await;
    let leads = portal.group("Leads").await;
    let audit = portal.group("Audit").await;
    let safety = portal.module("Safety").await;
    for group in [staff, leads, audit] {
        portal.join(portal.alice, group).await;
    }
    portal.assign(staff, safety, Some(30)).await;
    portal.assign(leads, safety, Some(7)).await;
    portal.assign(audit, safety, None).await;

    let pairs = portal.pairs().await;
    assert_eq!(pairs.len(), 1);
    let mut expected = vec![staff, leads, audit];
    expected.sort();
    assert_eq!(pairs[0].groups, expected);

    let deadline = pairs[0].deadline.expect("a present deadline beats a missing one");
    let days_left = (deadline - Utc::now()).num_days();
    assert!((6..=7).contains(&days_left), "{days_left}");

    let names: Vec<String> = portal
        .groups()
        .get_user_groups(portal.tenant_id, portal.alice)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert_eq!(names, ["Audit", "Leads", "Staff"]);
}

#[tokio::test]
async fn reassigning_replaces_the_deadline_but_keeps_assigned_at() {
    let portal = setup().await;
    let staff = portal.group("Staff").await;
    let safety = portal.module("Safety").await;
    portal.assign(staff, safety, Some(30)).await;
    let first = portal
        .modules()
        .list_assignments(portal.tenant_id, safety)
        .await
        .unwrap();

    portal.assign(staff, safety, Some(3)).await;
    let second = portal
        .modules()
        .list_assignments(portal.tenant_id, safety)
        .await
        .unwrap();

    assert_eq!(second.len(), 1);
    assert_eq!(second[0].assigned_at, first[0].assigned_at);
    assert!(second[0].deadline < first[0].deadline);
}

#[tokio::test]
async fn leaving_a_group_drops_its_pairs() {
    let portal = setup().await;
    let staff = portal.group("Staff").await;
    let leads = portal.group("Leads").await;
    let safety = portal.module("Safety").await;
    let ethics = portal.module("Ethics").await;
    portal.join(portal.alice, staff).await;
    portal.join(portal.alice, leads).await;
    portal.join(portal.bob, staff).await;
    portal.assign(staff, safety, None).await;
    portal.assign(leads, ethics, None).await;
    assert_eq!(portal.pairs().await.len(), 3);

    portal
        .groups()
        .remove_member(portal.tenant_id, portal.alice, leads)
        .await
        .unwrap();

    let alice_modules: Vec<Uuid> = portal
        .pairs()
        .await
        .into_iter()
        .filter(|p| p.user_id == portal.alice)
        .map(|p| p.module_id)
        .collect();
    assert_eq!(alice_modules, vec![safety]);

    let members = portal
        .groups()
        .get_members(portal.tenant_id, leads, Pagination::default())
        .await
        .unwrap();
    assert_eq!(members.total, 0);
}

#[tokio::test]
async fn unassigning_keeps_routes_through_other_groups() {
    let portal = setup().await;
    let staff = portal.group("Staff").await;
    let leads = portal.group("Leads").await;
    let safety = portal.module("Safety").await;
    portal.join(portal.alice, staff).await;
    portal.join(portal.alice, leads).await;
    portal.assign(staff, safety, Some(30)).await;
    portal.assign(leads, safety, Some(2)).await;

    portal
        .modules()
        .unassign_from_group(portal.tenant_id, leads, safety)
        .await
        .unwrap();

    let pairs = portal.pairs().await;
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].groups, vec![staff]);
    let days_left = (pairs[0].deadline.unwrap() - Utc::now()).num_days();
    assert!(days_left >= 29, "{days_left}");
}

#[tokio::test]
async fn renamed_group_shows_up_in_report_labels() {
    let portal = setup().await;
    let staff = portal.group("Staff").await;

    portal
        .groups()
        .update(
            portal.tenant_id,
            staff,
            UpdateGroup {
                name: Some("Warehouse staff".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let labels = SurrealProgressSource::new(portal.db.clone())
        .group_labels(portal.tenant_id, &[staff])
        .await
        .unwrap();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].name, "Warehouse staff");

    let listed = portal
        .groups()
        .list(portal.tenant_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
}

#[tokio::test]
async fn duplicate_group_name_rejected_within_tenant() {
    let portal = setup().await;
    portal.group("Staff").await;

    let err = portal
        .groups()
        .create(CreateGroup {
            tenant_id: portal.tenant_id,
            name: "Staff".into(),
            description: "again".into(),
            metadata: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CampusError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn add_member_twice_is_noop() {
    let portal = setup().await;
    let staff = portal.group("Staff").await;

    portal.join(portal.alice, staff).await;
    portal.join(portal.alice, staff).await;

    let members = portal
        .groups()
        .get_members(portal.tenant_id, staff, Pagination::default())
        .await
        .unwrap();
    assert_eq!(members.total, 1);
    assert_eq!(portal.pairs().await.len(), 0);
}

#[tokio::test]
async fn delete_group_drops_memberships_and_assignments() {
    let portal = setup().await;
    let doomed = portal.group("Doomed").await;
    let safety = portal.module("Safety").await;
    portal.join(portal.alice, doomed).await;
    portal.assign(doomed, safety, None).await;

    portal
        .groups()
        .delete(portal.tenant_id, doomed)
        .await
        .unwrap();

    assert!(
        portal
            .groups()
            .get_user_groups(portal.tenant_id, portal.alice)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        portal
            .modules()
            .list_assignments(portal.tenant_id, safety)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(portal.pairs().await.is_empty());
}

#[tokio::test]
async fn add_member_rejects_foreign_user() {
    let portal = setup().await;
    let other = SurrealTenantRepository::new(portal.db.clone())
        .create(CreateTenant {
            name: "Other".into(),
            slug: "other".into(),
            metadata: None,
        })
        .await
        .unwrap();
    let outsider = employee(&portal.db, other.id, "mallory").await;
    let closed = portal.group("Closed").await;

    let result = portal
        .groups()
        .add_member(portal.tenant_id, outsider, closed)
        .await;
    assert!(result.is_err(), "user of another tenant must not join");
}

#[tokio::test]
async fn tenant_isolation() {
    let portal = setup().await;
    let other = SurrealTenantRepository::new(portal.db.clone())
        .create(CreateTenant {
            name: "Other".into(),
            slug: "other".into(),
            metadata: None,
        })
        .await
        .unwrap();
    let staff = portal.group("Staff").await;

    assert!(portal.groups().get_by_id(portal.tenant_id, staff).await.is_ok());
    let err = portal
        .groups()
        .get_by_id(other.id, staff)
        .await
        .unwrap_err();
    assert!(matches!(err, CampusError::NotFound { .. }), "{err:?}");
}
