use std::collections::HashMap;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use warden_core::engine::{AccessController, DocAccessController, RoleReader};
use warden_core::{
    AccessError, Action, DecisionCache, DocAction, DocRole, ResourceId, ResourceKind, ResourceRef,
    Role, UserId, WorkspaceAction, WorkspaceRole,
};

#[derive(Default)]
struct TestStore {
    roles: HashMap<(ResourceKind, UserId, ResourceId), Role>,
    parents: HashMap<ResourceId, ResourceRef>,
}

impl TestStore {
    fn grant(mut self, kind: ResourceKind, user: &str, resource: &str, role: Role) -> Self {
        self.roles
            .insert((kind, UserId::new(user), ResourceId::new(resource)), role);
        self
    }

    fn attach(mut self, doc: &str, workspace: &str) -> Self {
        self.parents
            .insert(ResourceId::new(doc), ResourceRef::workspace(workspace));
        self
    }
}

impl RoleReader for TestStore {
    async fn find_role_assignment(
        &self,
        kind: ResourceKind,
        user: &UserId,
        resource: &ResourceId,
    ) -> Result<Option<Role>, AccessError> {
        Ok(self
            .roles
            .get(&(kind, user.clone(), resource.clone()))
            .copied())
    }

    async fn find_parent_resource(
        &self,
        _kind: ResourceKind,
        resource: &ResourceId,
    ) -> Result<Option<ResourceRef>, AccessError> {
        Ok(self.parents.get(resource).cloned())
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn inherited_store(documents: usize) -> TestStore {
    let store = TestStore::default().grant(
        ResourceKind::Workspace,
        "alice",
        "w1",
        Role::Workspace(WorkspaceRole::Admin),
    );
    (0..documents).fold(store, |store, i| store.attach(&format!("d{i}"), "w1"))
}

fn bench_workspace_check_cached(c: &mut Criterion) {
    let rt = runtime();
    let access = AccessController::new(
        Arc::new(inherited_store(0)),
        Arc::new(DecisionCache::default()),
    );
    let (user, workspace) = (UserId::new("alice"), ResourceId::new("w1"));

    c.bench_function("workspace_check_cached", |b| {
        b.to_async(&rt).iter(|| async {
            access
                .user(&user)
                .workspace(&workspace)
                .can(WorkspaceAction::Write)
                .await
                .unwrap()
        });
    });
}

fn bench_document_check_inherited_cached(c: &mut Criterion) {
    let rt = runtime();
    let access = AccessController::new(
        Arc::new(inherited_store(1)),
        Arc::new(DecisionCache::default()),
    );
    let (user, doc) = (UserId::new("alice"), ResourceId::new("d0"));

    c.bench_function("document_check_inherited_cached", |b| {
        b.to_async(&rt).iter(|| async {
            access
                .user(&user)
                .doc(&doc)
                .can(DocAction::Publish)
                .await
                .unwrap()
        });
    });
}

fn bench_document_evaluate_uncached(c: &mut Criterion) {
    let rt = runtime();
    let store = inherited_store(1).grant(
        ResourceKind::Document,
        "alice",
        "d0",
        Role::Document(DocRole::Reader),
    );
    let controller = DocAccessController::new(Arc::new(store), Arc::new(DecisionCache::default()));
    let (user, doc) = (UserId::new("alice"), ResourceId::new("d0"));

    c.bench_function("document_evaluate_uncached", |b| {
        b.to_async(&rt).iter(|| async {
            controller
                .evaluate(&user, &doc, Action::Document(DocAction::Read))
                .await
                .unwrap()
        });
    });
}

fn bench_document_fan_out_100(c: &mut Criterion) {
    let rt = runtime();
    let access = AccessController::new(
        Arc::new(inherited_store(100)),
        Arc::new(DecisionCache::default()),
    );
    let user = UserId::new("alice");
    let docs: Vec<ResourceId> = (0..100).map(|i| ResourceId::new(format!("d{i}"))).collect();

    c.bench_function("document_fan_out_100", |b| {
        b.to_async(&rt).iter(|| async {
            for doc in &docs {
                access
                    .user(&user)
                    .doc(doc)
                    .can(DocAction::Write)
                    .await
                    .unwrap();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_workspace_check_cached,
    bench_document_check_inherited_cached,
    bench_document_evaluate_uncached,
    bench_document_fan_out_100,
);
criterion_main!(benches);
