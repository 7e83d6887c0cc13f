//! Integration tests for assembly, scoping, deduplication, and dispatch.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use trellis_compose::assembly::{Pipeline, ScopeBuilder};
use trellis_compose::bundle::{Guard, HookBundle};
use trellis_compose::context::Request;
use trellis_compose::error::AssemblyError;
use trellis_compose::fragment::{Fragment, FragmentIdentity};
use trellis_compose::hook::{EventKind, Flow, HookScope, Response, sync_hook};
use trellis_compose::route::{
    ChainSource, RouteSpec, SchemaValidator, ValidationFault, sync_handler,
};

fn noop() -> impl trellis_compose::hook::HookBehavior {
    sync_hook(|_ctx| Ok(Flow::Continue))
}

fn ok_route(path: &str) -> RouteSpec {
    RouteSpec::get(path, sync_handler(|_ctx| Ok(Response::ok())))
}

// ─────────────────────────────────────────────────────────────────────────
// Order-of-code contract
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn hooks_apply_only_to_routes_declared_after_them() {
    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| {
            scope.route(ok_route("/before"))?;
            scope.hook(EventKind::PreHandle, HookScope::Local, noop());
            scope.route(ok_route("/after"))
        })
        .unwrap();
    let app = pipeline.finalize();

    let before = &app.routes()[0];
    let after = &app.routes()[1];
    assert!(before.route().chain().stage(EventKind::PreHandle).is_empty());
    assert_eq!(after.route().chain().stage(EventKind::PreHandle).len(), 1);
}

#[test]
fn later_composition_never_widens_existing_routes() {
    struct LoudChild;
    impl Fragment for LoudChild {
        fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            scope.hook(EventKind::PreHandle, HookScope::Global, noop());
            Ok(())
        }
    }

    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| scope.route(ok_route("/early")))
        .unwrap();
    pipeline.mount(LoudChild).unwrap();
    pipeline
        .configure(|scope| scope.route(ok_route("/late")))
        .unwrap();
    let app = pipeline.finalize();

    // The child's global hook bubbles up, but only to routes declared
    // after the mount.
    assert!(
        app.routes()[0]
            .route()
            .chain()
            .stage(EventKind::PreHandle)
            .is_empty()
    );
    assert_eq!(
        app.routes()[1]
            .route()
            .chain()
            .stage(EventKind::PreHandle)
            .len(),
        1
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Scope propagation
// ─────────────────────────────────────────────────────────────────────────

// Four-level chain: root ("main") mounts Parent, which mounts Current,
// which declares one hook per tier and then mounts Child. Each level
// declares a route after its mounts, so the order gate admits every hook
// and only visibility decides membership. Tiers are told apart by stage:
// local at pre-parse, scoped at pre-validate, global at pre-handle.

struct ChildNode;
impl Fragment for ChildNode {
    fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
        scope.route(ok_route("/child"))
    }
}

struct CurrentNode;
impl Fragment for CurrentNode {
    fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
        scope.hook(EventKind::PreParse, HookScope::Local, noop());
        scope.hook(EventKind::PreValidate, HookScope::Scoped, noop());
        scope.hook(EventKind::PreHandle, HookScope::Global, noop());
        scope.mount(ChildNode)?;
        scope.route(ok_route("/current"))
    }
}

struct ParentNode;
impl Fragment for ParentNode {
    fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
        scope.mount(CurrentNode)?;
        scope.route(ok_route("/parent"))
    }
}

#[test]
fn scope_tiers_propagate_by_position() {
    let mut pipeline = Pipeline::new();
    pipeline.mount(ParentNode).unwrap();
    pipeline
        .configure(|scope| scope.route(ok_route("/main")))
        .unwrap();
    let app = pipeline.finalize();

    let membership: Vec<(&str, usize, usize, usize)> = app
        .routes()
        .iter()
        .map(|handle| {
            let chain = handle.route().chain();
            (
                handle.path(),
                chain.stage(EventKind::PreParse).len(),
                chain.stage(EventKind::PreValidate).len(),
                chain.stage(EventKind::PreHandle).len(),
            )
        })
        .collect();

    assert_eq!(
        membership,
        vec![
            // (path, local, scoped, global)
            ("/child", 1, 1, 1),
            ("/current", 1, 1, 1),
            ("/parent", 0, 1, 1),
            ("/main", 0, 0, 1),
        ]
    );
}

#[test]
fn sibling_subtrees_are_isolated() {
    struct Noisy;
    impl Fragment for Noisy {
        fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            scope.hook(EventKind::PreHandle, HookScope::Global, noop());
            Ok(())
        }
    }
    struct Quiet;
    impl Fragment for Quiet {
        fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            scope.route(ok_route("/quiet"))
        }
    }

    let mut pipeline = Pipeline::new();
    pipeline.mount(Noisy).unwrap();
    pipeline.mount(Quiet).unwrap();
    let app = pipeline.finalize();

    // Quiet never composed Noisy; even a global hook stays out.
    assert!(
        app.routes()[0]
            .route()
            .chain()
            .stage(EventKind::PreHandle)
            .is_empty()
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Deduplication
// ─────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct CountedDb {
    seed: u32,
    registrations: Arc<AtomicUsize>,
}

impl Fragment for CountedDb {
    fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        scope.expose("db_conn", self.seed)?;
        scope.share("db_stats", 0u64);
        Ok(())
    }

    fn identity(&self) -> Option<FragmentIdentity> {
        Some(FragmentIdentity::named("db").with_seed(&self.seed))
    }

    fn label(&self) -> &str {
        "db"
    }
}

#[test]
fn same_identity_registers_once() {
    let registrations = Arc::new(AtomicUsize::new(0));
    let db = CountedDb {
        seed: 1,
        registrations: registrations.clone(),
    };

    let mut pipeline = Pipeline::new();
    pipeline.mount(db.clone()).unwrap();
    pipeline.mount(db).unwrap();
    pipeline.finalize();

    assert_eq!(registrations.load(Ordering::SeqCst), 1);
}

#[test]
fn different_seeds_register_independently() {
    let registrations = Arc::new(AtomicUsize::new(0));

    let mut pipeline = Pipeline::new();
    pipeline
        .mount(CountedDb {
            seed: 1,
            registrations: registrations.clone(),
        })
        .unwrap();
    // Cannot mount the same name twice at one node (its exports collide),
    // so the second seed goes into a sub-tree.
    struct Nested(CountedDb);
    impl Fragment for Nested {
        fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            scope.mount(self.0.clone())
        }
    }
    pipeline
        .mount(Nested(CountedDb {
            seed: 2,
            registrations: registrations.clone(),
        }))
        .unwrap();
    pipeline.finalize();

    assert_eq!(registrations.load(Ordering::SeqCst), 2);
}

#[test]
fn anonymous_fragments_always_register() {
    static REGISTRATIONS: AtomicUsize = AtomicUsize::new(0);

    struct Anon;
    impl Fragment for Anon {
        fn register(&self, _scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            REGISTRATIONS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let mut pipeline = Pipeline::new();
    pipeline.mount(Anon).unwrap();
    pipeline.mount(Anon).unwrap();
    pipeline.finalize();

    assert_eq!(REGISTRATIONS.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn deduplicated_mount_shares_first_instantiation() {
    let registrations = Arc::new(AtomicUsize::new(0));
    let db = CountedDb {
        seed: 7,
        registrations: registrations.clone(),
    };

    struct Consumer(CountedDb);
    impl Fragment for Consumer {
        fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            scope.mount(self.0.clone())?;
            scope.route(RouteSpec::get(
                "/conn",
                sync_handler(|ctx| {
                    let conn = *ctx.capability::<u32>("db_conn")?;
                    Ok(Response::ok().with_payload(conn.to_string()))
                }),
            ))
        }
    }

    let mut pipeline = Pipeline::new();
    pipeline.mount(db.clone()).unwrap();
    // Second mount site, different sub-tree: registration is skipped but
    // the capability is present as if freshly instantiated.
    pipeline.mount(Consumer(db)).unwrap();
    let app = pipeline.finalize();

    assert_eq!(registrations.load(Ordering::SeqCst), 1);
    let response = app.routes()[0].dispatch(Request::new("GET", "/conn")).await;
    assert_eq!(response.payload, b"7");
}

#[test]
fn conflicting_seed_types_fail_assembly() {
    struct StrDb;
    impl Fragment for StrDb {
        fn register(&self, _scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            Ok(())
        }
        fn identity(&self) -> Option<FragmentIdentity> {
            Some(FragmentIdentity::named("db").with_seed(&"url"))
        }
    }
    struct IntDb;
    impl Fragment for IntDb {
        fn register(&self, _scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            Ok(())
        }
        fn identity(&self) -> Option<FragmentIdentity> {
            Some(FragmentIdentity::named("db").with_seed(&1u32))
        }
    }

    let mut pipeline = Pipeline::new();
    pipeline.mount(StrDb).unwrap();
    let err = pipeline.mount(IntDb).unwrap_err();
    assert!(matches!(err, AssemblyError::AmbiguousIdentity { .. }));
}

// ─────────────────────────────────────────────────────────────────────────
// Halt short-circuit
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn halt_skips_later_hooks_and_handler() {
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let mut pipeline = Pipeline::new();
    let (h1, h2, h3, handler_log) = (log.clone(), log.clone(), log.clone(), log.clone());
    pipeline
        .configure(move |scope| {
            scope.hook(
                EventKind::PreHandle,
                HookScope::Local,
                sync_hook(move |_ctx| {
                    h1.lock().unwrap().push("h1");
                    Ok(Flow::Continue)
                }),
            );
            scope.hook(
                EventKind::PreHandle,
                HookScope::Local,
                sync_hook(move |_ctx| {
                    h2.lock().unwrap().push("h2");
                    Ok(Flow::halt(418, "stopped by h2"))
                }),
            );
            scope.hook(
                EventKind::PreHandle,
                HookScope::Local,
                sync_hook(move |_ctx| {
                    h3.lock().unwrap().push("h3");
                    Ok(Flow::Continue)
                }),
            );
            scope.route(RouteSpec::get(
                "/guarded",
                sync_handler(move |_ctx| {
                    handler_log.lock().unwrap().push("handler");
                    Ok(Response::ok())
                }),
            ))
        })
        .unwrap();
    let app = pipeline.finalize();

    let response = app.routes()[0]
        .dispatch(Request::new("GET", "/guarded"))
        .await;

    assert_eq!(response.status, 418);
    assert_eq!(response.payload, b"stopped by h2");
    assert_eq!(*log.lock().unwrap(), vec!["h1", "h2"]);
}

#[tokio::test]
async fn post_handle_halt_replaces_response() {
    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| {
            scope.hook(
                EventKind::PostHandle,
                HookScope::Local,
                sync_hook(|_ctx| Ok(Flow::halt(204, ""))),
            );
            scope.route(RouteSpec::get(
                "/replaced",
                sync_handler(|_ctx| Ok(Response::ok().with_payload("body"))),
            ))
        })
        .unwrap();
    let app = pipeline.finalize();

    let response = app.routes()[0]
        .dispatch(Request::new("GET", "/replaced"))
        .await;
    assert_eq!(response.status, 204);
}

// ─────────────────────────────────────────────────────────────────────────
// Bundles and guards
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn parameterized_bundle_expands_per_reference() {
    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| {
            scope.define("role", |param| {
                let role = param.as_str().unwrap_or("anonymous").to_string();
                HookBundle::new().hook(
                    EventKind::PreHandle,
                    sync_hook(move |ctx| {
                        ctx.set_field("role", role.clone());
                        Ok(Flow::Continue)
                    }),
                )
            });
            let echo_role = || {
                sync_handler(|ctx| {
                    let role = ctx.field::<String>("role").cloned().unwrap_or_default();
                    Ok(Response::ok().with_payload(role))
                })
            };
            scope.route(
                RouteSpec::get("/admin", echo_role())
                    .apply_with("role", serde_json::json!("admin")),
            )?;
            scope.route(
                RouteSpec::get("/user", echo_role()).apply_with("role", serde_json::json!("user")),
            )
        })
        .unwrap();
    let app = pipeline.finalize();

    let admin = app.routes()[0].dispatch(Request::new("GET", "/admin")).await;
    let user = app.routes()[1].dispatch(Request::new("GET", "/user")).await;
    assert_eq!(admin.payload, b"admin");
    assert_eq!(user.payload, b"user");
}

#[test]
fn referencing_an_undefined_bundle_fails_assembly() {
    let mut pipeline = Pipeline::new();
    let err = pipeline
        .configure(|scope| scope.route(ok_route("/r").apply("nonexistent")))
        .unwrap_err();
    assert!(matches!(err, AssemblyError::MissingBundle { .. }));
}

#[test]
fn guard_applies_to_inner_routes_only() {
    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| {
            let bundle = HookBundle::new().hook(EventKind::PreHandle, noop());
            scope.guard(Guard::new(bundle), |inner| {
                inner.route(ok_route("/inside"))
            })?;
            scope.route(ok_route("/outside"))
        })
        .unwrap();
    let app = pipeline.finalize();

    assert_eq!(
        app.routes()[0]
            .route()
            .chain()
            .stage(EventKind::PreHandle)
            .len(),
        1
    );
    assert!(
        app.routes()[1]
            .route()
            .chain()
            .stage(EventKind::PreHandle)
            .is_empty()
    );
}

#[test]
fn nested_guard_contributions_accumulate_in_order() {
    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| {
            let outer = HookBundle::new().hook(EventKind::PreHandle, noop());
            let inner = HookBundle::new().hook(EventKind::PreHandle, noop());
            scope.guard(Guard::new(outer), |mid| {
                mid.guard(Guard::new(inner), |innermost| {
                    innermost.route(ok_route("/deep"))
                })
            })
        })
        .unwrap();
    let app = pipeline.finalize();

    let stage = app.routes()[0].route().chain().stage(EventKind::PreHandle);
    let sources: Vec<&ChainSource> = stage.iter().map(|entry| entry.source()).collect();
    assert_eq!(
        sources,
        vec![
            &ChainSource::Guard {
                guard: 0,
                position: 0
            },
            &ChainSource::Guard {
                guard: 1,
                position: 0
            },
        ]
    );
}

#[test]
fn guard_scope_override_propagates_beyond_the_subtree() {
    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| {
            let bundle = HookBundle::new().hook(EventKind::PreHandle, noop());
            scope.guard(Guard::new(bundle).with_scope(HookScope::Global), |inner| {
                inner.route(ok_route("/inside"))
            })?;
            scope.route(ok_route("/outside"))
        })
        .unwrap();
    let app = pipeline.finalize();

    // With an override the hooks are node declarations; both routes see them.
    for handle in app.routes() {
        assert_eq!(handle.route().chain().stage(EventKind::PreHandle).len(), 1);
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Missing dependencies
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn missing_dependency_fails_at_assembly_time() {
    struct NeedsDb;
    impl Fragment for NeedsDb {
        fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            scope.require("db_conn")?;
            Ok(())
        }
        fn label(&self) -> &str {
            "needs-db"
        }
    }

    let mut pipeline = Pipeline::new();
    let err = pipeline.mount(NeedsDb).unwrap_err();
    match err {
        AssemblyError::MissingDependency { name, path } => {
            assert_eq!(name, "db_conn");
            assert!(path.contains("needs-db"));
        }
        other => panic!("expected missing dependency, got {other}"),
    }
}

#[test]
fn dependency_exposed_by_an_ancestor_satisfies_require() {
    struct NeedsDb;
    impl Fragment for NeedsDb {
        fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            scope.require("db_conn")?;
            Ok(())
        }
    }

    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| scope.expose("db_conn", 1u32).map(|_| ()))
        .unwrap();
    pipeline.mount(NeedsDb).unwrap();
}

#[test]
fn shared_state_satisfies_require() {
    struct NeedsStats;
    impl Fragment for NeedsStats {
        fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            scope.require("stats")?;
            Ok(())
        }
    }

    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| {
            scope.share("stats", 0u64);
            Ok(())
        })
        .unwrap();
    pipeline.mount(NeedsStats).unwrap();
}

// ─────────────────────────────────────────────────────────────────────────
// Cycles and duplicates
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn self_composition_is_rejected() {
    struct Recursive;
    impl Fragment for Recursive {
        fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            scope.mount(Recursive)
        }
    }

    let mut pipeline = Pipeline::new();
    let err = pipeline.mount(Recursive).unwrap_err();
    assert!(matches!(err, AssemblyError::CyclicComposition { .. }));
}

#[test]
fn transitive_self_composition_is_rejected() {
    struct A;
    struct B;
    impl Fragment for A {
        fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            scope.mount(B)
        }
    }
    impl Fragment for B {
        fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
            scope.mount(A)
        }
    }

    let mut pipeline = Pipeline::new();
    let err = pipeline.mount(A).unwrap_err();
    assert!(matches!(err, AssemblyError::CyclicComposition { .. }));
}

#[test]
fn exposing_a_capability_twice_on_one_node_is_rejected() {
    let mut pipeline = Pipeline::new();
    let err = pipeline
        .configure(|scope| {
            scope.expose("db", 1u32)?;
            scope.expose("db", 2u32)?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, AssemblyError::DuplicateCapability { .. }));
}

// ─────────────────────────────────────────────────────────────────────────
// Chain idempotence
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn identical_declarations_capture_identical_chains() {
    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| {
            scope.define("tagged", |_param| {
                HookBundle::new().hook(EventKind::PreHandle, noop())
            });
            scope.hook(EventKind::PreParse, HookScope::Local, noop());
            let spec = ok_route("/twin").apply_with("tagged", serde_json::json!(1));
            scope.route(spec.clone())?;
            scope.route(spec)
        })
        .unwrap();
    let app = pipeline.finalize();

    let first = app.routes()[0].route().chain();
    let second = app.routes()[1].route().chain();
    assert_eq!(first, second);
}

// ─────────────────────────────────────────────────────────────────────────
// Validation sequencing
// ─────────────────────────────────────────────────────────────────────────

struct NonEmptyValidator;

impl SchemaValidator for NonEmptyValidator {
    fn validate(
        &self,
        schema: &serde_json::Value,
        payload: &[u8],
    ) -> Result<serde_json::Value, ValidationFault> {
        if payload.is_empty() {
            return Err(ValidationFault::new(format!(
                "empty payload rejected by {schema}"
            )));
        }
        Ok(serde_json::json!({ "bytes": payload.len() }))
    }
}

#[tokio::test]
async fn validation_errors_are_recoverable_responses() {
    let mut pipeline = Pipeline::new();
    pipeline.set_validator(Arc::new(NonEmptyValidator));
    pipeline
        .configure(|scope| {
            scope.route(
                RouteSpec::post(
                    "/submit",
                    sync_handler(|ctx| {
                        let bytes = ctx.validated()[0]["bytes"].as_u64().unwrap_or_default();
                        Ok(Response::ok().with_payload(bytes.to_string()))
                    }),
                )
                .schema(serde_json::json!({"type": "object"})),
            )
        })
        .unwrap();
    let app = pipeline.finalize();
    let route = &app.routes()[0];

    let rejected = route.dispatch(Request::new("POST", "/submit")).await;
    assert_eq!(rejected.status, 400);

    let accepted = route
        .dispatch(Request::new("POST", "/submit").with_payload("abc"))
        .await;
    assert_eq!(accepted.status, 200);
    assert_eq!(accepted.payload, b"3");
}

#[tokio::test]
async fn routes_without_schemas_skip_validation() {
    let mut pipeline = Pipeline::new();
    pipeline.set_validator(Arc::new(NonEmptyValidator));
    pipeline
        .configure(|scope| scope.route(ok_route("/free")))
        .unwrap();
    let app = pipeline.finalize();

    let response = app.routes()[0].dispatch(Request::new("GET", "/free")).await;
    assert_eq!(response.status, 200);
}

// ─────────────────────────────────────────────────────────────────────────
// Faults and the on-error stage
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn faults_reach_the_on_error_stage_once() {
    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| {
            scope.hook(
                EventKind::PreHandle,
                HookScope::Local,
                sync_hook(|_ctx| Err(trellis_compose::hook::Fault::new("boom"))),
            );
            scope.hook(
                EventKind::OnError,
                HookScope::Local,
                sync_hook(|ctx| {
                    let message = ctx.fault().map(|f| f.message().to_string());
                    Ok(Flow::halt(503, message.unwrap_or_default()))
                }),
            );
            scope.route(ok_route("/fragile"))
        })
        .unwrap();
    let app = pipeline.finalize();

    let response = app.routes()[0]
        .dispatch(Request::new("GET", "/fragile"))
        .await;
    assert_eq!(response.status, 503);
    assert_eq!(response.payload, b"boom");
}

#[tokio::test]
async fn unhandled_faults_become_generic_failures() {
    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| {
            scope.route(RouteSpec::get(
                "/broken",
                sync_handler(|_ctx| Err(trellis_compose::hook::Fault::new("handler died"))),
            ))
        })
        .unwrap();
    let app = pipeline.finalize();

    let response = app.routes()[0]
        .dispatch(Request::new("GET", "/broken"))
        .await;
    assert_eq!(response.status, 500);
}

// ─────────────────────────────────────────────────────────────────────────
// Route registration boundary
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn finalized_routes_are_handed_to_the_sink() {
    use trellis_compose::route::{RouteHandle, RouteSink};

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(String, String)>,
    }
    impl RouteSink for Recorder {
        fn register(&mut self, method: &str, path: &str, _route: RouteHandle) {
            self.seen.push((method.to_string(), path.to_string()));
        }
    }

    let mut pipeline = Pipeline::new();
    pipeline
        .configure(|scope| {
            scope.route(ok_route("/a"))?;
            scope.route(RouteSpec::post("/b", sync_handler(|_| Ok(Response::ok()))))
        })
        .unwrap();
    let app = pipeline.finalize();

    let mut sink = Recorder::default();
    app.install_into(&mut sink);
    assert_eq!(
        sink.seen,
        vec![
            ("GET".to_string(), "/a".to_string()),
            ("POST".to_string(), "/b".to_string()),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Teardown
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn shutdown_runs_on_stop_hooks_in_declaration_order() {
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let mut pipeline = Pipeline::new();
    let (first, second) = (log.clone(), log.clone());
    pipeline
        .configure(move |scope| {
            scope.hook(
                EventKind::OnStop,
                HookScope::Local,
                sync_hook(move |_ctx| {
                    first.lock().unwrap().push("first");
                    Ok(Flow::Continue)
                }),
            );
            scope.hook(
                EventKind::OnStop,
                HookScope::Local,
                sync_hook(move |_ctx| {
                    second.lock().unwrap().push("second");
                    Ok(Flow::Continue)
                }),
            );
            Ok(())
        })
        .unwrap();
    let app = pipeline.finalize();

    app.shutdown().await;
    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}
