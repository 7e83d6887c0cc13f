//! Request id fragment.
//!
//! Provides [`RequestIdFragment`] which stamps every request resolving
//! through its mount site with a monotonically increasing id, contributed as
//! a context field at the pre-parse stage.

use trellis_compose::assembly::ScopeBuilder;
use trellis_compose::error::AssemblyError;
use trellis_compose::fragment::{Fragment, FragmentIdentity};
use trellis_compose::hook::{EventKind, Flow, HookScope, sync_hook};

/// Context field name the request id is contributed under.
pub const REQUEST_ID_FIELD: &str = "request_id";

/// Shared-state slot name holding the id counter.
pub const REQUEST_ID_COUNTER: &str = "request_id_counter";

/// Fragment stamping requests with sequential ids.
///
/// Declares a shared `u64` counter and a scoped pre-parse hook that
/// increments it and contributes the value as the `request_id` field. The
/// counter is shared across all concurrent requests below the mount site.
///
/// The fragment is named, so reusable fragments can each mount it and the
/// counter is still allocated once per assembled pipeline.
///
/// # Example
///
/// ```ignore
/// scope.mount(RequestIdFragment::default())?;
/// // later, in a hook or handler:
/// let id = ctx.field::<u64>(REQUEST_ID_FIELD).copied();
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestIdFragment;

impl Fragment for RequestIdFragment {
    fn register(&self, scope: &mut ScopeBuilder<'_>) -> Result<(), AssemblyError> {
        scope.share(REQUEST_ID_COUNTER, 0u64);
        scope.hook(
            EventKind::PreParse,
            HookScope::Scoped,
            sync_hook(|ctx| {
                let id = {
                    let slot = ctx.shared(REQUEST_ID_COUNTER)?;
                    let mut counter = slot.write::<u64>()?;
                    *counter += 1;
                    *counter
                };
                ctx.set_field(REQUEST_ID_FIELD, id);
                Ok(Flow::Continue)
            }),
        );
        Ok(())
    }

    fn identity(&self) -> Option<FragmentIdentity> {
        Some(FragmentIdentity::named("request-id"))
    }

    fn label(&self) -> &str {
        "request-id"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_compose::assembly::Pipeline;
    use trellis_compose::context::Request;
    use trellis_compose::hook::Response;
    use trellis_compose::route::{RouteSpec, sync_handler};

    #[tokio::test]
    async fn stamps_sequential_ids() {
        let mut pipeline = Pipeline::new();
        pipeline.mount(RequestIdFragment).unwrap();
        pipeline
            .configure(|scope| {
                scope.route(RouteSpec::get(
                    "/id",
                    sync_handler(|ctx| {
                        let id = ctx
                            .field::<u64>(REQUEST_ID_FIELD)
                            .copied()
                            .unwrap_or_default();
                        Ok(Response::new(200).with_payload(id.to_string()))
                    }),
                ))
            })
            .unwrap();
        let app = pipeline.finalize();
        let route = &app.routes()[0];

        let first = route.dispatch(Request::new("GET", "/id")).await;
        let second = route.dispatch(Request::new("GET", "/id")).await;
        assert_eq!(first.payload, b"1");
        assert_eq!(second.payload, b"2");
    }

    #[test]
    fn is_named_for_deduplication() {
        let identity = RequestIdFragment.identity().unwrap();
        assert_eq!(identity.name(), "request-id");
    }
}
