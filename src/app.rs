use crate::handlers;
use crate::models::{Activity, Client, Contact, Task};
use crate::state::AppState;
use crate::store::Resource;
use crate::views::EntityView;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(handlers::dashboard))
        .route("/api/stats", get(handlers::get_stats));

    let router = resource::<Client>(router);
    let router = resource::<Contact>(router);
    let router = resource::<Activity>(router);
    let router = resource::<Task>(router);

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// JSON endpoints plus the screen, list fragment and edit form routes of one entity.
fn resource<E: Resource + EntityView>(router: Router<AppState>) -> Router<AppState> {
    router
        .route(E::ENDPOINT, get(handlers::list::<E>).post(handlers::create::<E>))
        .route(
            &format!("{}/:id", E::ENDPOINT),
            get(handlers::fetch::<E>)
                .put(handlers::update::<E>)
                .delete(handlers::delete::<E>),
        )
        .route(E::SCREEN, get(handlers::screen::<E>))
        .route(&format!("{}/table", E::SCREEN), get(handlers::table::<E>))
        .route(&format!("{}/:id/form", E::SCREEN), get(handlers::form::<E>))
}
