use axum::response::Html;

/// The operator page with the trayecto form.
#[axum_macros::debug_handler]
pub(crate) async fn index() -> Html<&'static str> {
    Html(include_str!("../res/index.html"))
}
