// src/web/routes.rs
use crate::{
    services::storage_service::PUBLIC_PREFIX,
    state::AppState,
    web::{admin_handlers, api_handlers, auth_handlers, dashboard_handlers, mw_admin, mw_auth},
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::Redirect,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

// Folga para os campos de texto que vêm junto com o ficheiro
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/", get(|| async { Redirect::permanent("/login") }))
        .route("/login", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route("/cadastro", post(auth_handlers::handle_signup))
        .route("/logout", get(auth_handlers::handle_logout))
        .route("/api/notificacoes", get(api_handlers::handle_notificacoes))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&app_state.config.upload_dir));

    // --- Rotas de Admin --- (login + is_admin)
    let admin_routes = Router::new()
        .route("/", get(admin_handlers::show_admin_page))
        .route("/alunos/{id}", get(admin_handlers::show_aluno_detalhe))
        .route("/alunos/{id}/carteirinha", get(admin_handlers::show_aluno_carteirinha))
        .route("/alunos/{id}/excluir", post(admin_handlers::handle_delete_aluno))
        .route("/eventos", post(admin_handlers::handle_create_evento))
        .route("/eventos/{id}", get(admin_handlers::show_evento_detalhe))
        .route("/eventos/{id}/excluir", post(admin_handlers::handle_delete_evento))
        .route("/inscricoes/{id}/pago", post(admin_handlers::handle_toggle_inscricao_pago))
        .route("/mensalidades", post(admin_handlers::handle_create_mensalidade))
        .route("/mensalidades/gerar", post(admin_handlers::handle_gerar_mensalidades))
        .route("/mensalidades/{id}/status", post(admin_handlers::handle_toggle_mensalidade))
        .route("/mensalidades/{id}/excluir", post(admin_handlers::handle_delete_mensalidade))
        .route("/responsaveis/{id}/admin", post(admin_handlers::handle_toggle_admin))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_admin::require_admin,
        ));

    // --- Rotas Autenticadas ---
    let authenticated_routes = Router::new()
        .route("/dashboard", get(dashboard_handlers::show_dashboard))
        .route("/dashboard/alunos", post(dashboard_handlers::handle_create_aluno))
        .route("/dashboard/alunos/{id}", post(dashboard_handlers::handle_update_aluno))
        .route("/dashboard/alunos/{id}/carteirinha", get(dashboard_handlers::show_carteirinha))
        .route("/dashboard/inscricoes", post(dashboard_handlers::handle_inscricao))
        .route("/dashboard/perfil", post(dashboard_handlers::handle_update_perfil))
        .nest("/admin", admin_routes)
        // require_auth vale para tudo acima, incluindo /admin/*
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    let body_limit = app_state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}
