// src/web/mw_admin.rs
use crate::{
    error::AppError,
    services::profile_service,
    state::AppState,
    web::mw_auth::UserId,
};
use axum::{
    extract::{Extension, Request, State},
    middleware::Next,
    response::Response,
};

/// Só deixa passar perfis com `is_admin`. Corre depois de `require_auth`.
pub async fn require_admin(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match profile_service::find_profile_by_id(&state.db_pool, &user_id).await? {
        Some(profile) if profile.is_admin => {
            tracing::debug!("Admin MW: acesso concedido para {}", user_id);
            Ok(next.run(request).await)
        }
        Some(_) => {
            tracing::warn!("Admin MW: acesso negado para {} (não é admin).", user_id);
            Err(AppError::Unauthorized)
        }
        None => {
            // Sessão aponta para um perfil que já não existe
            tracing::warn!("Admin MW: perfil {} da sessão não existe.", user_id);
            Err(AppError::Unauthorized)
        }
    }
}
