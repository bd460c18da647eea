// src/web/api_handlers.rs
use crate::{
    error::AppResult,
    services::notificacao_service::{self, ResultadoAvisos},
    state::AppState,
    web::hoje,
};
use axum::{extract::State, Json};

// GET /api/notificacoes
pub async fn handle_notificacoes(State(state): State<AppState>) -> AppResult<Json<ResultadoAvisos>> {
    let resultado = notificacao_service::avisar_devedores(&state.db_pool, hoje()).await?;
    tracing::info!("Avisos de cobrança registados: {}", resultado.avisados);
    Ok(Json(resultado))
}
