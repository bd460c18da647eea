// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::profile::{LoginForm, Profile, SignUpForm},
    services::auth_service,
    state::AppState,
    templates::{render, LoginPage},
    web::{mw_auth::SESSION_USER_KEY, FeedbackParams},
};
use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

fn login_page(state: &AppState, email: &str, error: Option<String>, success: Option<String>) -> AppResult<Response> {
    let page = LoginPage {
        escola_nome: state.config.escola_nome.clone(),
        email: email.to_string(),
        error,
        success,
    };
    Ok(render(&page)?.into_response())
}

/// Gera um novo id de sessão e guarda nele o perfil.
async fn iniciar_sessao(session: &Session, profile: &Profile) -> AppResult<()> {
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
    session
        .insert(SESSION_USER_KEY, &profile.id)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;
    Ok(())
}

// GET /login
pub async fn show_login_form(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Response> {
    if session.get::<String>(SESSION_USER_KEY).await.ok().flatten().is_some() {
        tracing::debug!("GET /login: já autenticado, redirecionando para /dashboard");
        return Ok(Redirect::to("/dashboard").into_response());
    }
    login_page(&state, "", params.error, params.success)
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    tracing::info!("Tentativa de login para: {}", form.email);

    match auth_service::sign_in(&state.db_pool, &form.email, &form.password).await {
        Ok(profile) => {
            iniciar_sessao(&session, &profile).await?;
            tracing::info!("✅ Login bem-sucedido para: {}", profile.email);
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(AppError::InvalidCredentials) => login_page(
            &state,
            &form.email,
            Some(AppError::InvalidCredentials.user_message()),
            None,
        ),
        Err(e) => {
            tracing::error!("Erro no login de {}: {:?}", form.email, e);
            Err(e)
        }
    }
}

// POST /cadastro
pub async fn handle_signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> AppResult<Response> {
    tracing::info!("Novo cadastro para: {}", form.email);

    match auth_service::sign_up(&state.db_pool, &form, state.config.admin_email.as_deref()).await {
        Ok(profile) => {
            iniciar_sessao(&session, &profile).await?;
            tracing::info!("✅ Conta criada para {}", profile.email);
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(e @ AppError::Validation(_)) => {
            tracing::warn!("Cadastro recusado para {}: {}", form.email, e);
            login_page(&state, &form.email, Some(e.user_message()), None)
        }
        Err(e) => Err(e),
    }
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    let user_id: Option<String> = session.get(SESSION_USER_KEY).await.ok().flatten();

    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;

    match user_id {
        Some(id) => tracing::info!("🚪 Perfil '{}' saiu.", id),
        None => tracing::info!("🚪 Sessão anónima terminada."),
    }
    Ok(Redirect::to("/login"))
}
