// src/error.rs
use axum::{http::StatusCode, response::Html, response::IntoResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro ao renderizar template: {0}")]
    Template(#[from] askama::Error),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    #[error("Dados inválidos: {0}")]
    Validation(String),

    #[error("Falha no upload: {0}")]
    Upload(String),

    #[error("Não encontrado: {0}")]
    NotFound(String),

    #[error("Erro interno inesperado")]
    InternalServerError,

    #[error("Não autorizado")]
    Unauthorized,
}

impl AppError {
    /// Verdadeiro quando o erro veio de uma restrição UNIQUE da base de dados.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::SqlxError(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }

    /// Mensagem que pode ser mostrada ao utilizador num redirect com `?error=`.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Upload(msg) => msg.clone(),
            AppError::NotFound(what) => format!("{} não encontrado.", what),
            AppError::InvalidCredentials => "Email ou senha inválidos.".to_string(),
            _ => "Ocorreu um erro ao gravar os dados.".to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Junta as mensagens dos campos numa frase só
        let mut mensagens: Vec<String> = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Campo inválido ({})", e.code))
            })
            .collect();
        mensagens.sort();
        mensagens.dedup();
        AppError::Validation(mensagens.join(" "))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("Erro processado: {:?}", self);

        let (status, user_message) = match &self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao aceder aos dados.".to_string())
            }
            AppError::Config(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro de configuração.".to_string())
            }
            AppError::PasswordHashingError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao processar credenciais.".to_string())
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Email ou senha inválidos.".to_string())
            }
            AppError::SessionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro na gestão da sua sessão.".to_string())
            }
            AppError::Validation(msg) | AppError::Upload(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.user_message()),
            AppError::Unauthorized => {
                (StatusCode::FORBIDDEN, "Acesso restrito a Administradores.".to_string())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string()),
        };

        let message = html_escape(&user_message);
        (status, Html(format!(r#"
            <!DOCTYPE html><html lang="pt-BR"><head><meta charset="utf-8"><title>Erro</title><style>body{{font-family:sans-serif;}}</style></head>
            <body><h1>Erro {status_code}</h1><p>{message}</p><a href="javascript:history.back()">Voltar</a></body></html>
         "#, status_code = status.as_u16(), message = message))).into_response()
    }
}

fn html_escape(texto: &str) -> String {
    texto
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub type AppResult<T = ()> = Result<T, AppError>;
