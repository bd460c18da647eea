// src/web/mod.rs
pub mod admin_handlers;
pub mod api_handlers;
pub mod auth_handlers;
pub mod dashboard_handlers;
pub mod multipart;
pub mod mw_admin;
pub mod mw_auth;
pub mod routes;

use axum::response::Redirect;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Mensagens de feedback vindas da query string (`?success=` / `?error=`).
#[derive(Deserialize, Debug, Default)]
pub struct FeedbackParams {
    pub success: Option<String>,
    pub error: Option<String>,
}

fn com_mensagem(base: &str, chave: &str, mensagem: &str) -> String {
    let separador = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", base, separador, chave, urlencoding::encode(mensagem))
}

/// Post/Redirect/Get com mensagem de sucesso.
pub fn redirect_sucesso(base: &str, mensagem: &str) -> Redirect {
    Redirect::to(&com_mensagem(base, "success", mensagem))
}

/// Post/Redirect/Get com mensagem de erro.
pub fn redirect_erro(base: &str, mensagem: &str) -> Redirect {
    Redirect::to(&com_mensagem(base, "error", mensagem))
}

pub(crate) fn hoje() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn agora() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mensagem_vai_codificada_na_query() {
        assert_eq!(com_mensagem("/admin", "success", "Aluno removido."), "/admin?success=Aluno%20removido.");
        assert_eq!(
            com_mensagem("/admin?aba=eventos", "error", "Falhou & parou"),
            "/admin?aba=eventos&error=Falhou%20%26%20parou"
        );
    }
}
