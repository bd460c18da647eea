// src/services/notificacao_service.rs
use crate::{error::AppResult, format, services::mensalidade_service};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Serialize, PartialEq)]
pub struct ResultadoAvisos {
    pub success: bool,
    pub avisados: usize,
}

/// Procura as mensalidades pendentes e vencidas e regista um aviso por cobrança.
/// Não envia emails: é só o ponto de partida para um serviço de envio.
pub async fn avisar_devedores(db_pool: &SqlitePool, hoje: NaiveDate) -> AppResult<ResultadoAvisos> {
    let devedores = mensalidade_service::list_atrasadas(db_pool, hoje).await?;

    for fatura in &devedores {
        tracing::info!(
            "📧 Enviando aviso para {} sobre {} (venceu em {}, {})",
            fatura.responsavel_email,
            fatura.aluno_nome,
            format::data_br(fatura.mensalidade.vencimento),
            format::moeda(fatura.mensalidade.valor)
        );
    }

    Ok(ResultadoAvisos {
        success: true,
        avisados: devedores.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{seed_aluno, seed_mensalidade, seed_profile, setup_test_db};

    #[tokio::test]
    async fn conta_so_as_atrasadas() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        let aluno = seed_aluno(&pool, &ana.id, "Zeca").await;
        let d = |a, m, dia| NaiveDate::from_ymd_opt(a, m, dia).unwrap();
        seed_mensalidade(&pool, &aluno.id, d(2026, 8, 1), d(2026, 8, 10)).await;
        seed_mensalidade(&pool, &aluno.id, d(2026, 9, 1), d(2026, 9, 10)).await;
        seed_mensalidade(&pool, &aluno.id, d(2026, 11, 1), d(2026, 11, 10)).await;

        let resultado = avisar_devedores(&pool, d(2026, 10, 16)).await.unwrap();
        assert_eq!(resultado, ResultadoAvisos { success: true, avisados: 2 });
    }
}
