// src/services/inscricao_service.rs
use crate::{
    error::{AppError, AppResult},
    models::inscricao::{InscricaoDoAluno, InscritoEvento},
};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Inscreve um aluno num evento. A base recusa duplicados (UNIQUE aluno_id, evento_id);
/// o erro sobe tal como vem e quem chama mostra uma mensagem genérica. Devolve o id.
pub async fn inscrever(db_pool: &SqlitePool, aluno_id: &str, evento_id: &str) -> AppResult<String> {
    let id = Uuid::new_v4().to_string();
    tracing::info!("Inscrevendo aluno {} no evento {}", aluno_id, evento_id);

    sqlx::query("INSERT INTO inscricoes (id, aluno_id, evento_id, pago) VALUES (?1, ?2, ?3, 0)")
        .bind(&id)
        .bind(aluno_id)
        .bind(evento_id)
        .execute(db_pool)
        .await?;

    Ok(id)
}

pub async fn list_inscricoes_do_aluno(db_pool: &SqlitePool, aluno_id: &str) -> AppResult<Vec<InscricaoDoAluno>> {
    let inscricoes = sqlx::query_as::<_, InscricaoDoAluno>(
        r#"
        SELECT e.id AS evento_id, e.titulo AS evento_titulo,
               e.data_hora, e.valor, i.pago
        FROM inscricoes i
        JOIN eventos e ON e.id = i.evento_id
        WHERE i.aluno_id = ?1
        ORDER BY e.data_hora ASC
        "#,
    )
    .bind(aluno_id)
    .fetch_all(db_pool)
    .await?;
    Ok(inscricoes)
}

pub async fn list_inscritos_do_evento(db_pool: &SqlitePool, evento_id: &str) -> AppResult<Vec<InscritoEvento>> {
    let inscritos = sqlx::query_as::<_, InscritoEvento>(
        r#"
        SELECT i.id AS inscricao_id, a.id AS aluno_id, a.nome AS aluno_nome,
               p.full_name AS responsavel_nome, p.telefone AS responsavel_telefone, i.pago
        FROM inscricoes i
        JOIN alunos a ON a.id = i.aluno_id
        JOIN profiles p ON p.id = a.responsavel_id
        WHERE i.evento_id = ?1
        ORDER BY a.nome ASC
        "#,
    )
    .bind(evento_id)
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Evento {} tem {} inscritos.", evento_id, inscritos.len());
    Ok(inscritos)
}

/// Alterna o indicador de pagamento da inscrição. Devolve o evento e o novo valor.
pub async fn toggle_pago(db_pool: &SqlitePool, inscricao_id: &str) -> AppResult<(String, bool)> {
    let (evento_id, pago) = sqlx::query_as::<_, (String, bool)>(
        "SELECT evento_id, pago FROM inscricoes WHERE id = ?1",
    )
    .bind(inscricao_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Inscrição".into()))?;

    let novo = !pago;
    sqlx::query("UPDATE inscricoes SET pago = ?1 WHERE id = ?2")
        .bind(novo)
        .bind(inscricao_id)
        .execute(db_pool)
        .await?;

    tracing::info!("Inscrição {} marcada como pago={}", inscricao_id, novo);
    Ok((evento_id, novo))
}
