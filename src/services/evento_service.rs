// src/services/evento_service.rs
use crate::{
    error::{AppError, AppResult},
    models::evento::{Evento, EventoComContagem, EventoDados},
};
use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

const EVENTO_COLUMNS: &str =
    "e.id, e.titulo, e.data_hora, e.local, e.descricao, e.valor, e.arquivo_url";

pub async fn find_evento_by_id(db_pool: &SqlitePool, evento_id: &str) -> AppResult<Option<Evento>> {
    let evento = sqlx::query_as::<_, Evento>(&format!(
        "SELECT {} FROM eventos e WHERE e.id = ?1",
        EVENTO_COLUMNS
    ))
    .bind(evento_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(evento)
}

/// Eventos por data, com quantos alunos estão inscritos em cada um.
pub async fn list_eventos_com_contagem(db_pool: &SqlitePool) -> AppResult<Vec<EventoComContagem>> {
    let eventos = sqlx::query_as::<_, EventoComContagem>(&format!(
        r#"
        SELECT {}, COUNT(i.id) AS qtd_inscritos
        FROM eventos e
        LEFT JOIN inscricoes i ON i.evento_id = e.id
        GROUP BY e.id
        ORDER BY e.data_hora ASC
        "#,
        EVENTO_COLUMNS
    ))
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Encontrados {} eventos.", eventos.len());
    Ok(eventos)
}

/// Eventos a partir de `agora` (painel dos responsáveis).
pub async fn list_proximos_eventos(db_pool: &SqlitePool, agora: NaiveDateTime) -> AppResult<Vec<Evento>> {
    let eventos = sqlx::query_as::<_, Evento>(&format!(
        "SELECT {} FROM eventos e WHERE e.data_hora >= ?1 ORDER BY e.data_hora ASC",
        EVENTO_COLUMNS
    ))
    .bind(agora)
    .fetch_all(db_pool)
    .await?;
    Ok(eventos)
}

pub async fn create_evento(
    db_pool: &SqlitePool,
    dados: &EventoDados,
    arquivo_url: Option<&str>,
) -> AppResult<Evento> {
    dados.validate()?;

    let id = Uuid::new_v4().to_string();
    tracing::info!("Criando evento '{}' em {}", dados.titulo, dados.data_hora);

    sqlx::query(
        r#"
        INSERT INTO eventos (id, titulo, data_hora, local, descricao, valor, arquivo_url)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&id)
    .bind(dados.titulo.trim())
    .bind(dados.data_hora)
    .bind(dados.local.trim())
    .bind(&dados.descricao)
    .bind(dados.valor)
    .bind(arquivo_url)
    .execute(db_pool)
    .await?;

    tracing::info!("✅ Evento {} criado.", id);
    find_evento_by_id(db_pool, &id)
        .await?
        .ok_or(AppError::InternalServerError)
}

/// Apaga as inscrições do evento e depois o evento, em passos separados.
pub async fn delete_evento(db_pool: &SqlitePool, evento_id: &str) -> AppResult<()> {
    tracing::info!("Removendo evento {}", evento_id);

    sqlx::query("DELETE FROM inscricoes WHERE evento_id = ?1")
        .bind(evento_id)
        .execute(db_pool)
        .await?;

    let rows_affected = sqlx::query("DELETE FROM eventos WHERE id = ?1")
        .bind(evento_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        return Err(AppError::NotFound("Evento".into()));
    }
    Ok(())
}
