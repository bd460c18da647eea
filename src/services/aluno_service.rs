// src/services/aluno_service.rs
use crate::{
    error::{AppError, AppResult},
    models::aluno::{Aluno, AlunoComResponsavel, AlunoDados},
};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

const ALUNO_COLUMNS: &str = "a.id, a.responsavel_id, a.nome, a.data_nascimento, a.posicao, \
     a.endereco, a.foto_url, a.data_inicio_pagamento";

pub async fn find_aluno_by_id(db_pool: &SqlitePool, aluno_id: &str) -> AppResult<Option<Aluno>> {
    tracing::debug!("Buscando aluno {}", aluno_id);
    let aluno = sqlx::query_as::<_, Aluno>(&format!(
        "SELECT {} FROM alunos a WHERE a.id = ?1",
        ALUNO_COLUMNS
    ))
    .bind(aluno_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(aluno)
}

/// Aluno do responsável indicado. Um aluno de outra família conta como inexistente.
pub async fn find_aluno_do_responsavel(
    db_pool: &SqlitePool,
    responsavel_id: &str,
    aluno_id: &str,
) -> AppResult<Aluno> {
    match find_aluno_by_id(db_pool, aluno_id).await? {
        Some(aluno) if aluno.responsavel_id == responsavel_id => Ok(aluno),
        Some(_) => {
            tracing::warn!(
                "Responsável {} tentou aceder ao aluno {} de outra família.",
                responsavel_id,
                aluno_id
            );
            Err(AppError::NotFound("Aluno".into()))
        }
        None => Err(AppError::NotFound("Aluno".into())),
    }
}

pub async fn find_aluno_com_responsavel(
    db_pool: &SqlitePool,
    aluno_id: &str,
) -> AppResult<Option<AlunoComResponsavel>> {
    let aluno = sqlx::query_as::<_, AlunoComResponsavel>(&format!(
        r#"
        SELECT {}, p.full_name AS responsavel_nome, p.email AS responsavel_email,
               p.telefone AS responsavel_telefone
        FROM alunos a
        JOIN profiles p ON p.id = a.responsavel_id
        WHERE a.id = ?1
        "#,
        ALUNO_COLUMNS
    ))
    .bind(aluno_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(aluno)
}

/// Alunos de um responsável, por nome.
pub async fn list_alunos_do_responsavel(db_pool: &SqlitePool, responsavel_id: &str) -> AppResult<Vec<Aluno>> {
    let alunos = sqlx::query_as::<_, Aluno>(&format!(
        "SELECT {} FROM alunos a WHERE a.responsavel_id = ?1 ORDER BY a.nome ASC",
        ALUNO_COLUMNS
    ))
    .bind(responsavel_id)
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Responsável {} tem {} alunos.", responsavel_id, alunos.len());
    Ok(alunos)
}

/// Todos os alunos com os dados do responsável, por nome (aba "alunos" do admin).
pub async fn list_alunos_com_responsavel(db_pool: &SqlitePool) -> AppResult<Vec<AlunoComResponsavel>> {
    let alunos = sqlx::query_as::<_, AlunoComResponsavel>(&format!(
        r#"
        SELECT {}, p.full_name AS responsavel_nome, p.email AS responsavel_email,
               p.telefone AS responsavel_telefone
        FROM alunos a
        JOIN profiles p ON p.id = a.responsavel_id
        ORDER BY a.nome ASC
        "#,
        ALUNO_COLUMNS
    ))
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Encontrados {} alunos.", alunos.len());
    Ok(alunos)
}

/// Matrícula de um aluno.
pub async fn create_aluno(
    db_pool: &SqlitePool,
    responsavel_id: &str,
    dados: &AlunoDados,
    foto_url: Option<&str>,
) -> AppResult<Aluno> {
    dados.validate()?;

    let id = Uuid::new_v4().to_string();
    tracing::info!("Matriculando aluno '{}' para responsável {}", dados.nome, responsavel_id);

    sqlx::query(
        r#"
        INSERT INTO alunos (id, responsavel_id, nome, data_nascimento, posicao, endereco,
                            foto_url, data_inicio_pagamento)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&id)
    .bind(responsavel_id)
    .bind(dados.nome.trim())
    .bind(dados.data_nascimento)
    .bind(&dados.posicao)
    .bind(&dados.endereco)
    .bind(foto_url)
    .bind(dados.data_inicio_pagamento)
    .execute(db_pool)
    .await?;

    tracing::info!("✅ Aluno {} matriculado.", id);
    find_aluno_by_id(db_pool, &id)
        .await?
        .ok_or(AppError::InternalServerError)
}

/// Atualiza os dados do aluno; a foto só é trocada quando vem uma nova.
pub async fn update_aluno(
    db_pool: &SqlitePool,
    aluno_id: &str,
    dados: &AlunoDados,
    nova_foto_url: Option<&str>,
) -> AppResult<()> {
    dados.validate()?;
    tracing::info!("Atualizando aluno {}", aluno_id);

    let rows_affected = sqlx::query(
        r#"
        UPDATE alunos
        SET nome = ?1,
            data_nascimento = ?2,
            posicao = ?3,
            endereco = ?4,
            data_inicio_pagamento = ?5,
            foto_url = COALESCE(?6, foto_url)
        WHERE id = ?7
        "#,
    )
    .bind(dados.nome.trim())
    .bind(dados.data_nascimento)
    .bind(&dados.posicao)
    .bind(&dados.endereco)
    .bind(dados.data_inicio_pagamento)
    .bind(nova_foto_url)
    .bind(aluno_id)
    .execute(db_pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Falha ao atualizar: aluno '{}' não encontrado.", aluno_id);
        return Err(AppError::NotFound("Aluno".into()));
    }
    Ok(())
}

/// Remove o aluno e o seu histórico: inscrições, depois mensalidades, depois o aluno.
/// Os passos são independentes (sem transação); uma falha a meio deixa linhas órfãs.
pub async fn delete_aluno(db_pool: &SqlitePool, aluno_id: &str) -> AppResult<()> {
    tracing::info!("Removendo aluno {} e o seu histórico", aluno_id);

    // 1. Inscrições em eventos
    let inscricoes = sqlx::query("DELETE FROM inscricoes WHERE aluno_id = ?1")
        .bind(aluno_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    // 2. Mensalidades
    let mensalidades = sqlx::query("DELETE FROM mensalidades WHERE aluno_id = ?1")
        .bind(aluno_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    // 3. O próprio aluno
    let alunos = sqlx::query("DELETE FROM alunos WHERE id = ?1")
        .bind(aluno_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if alunos == 0 {
        return Err(AppError::NotFound("Aluno".into()));
    }
    tracing::info!(
        "🗑️ Aluno {} removido ({} inscrições, {} mensalidades).",
        aluno_id,
        inscricoes,
        mensalidades
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{seed_aluno, seed_evento, seed_mensalidade, seed_profile, setup_test_db};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn matricula_e_lista_por_responsavel() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        let bruno = seed_profile(&pool, "bruno@example.com", "Bruno").await;
        seed_aluno(&pool, &ana.id, "Zeca").await;
        seed_aluno(&pool, &ana.id, "Bia").await;
        seed_aluno(&pool, &bruno.id, "Caio").await;

        let da_ana = list_alunos_do_responsavel(&pool, &ana.id).await.unwrap();
        let nomes: Vec<&str> = da_ana.iter().map(|a| a.nome.as_str()).collect();
        assert_eq!(nomes, vec!["Bia", "Zeca"]);

        let todos = list_alunos_com_responsavel(&pool).await.unwrap();
        assert_eq!(todos.len(), 3);
        assert_eq!(todos[1].aluno.nome, "Caio");
        assert_eq!(todos[1].responsavel_nome, "Bruno");
    }

    #[tokio::test]
    async fn matricula_exige_nome() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        let err = create_aluno(&pool, &ana.id, &AlunoDados::default(), None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn aluno_de_outra_familia_nao_e_visivel() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        let bruno = seed_profile(&pool, "bruno@example.com", "Bruno").await;
        let aluno = seed_aluno(&pool, &ana.id, "Zeca").await;

        assert!(find_aluno_do_responsavel(&pool, &ana.id, &aluno.id).await.is_ok());
        assert!(matches!(
            find_aluno_do_responsavel(&pool, &bruno.id, &aluno.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn atualizar_mantem_foto_quando_nao_ha_nova() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        let dados = AlunoDados {
            nome: "Zeca".into(),
            ..AlunoDados::default()
        };
        let aluno = create_aluno(&pool, &ana.id, &dados, Some("/uploads/fotos/a.png")).await.unwrap();

        let novos = AlunoDados {
            nome: "Zeca Silva".into(),
            posicao: Some("Atacante".into()),
            ..AlunoDados::default()
        };
        update_aluno(&pool, &aluno.id, &novos, None).await.unwrap();
        let lido = find_aluno_by_id(&pool, &aluno.id).await.unwrap().unwrap();
        assert_eq!(lido.nome, "Zeca Silva");
        assert_eq!(lido.foto_url.as_deref(), Some("/uploads/fotos/a.png"));

        update_aluno(&pool, &aluno.id, &novos, Some("/uploads/fotos/b.png")).await.unwrap();
        let lido = find_aluno_by_id(&pool, &aluno.id).await.unwrap().unwrap();
        assert_eq!(lido.foto_url.as_deref(), Some("/uploads/fotos/b.png"));
    }

    #[tokio::test]
    async fn remover_aluno_apaga_historico() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        let aluno = seed_aluno(&pool, &ana.id, "Zeca").await;
        let evento = seed_evento(&pool, "Copa", "2026-11-20T09:00").await;
        crate::services::inscricao_service::inscrever(&pool, &aluno.id, &evento.id).await.unwrap();
        let mes = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        seed_mensalidade(&pool, &aluno.id, mes, NaiveDate::from_ymd_opt(2026, 10, 10).unwrap()).await;

        delete_aluno(&pool, &aluno.id).await.unwrap();

        assert!(find_aluno_by_id(&pool, &aluno.id).await.unwrap().is_none());
        let restantes: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM inscricoes) + (SELECT COUNT(*) FROM mensalidades)",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(restantes, 0);

        assert!(matches!(delete_aluno(&pool, &aluno.id).await, Err(AppError::NotFound(_))));
    }
}
