// src/services/mensalidade_service.rs
use crate::{
    error::{AppError, AppResult},
    format,
    models::mensalidade::{Mensalidade, MensalidadeComAluno, StatusMensalidade},
};
use chrono::{Datelike, NaiveDate};
use sqlx::SqlitePool;
use uuid::Uuid;

const MENSALIDADE_COLUMNS: &str =
    "m.id, m.aluno_id, m.mes_referencia, m.vencimento, m.valor, m.status";

const COM_ALUNO_JOIN: &str = r#"
        FROM mensalidades m
        JOIN alunos a ON a.id = m.aluno_id
        JOIN profiles p ON p.id = a.responsavel_id
"#;

pub async fn find_mensalidade_by_id(db_pool: &SqlitePool, id: &str) -> AppResult<Option<Mensalidade>> {
    let mensalidade = sqlx::query_as::<_, Mensalidade>(&format!(
        "SELECT {} FROM mensalidades m WHERE m.id = ?1",
        MENSALIDADE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(db_pool)
    .await?;
    Ok(mensalidade)
}

/// Cobranças de um aluno, da mais recente para a mais antiga.
pub async fn list_mensalidades_do_aluno(db_pool: &SqlitePool, aluno_id: &str) -> AppResult<Vec<Mensalidade>> {
    let lista = sqlx::query_as::<_, Mensalidade>(&format!(
        "SELECT {} FROM mensalidades m WHERE m.aluno_id = ?1 ORDER BY m.vencimento DESC",
        MENSALIDADE_COLUMNS
    ))
    .bind(aluno_id)
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Aluno {} tem {} mensalidades.", aluno_id, lista.len());
    Ok(lista)
}

/// Controlo geral (aba financeiro): todas as mensalidades, opcionalmente só de um status.
pub async fn list_mensalidades(
    db_pool: &SqlitePool,
    status: Option<StatusMensalidade>,
) -> AppResult<Vec<MensalidadeComAluno>> {
    let lista = sqlx::query_as::<_, MensalidadeComAluno>(&format!(
        r#"
        SELECT {}, a.nome AS aluno_nome, p.full_name AS responsavel_nome,
               p.email AS responsavel_email, p.telefone AS responsavel_telefone
        {}
        WHERE (?1 IS NULL OR m.status = ?1)
        ORDER BY m.vencimento DESC, a.nome ASC
        "#,
        MENSALIDADE_COLUMNS, COM_ALUNO_JOIN
    ))
    .bind(status)
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Encontradas {} mensalidades (filtro: {:?}).", lista.len(), status);
    Ok(lista)
}

/// Pendentes com vencimento anterior a `hoje`.
pub async fn list_atrasadas(db_pool: &SqlitePool, hoje: NaiveDate) -> AppResult<Vec<MensalidadeComAluno>> {
    let lista = sqlx::query_as::<_, MensalidadeComAluno>(&format!(
        r#"
        SELECT {}, a.nome AS aluno_nome, p.full_name AS responsavel_nome,
               p.email AS responsavel_email, p.telefone AS responsavel_telefone
        {}
        WHERE m.status = 'pendente' AND m.vencimento < ?1
        ORDER BY m.vencimento ASC
        "#,
        MENSALIDADE_COLUMNS, COM_ALUNO_JOIN
    ))
    .bind(hoje)
    .fetch_all(db_pool)
    .await?;
    Ok(lista)
}

pub async fn create_mensalidade(
    db_pool: &SqlitePool,
    aluno_id: &str,
    mes_referencia: NaiveDate,
    vencimento: NaiveDate,
    valor: f64,
) -> AppResult<Mensalidade> {
    if !(valor.is_finite() && valor >= 0.0) {
        return Err(AppError::Validation("Valor da mensalidade inválido.".into()));
    }

    let mensalidade = Mensalidade {
        id: Uuid::new_v4().to_string(),
        aluno_id: aluno_id.to_string(),
        mes_referencia: mes_referencia.with_day(1).unwrap_or(mes_referencia),
        vencimento,
        valor,
        status: StatusMensalidade::Pendente,
    };
    tracing::info!(
        "Criando mensalidade de {} para aluno {}",
        format::mes_label(mensalidade.mes_referencia),
        aluno_id
    );

    sqlx::query(
        r#"
        INSERT INTO mensalidades (id, aluno_id, mes_referencia, vencimento, valor, status)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&mensalidade.id)
    .bind(&mensalidade.aluno_id)
    .bind(mensalidade.mes_referencia)
    .bind(mensalidade.vencimento)
    .bind(mensalidade.valor)
    .bind(mensalidade.status)
    .execute(db_pool)
    .await?;

    Ok(mensalidade)
}

/// Gera as mensalidades de um mês para todos os alunos que já devem pagar
/// (início de pagamento vazio ou até ao fim do mês) e que ainda não têm cobrança nesse mês.
/// Devolve quantas foram criadas.
pub async fn gerar_mensalidades_do_mes(
    db_pool: &SqlitePool,
    mes: NaiveDate,
    valor: f64,
    dia_vencimento: u32,
) -> AppResult<usize> {
    if !(valor.is_finite() && valor > 0.0) {
        return Err(AppError::Validation("Informe o valor da mensalidade.".into()));
    }
    let mes = mes.with_day(1).unwrap_or(mes);
    let fim_do_mes = format::ultimo_dia_do_mes(mes);
    let vencimento = format::dia_no_mes(mes, dia_vencimento);
    tracing::info!("Gerando mensalidades de {} (vencimento {})", format::mes_label(mes), vencimento);

    // --- Tudo ou nada: uma falha desfaz o mês inteiro ---
    let mut tx = db_pool.begin().await?;

    // Alunos que já pagam neste mês e ainda sem cobrança
    let alunos: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT a.id FROM alunos a
        WHERE (a.data_inicio_pagamento IS NULL OR a.data_inicio_pagamento <= ?1)
          AND NOT EXISTS (
              SELECT 1 FROM mensalidades m
              WHERE m.aluno_id = a.id AND m.mes_referencia = ?2
          )
        ORDER BY a.nome ASC
        "#,
    )
    .bind(fim_do_mes)
    .bind(mes)
    .fetch_all(&mut *tx)
    .await?;

    // Uma cobrança pendente por aluno
    for aluno_id in &alunos {
        sqlx::query(
            r#"
            INSERT INTO mensalidades (id, aluno_id, mes_referencia, vencimento, valor, status)
            VALUES (?1, ?2, ?3, ?4, ?5, 'pendente')
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(aluno_id)
        .bind(mes)
        .bind(vencimento)
        .bind(valor)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::info!("✅ {} mensalidades geradas para {}.", alunos.len(), format::mes_label(mes));
    Ok(alunos.len())
}

/// Confirmação manual de pagamento (ou desfazer): pendente <-> pago.
pub async fn toggle_status(db_pool: &SqlitePool, id: &str) -> AppResult<StatusMensalidade> {
    let atual = find_mensalidade_by_id(db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Mensalidade".into()))?;
    let novo = atual.status.alternado(); // pendente <-> pago

    sqlx::query("UPDATE mensalidades SET status = ?1 WHERE id = ?2")
        .bind(novo)
        .bind(id)
        .execute(db_pool)
        .await?;

    tracing::info!("Mensalidade {}: {} -> {}", id, atual.status, novo);
    Ok(novo)
}

pub async fn delete_mensalidade(db_pool: &SqlitePool, id: &str) -> AppResult<()> {
    let rows_affected = sqlx::query("DELETE FROM mensalidades WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::NotFound("Mensalidade".into()));
    }
    tracing::info!("🗑️ Mensalidade {} removida.", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::aluno::AlunoDados;
    use crate::services::aluno_service;
    use crate::test_utils::{seed_aluno, seed_mensalidade, seed_profile, setup_test_db};

    fn d(ano: i32, mes: u32, dia: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(ano, mes, dia).unwrap()
    }

    #[tokio::test]
    async fn lista_do_aluno_mais_recente_primeiro() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        let aluno = seed_aluno(&pool, &ana.id, "Zeca").await;
        seed_mensalidade(&pool, &aluno.id, d(2026, 9, 1), d(2026, 9, 10)).await;
        seed_mensalidade(&pool, &aluno.id, d(2026, 10, 1), d(2026, 10, 10)).await;

        let lista = list_mensalidades_do_aluno(&pool, &aluno.id).await.unwrap();
        assert_eq!(lista[0].mes_referencia, d(2026, 10, 1));
        assert_eq!(lista[1].mes_referencia, d(2026, 9, 1));
        assert!(lista.iter().all(|m| m.status == StatusMensalidade::Pendente));
    }

    #[tokio::test]
    async fn mes_de_referencia_fica_no_primeiro_dia() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        let aluno = seed_aluno(&pool, &ana.id, "Zeca").await;
        let m = create_mensalidade(&pool, &aluno.id, d(2026, 10, 17), d(2026, 10, 20), 99.9).await.unwrap();
        assert_eq!(m.mes_referencia, d(2026, 10, 1));

        assert!(matches!(
            create_mensalidade(&pool, &aluno.id, d(2026, 10, 1), d(2026, 10, 20), -1.0).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn alterna_status_e_filtra() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        let aluno = seed_aluno(&pool, &ana.id, "Zeca").await;
        let m1 = seed_mensalidade(&pool, &aluno.id, d(2026, 9, 1), d(2026, 9, 10)).await;
        seed_mensalidade(&pool, &aluno.id, d(2026, 10, 1), d(2026, 10, 10)).await;

        assert_eq!(toggle_status(&pool, &m1.id).await.unwrap(), StatusMensalidade::Pago);

        let pagas = list_mensalidades(&pool, Some(StatusMensalidade::Pago)).await.unwrap();
        assert_eq!(pagas.len(), 1);
        assert_eq!(pagas[0].mensalidade.id, m1.id);
        assert_eq!(pagas[0].aluno_nome, "Zeca");

        assert_eq!(list_mensalidades(&pool, None).await.unwrap().len(), 2);
        assert_eq!(toggle_status(&pool, &m1.id).await.unwrap(), StatusMensalidade::Pendente);
    }

    #[tokio::test]
    async fn atrasadas_sao_pendentes_vencidas() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        let aluno = seed_aluno(&pool, &ana.id, "Zeca").await;
        let vencida = seed_mensalidade(&pool, &aluno.id, d(2026, 9, 1), d(2026, 9, 10)).await;
        let paga = seed_mensalidade(&pool, &aluno.id, d(2026, 8, 1), d(2026, 8, 10)).await;
        seed_mensalidade(&pool, &aluno.id, d(2026, 10, 1), d(2026, 10, 20)).await;
        toggle_status(&pool, &paga.id).await.unwrap();

        let atrasadas = list_atrasadas(&pool, d(2026, 10, 16)).await.unwrap();
        assert_eq!(atrasadas.len(), 1);
        assert_eq!(atrasadas[0].mensalidade.id, vencida.id);
        assert_eq!(atrasadas[0].responsavel_email, "ana@example.com");
    }

    #[tokio::test]
    async fn gerar_mes_respeita_inicio_de_pagamento_e_duplicados() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        // seed_aluno começa a pagar em 2026-01-01
        let zeca = seed_aluno(&pool, &ana.id, "Zeca").await;
        let tardio = AlunoDados {
            nome: "Bia".into(),
            data_inicio_pagamento: Some(d(2026, 12, 5)),
            ..AlunoDados::default()
        };
        aluno_service::create_aluno(&pool, &ana.id, &tardio, None).await.unwrap();
        let sem_inicio = AlunoDados {
            nome: "Caio".into(),
            ..AlunoDados::default()
        };
        aluno_service::create_aluno(&pool, &ana.id, &sem_inicio, None).await.unwrap();

        let criadas = gerar_mensalidades_do_mes(&pool, d(2026, 11, 1), 150.0, 31).await.unwrap();
        assert_eq!(criadas, 2);

        let do_zeca = list_mensalidades_do_aluno(&pool, &zeca.id).await.unwrap();
        assert_eq!(do_zeca[0].vencimento, d(2026, 11, 30));

        // Segunda geração do mesmo mês não duplica
        assert_eq!(gerar_mensalidades_do_mes(&pool, d(2026, 11, 1), 150.0, 10).await.unwrap(), 0);
        // Em dezembro a Bia já entra
        assert_eq!(gerar_mensalidades_do_mes(&pool, d(2026, 12, 1), 150.0, 10).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn remover_mensalidade() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        let aluno = seed_aluno(&pool, &ana.id, "Zeca").await;
        let m = seed_mensalidade(&pool, &aluno.id, d(2026, 9, 1), d(2026, 9, 10)).await;

        delete_mensalidade(&pool, &m.id).await.unwrap();
        assert!(find_mensalidade_by_id(&pool, &m.id).await.unwrap().is_none());
        assert!(matches!(delete_mensalidade(&pool, &m.id).await, Err(AppError::NotFound(_))));
    }
}
