// src/test_utils.rs
// Ajudantes para os testes: base de dados em memória e dados de exemplo.
use crate::{
    config::Config,
    models::{
        aluno::{Aluno, AlunoDados},
        evento::{Evento, EventoDados},
        mensalidade::Mensalidade,
        profile::Profile,
    },
    services::{aluno_service, evento_service, mensalidade_service, profile_service},
    state::AppState,
};
use chrono::NaiveDate;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub(crate) const STANDARD_PASSWORD: &str = "segredo123";

pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Pool em memória com uma única conexão (cada conexão `:memory:` é uma base nova).
pub(crate) async fn setup_test_db() -> SqlitePool {
    init_test_tracing();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Falha ao criar base em memória");
    crate::db::run_migrations(&pool)
        .await
        .expect("Falha ao executar migrações");
    pool
}

pub(crate) fn test_config(upload_dir: &std::path::Path) -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        session_secret: "x".repeat(64),
        bind_addr: "127.0.0.1:0".parse().expect("endereço de teste"),
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: 1024 * 1024,
        escola_nome: "Escolinha Teste".into(),
        escola_whatsapp: Some("11 3333-4444".into()),
        admin_email: None,
        dia_vencimento: 10,
        secure_cookies: false,
    }
}

pub(crate) async fn test_state() -> AppState {
    let pool = setup_test_db().await;
    let upload_dir = std::env::temp_dir().join(format!("escolinha-test-{}", uuid::Uuid::new_v4()));
    AppState {
        db_pool: pool,
        config: Arc::new(test_config(&upload_dir)),
    }
}

pub(crate) async fn seed_profile(pool: &SqlitePool, email: &str, full_name: &str) -> Profile {
    let hash = crate::services::auth_service::hash_password(STANDARD_PASSWORD)
        .await
        .expect("hash");
    profile_service::create_profile(pool, email, &hash, full_name, Some("11 98888-7777"))
        .await
        .expect("Falha ao criar perfil de teste")
}

pub(crate) async fn seed_admin(pool: &SqlitePool, email: &str) -> Profile {
    let profile = seed_profile(pool, email, "Administrador").await;
    profile_service::set_admin(pool, &profile.id, true)
        .await
        .expect("Falha ao promover admin");
    Profile { is_admin: true, ..profile }
}

pub(crate) async fn seed_aluno(pool: &SqlitePool, responsavel_id: &str, nome: &str) -> Aluno {
    let dados = AlunoDados {
        nome: nome.to_string(),
        data_nascimento: NaiveDate::from_ymd_opt(2015, 6, 15),
        posicao: Some("Meio-campo".into()),
        endereco: Some("Rua das Flores, 10".into()),
        data_inicio_pagamento: NaiveDate::from_ymd_opt(2026, 1, 1),
    };
    aluno_service::create_aluno(pool, responsavel_id, &dados, None)
        .await
        .expect("Falha ao criar aluno de teste")
}

pub(crate) async fn seed_evento(pool: &SqlitePool, titulo: &str, data_hora: &str) -> Evento {
    let dados = EventoDados {
        titulo: titulo.to_string(),
        data_hora: crate::models::evento::parse_data_hora(data_hora).expect("data_hora de teste"),
        local: "Ginásio Municipal".into(),
        descricao: None,
        valor: 50.0,
    };
    evento_service::create_evento(pool, &dados, None)
        .await
        .expect("Falha ao criar evento de teste")
}

pub(crate) async fn seed_mensalidade(
    pool: &SqlitePool,
    aluno_id: &str,
    mes: NaiveDate,
    vencimento: NaiveDate,
) -> Mensalidade {
    mensalidade_service::create_mensalidade(pool, aluno_id, mes, vencimento, 150.0)
        .await
        .expect("Falha ao criar mensalidade de teste")
}
