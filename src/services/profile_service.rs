// src/services/profile_service.rs
use crate::{
    error::{AppError, AppResult},
    models::profile::{Profile, ResponsavelResumo},
};
use sqlx::SqlitePool;
use uuid::Uuid;

const PROFILE_COLUMNS: &str =
    "id, email, password_hash, full_name, telefone, is_admin";

/// Busca um perfil pelo seu ID.
pub async fn find_profile_by_id(db_pool: &SqlitePool, profile_id: &str) -> AppResult<Option<Profile>> {
    tracing::debug!("Buscando perfil por ID: {}", profile_id);
    let profile = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM profiles WHERE id = ?1",
        PROFILE_COLUMNS
    ))
    .bind(profile_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(profile)
}

/// Busca um perfil pelo email (a coluna é COLLATE NOCASE).
pub async fn find_profile_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<Profile>> {
    tracing::debug!("Buscando perfil por email: {}", email);
    let profile = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM profiles WHERE email = ?1",
        PROFILE_COLUMNS
    ))
    .bind(email.trim())
    .fetch_optional(db_pool)
    .await?;
    Ok(profile)
}

pub async fn create_profile(
    db_pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    full_name: &str,
    telefone: Option<&str>,
) -> AppResult<Profile> {
    let id = Uuid::new_v4().to_string();
    tracing::info!("Criando perfil '{}' ({})", email, id);

    sqlx::query(
        r#"
        INSERT INTO profiles (id, email, password_hash, full_name, telefone)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&id)
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .bind(telefone)
    .execute(db_pool)
    .await?;

    find_profile_by_id(db_pool, &id)
        .await?
        .ok_or(AppError::InternalServerError)
}

/// O responsável atualiza o próprio nome e telefone.
pub async fn update_profile(
    db_pool: &SqlitePool,
    profile_id: &str,
    full_name: &str,
    telefone: Option<&str>,
) -> AppResult<()> {
    tracing::info!("Atualizando perfil {}", profile_id);
    let rows_affected = sqlx::query("UPDATE profiles SET full_name = ?1, telefone = ?2 WHERE id = ?3")
        .bind(full_name)
        .bind(telefone)
        .bind(profile_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Perfil '{}' não encontrado ao atualizar.", profile_id);
        return Err(AppError::NotFound("Perfil".into()));
    }
    Ok(())
}

/// Lista de responsáveis com o número de alunos de cada um.
pub async fn list_responsaveis(db_pool: &SqlitePool) -> AppResult<Vec<ResponsavelResumo>> {
    let lista = sqlx::query_as::<_, ResponsavelResumo>(
        r#"
        SELECT p.id, p.email, p.full_name, p.telefone, p.is_admin,
               COUNT(a.id) AS qtd_alunos
        FROM profiles p
        LEFT JOIN alunos a ON a.responsavel_id = p.id
        GROUP BY p.id
        ORDER BY p.full_name ASC, p.email ASC
        "#,
    )
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Encontrados {} responsáveis.", lista.len());
    Ok(lista)
}

pub async fn set_admin(db_pool: &SqlitePool, profile_id: &str, is_admin: bool) -> AppResult<()> {
    tracing::info!("Definindo is_admin={} para {}", is_admin, profile_id);
    let rows_affected = sqlx::query("UPDATE profiles SET is_admin = ?1 WHERE id = ?2")
        .bind(is_admin)
        .bind(profile_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        return Err(AppError::NotFound("Perfil".into()));
    }
    Ok(())
}

/// Alterna o papel de admin de outro perfil; um admin não pode retirar o próprio acesso.
pub async fn toggle_admin(db_pool: &SqlitePool, acting_admin_id: &str, profile_id: &str) -> AppResult<bool> {
    if acting_admin_id == profile_id {
        return Err(AppError::Validation(
            "Não pode alterar o seu próprio acesso de administrador.".into(),
        ));
    }
    let profile = find_profile_by_id(db_pool, profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Perfil".into()))?;
    let novo = !profile.is_admin;
    set_admin(db_pool, profile_id, novo).await?;
    Ok(novo)
}

/// Promove a admin o perfil com o email configurado em ADMIN_EMAIL (se já existir).
pub async fn ensure_admin(db_pool: &SqlitePool, email: &str) -> AppResult<bool> {
    match find_profile_by_email(db_pool, email).await? {
        Some(profile) if profile.is_admin => Ok(true),
        Some(profile) => {
            set_admin(db_pool, &profile.id, true).await?;
            tracing::info!("✅ Perfil '{}' promovido a administrador.", email);
            Ok(true)
        }
        None => {
            tracing::warn!("ADMIN_EMAIL '{}' ainda não tem conta; nada a promover.", email);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{seed_aluno, seed_profile, setup_test_db};

    #[tokio::test]
    async fn busca_por_email_ignora_maiusculas() {
        let pool = setup_test_db().await;
        let p = seed_profile(&pool, "ana@example.com", "Ana").await;

        let achado = find_profile_by_email(&pool, "ANA@example.com").await.unwrap().unwrap();
        assert_eq!(achado.id, p.id);
    }

    #[tokio::test]
    async fn atualiza_perfil() {
        let pool = setup_test_db().await;
        let p = seed_profile(&pool, "ana@example.com", "Ana").await;

        update_profile(&pool, &p.id, "Ana Paula", Some("11 98888-0000")).await.unwrap();
        let atualizado = find_profile_by_id(&pool, &p.id).await.unwrap().unwrap();
        assert_eq!(atualizado.full_name, "Ana Paula");
        assert_eq!(atualizado.telefone.as_deref(), Some("11 98888-0000"));

        assert!(matches!(
            update_profile(&pool, "inexistente", "X", None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn lista_responsaveis_com_contagem() {
        let pool = setup_test_db().await;
        let ana = seed_profile(&pool, "ana@example.com", "Ana").await;
        seed_profile(&pool, "bruno@example.com", "Bruno").await;
        seed_aluno(&pool, &ana.id, "Pedro").await;
        seed_aluno(&pool, &ana.id, "Paula").await;

        let lista = list_responsaveis(&pool).await.unwrap();
        assert_eq!(lista.len(), 2);
        assert_eq!(lista[0].full_name, "Ana");
        assert_eq!(lista[0].qtd_alunos, 2);
        assert_eq!(lista[1].qtd_alunos, 0);
    }

    #[tokio::test]
    async fn toggle_admin_nao_se_aplica_a_si_proprio() {
        let pool = setup_test_db().await;
        let admin = seed_profile(&pool, "admin@example.com", "Admin").await;
        let outro = seed_profile(&pool, "bruno@example.com", "Bruno").await;

        assert!(toggle_admin(&pool, &admin.id, &outro.id).await.unwrap());
        assert!(!toggle_admin(&pool, &admin.id, &outro.id).await.unwrap());
        assert!(matches!(
            toggle_admin(&pool, &admin.id, &admin.id).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn ensure_admin_promove_email_configurado() {
        let pool = setup_test_db().await;
        seed_profile(&pool, "dono@example.com", "Dono").await;

        assert!(ensure_admin(&pool, "dono@example.com").await.unwrap());
        assert!(find_profile_by_email(&pool, "dono@example.com").await.unwrap().unwrap().is_admin);
        assert!(!ensure_admin(&pool, "ninguem@example.com").await.unwrap());
    }
}
