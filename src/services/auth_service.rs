// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult},
    models::profile::{Profile, SignUpForm},
    services::profile_service,
};
use sqlx::SqlitePool;
use validator::Validate;

// Custo mínimo nos testes, para não os tornar lentos
const BCRYPT_COST: u32 = if cfg!(test) { 4 } else { bcrypt::DEFAULT_COST };

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt...");
        bcrypt::hash(&password, BCRYPT_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Login por email e senha. Email inexistente e senha errada dão o mesmo erro.
pub async fn sign_in(db_pool: &SqlitePool, email: &str, password: &str) -> AppResult<Profile> {
    let email = email.trim();
    let profile = match profile_service::find_profile_by_email(db_pool, email).await? {
        Some(p) => p,
        None => {
            tracing::warn!("Login: email não encontrado: {}", email);
            return Err(AppError::InvalidCredentials);
        }
    };

    // Mesma mensagem para os dois casos, para não revelar que o email existe
    if verify_password(password, &profile.password_hash).await? {
        Ok(profile)
    } else {
        tracing::warn!("Login: senha incorreta para {}", email);
        Err(AppError::InvalidCredentials)
    }
}

/// Cadastro de um responsável. Não há confirmação por email: a conta fica ativa logo.
/// Se o email for o `ADMIN_EMAIL` configurado, a conta nasce administradora.
pub async fn sign_up(db_pool: &SqlitePool, form: &SignUpForm, admin_email: Option<&str>) -> AppResult<Profile> {
    form.validate()?;

    // Email guardado sempre em minúsculas
    let email = form.email.trim().to_lowercase();
    if profile_service::find_profile_by_email(db_pool, &email).await?.is_some() {
        tracing::warn!("Cadastro recusado: email '{}' já registado.", email);
        return Err(AppError::Validation("Já existe uma conta com este email.".into()));
    }

    let password_hash = hash_password(&form.password).await?;
    let telefone = crate::models::profile::texto_opcional(&form.telefone);

    match profile_service::create_profile(
        db_pool,
        &email,
        &password_hash,
        form.nome_ou_padrao(),
        telefone.as_deref(),
    )
    .await
    {
        Ok(profile) if admin_email.is_some_and(|a| a.trim().eq_ignore_ascii_case(&email)) => {
            profile_service::set_admin(db_pool, &profile.id, true).await?;
            tracing::info!("👑 Conta {} criada já como administradora.", email);
            Ok(Profile { is_admin: true, ..profile })
        }
        Ok(profile) => Ok(profile),
        // Dois cadastros em simultâneo com o mesmo email
        Err(e) if e.is_unique_violation() => {
            Err(AppError::Validation("Já existe uma conta com este email.".into()))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    fn form(email: &str, password: &str) -> SignUpForm {
        SignUpForm {
            email: email.into(),
            password: password.into(),
            full_name: String::new(),
            telefone: "(11) 97777-6666".into(),
        }
    }

    #[tokio::test]
    async fn cadastro_e_login() {
        let pool = setup_test_db().await;

        let criado = sign_up(&pool, &form("Mae@Example.com", "segredo1"), None).await.unwrap();
        assert_eq!(criado.email, "mae@example.com");
        assert_eq!(criado.full_name, "Responsável");
        assert!(!criado.is_admin);

        let logado = sign_in(&pool, "mae@example.com", "segredo1").await.unwrap();
        assert_eq!(logado.id, criado.id);
    }

    #[tokio::test]
    async fn login_com_senha_errada_ou_email_desconhecido() {
        let pool = setup_test_db().await;
        sign_up(&pool, &form("pai@example.com", "segredo1"), None).await.unwrap();

        assert!(matches!(
            sign_in(&pool, "pai@example.com", "errada").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            sign_in(&pool, "ninguem@example.com", "segredo1").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn cadastro_duplicado_e_recusado() {
        let pool = setup_test_db().await;
        sign_up(&pool, &form("pai@example.com", "segredo1"), None).await.unwrap();

        let err = sign_up(&pool, &form("PAI@example.com", "outra123"), None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn cadastro_do_admin_email_vira_administrador() {
        let pool = setup_test_db().await;

        let admin = sign_up(&pool, &form("Diretoria@Example.com", "segredo1"), Some("diretoria@example.com"))
            .await
            .unwrap();
        assert!(admin.is_admin);
        let guardado = profile_service::find_profile_by_id(&pool, &admin.id).await.unwrap().unwrap();
        assert!(guardado.is_admin);

        let comum = sign_up(&pool, &form("mae@example.com", "segredo1"), Some("diretoria@example.com"))
            .await
            .unwrap();
        assert!(!comum.is_admin);
    }

    #[tokio::test]
    async fn cadastro_com_dados_invalidos() {
        let pool = setup_test_db().await;
        let err = sign_up(&pool, &form("invalido", "1"), None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
