// src/config.rs
use crate::error::{AppError, AppResult};
use std::{env, net::SocketAddr, path::PathBuf};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_DIA_VENCIMENTO: u32 = 10;
const MIN_SESSION_SECRET_BYTES: usize = 64;

/// Configuração da aplicação, lida das variáveis de ambiente (e do `.env`) no arranque.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub bind_addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub escola_nome: String,
    pub escola_whatsapp: Option<String>,
    pub admin_email: Option<String>,
    pub dia_vencimento: u32,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de uma função de busca (facilita os testes).
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| AppError::Config("DATABASE_URL não definida".into()))?;
        let session_secret = get("SESSION_SECRET")
            .ok_or_else(|| AppError::Config("SESSION_SECRET não definida".into()))?;
        // Assina o cookie de sessão; a chave precisa de 64 bytes
        if session_secret.len() < MIN_SESSION_SECRET_BYTES {
            return Err(AppError::Config(format!(
                "SESSION_SECRET precisa de pelo menos {} caracteres",
                MIN_SESSION_SECRET_BYTES
            )));
        }

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR inválido: {}", e)))?;

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(v) => v
                .parse::<usize>()
                .map_err(|e| AppError::Config(format!("MAX_UPLOAD_BYTES inválido: {}", e)))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let dia_vencimento = match get("DIA_VENCIMENTO") {
            Some(v) => v
                .parse::<u32>()
                .ok()
                .filter(|d| (1..=31).contains(d))
                .ok_or_else(|| AppError::Config(format!("DIA_VENCIMENTO inválido: {}", v)))?,
            None => DEFAULT_DIA_VENCIMENTO,
        };

        let secure_cookies = get("SECURE_COOKIES")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "sim"))
            .unwrap_or(false);

        Ok(Config {
            database_url,
            session_secret,
            bind_addr,
            upload_dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.into())),
            max_upload_bytes,
            escola_nome: get("ESCOLA_NOME").unwrap_or_else(|| "Escolinha".into()),
            escola_whatsapp: get("ESCOLA_WHATSAPP"),
            admin_email: get("ADMIN_EMAIL"),
            dia_vencimento,
            secure_cookies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SEGREDO: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn usa_valores_padrao() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite://escolinha.db"),
            ("SESSION_SECRET", SEGREDO),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.escola_nome, "Escolinha");
        assert_eq!(config.dia_vencimento, 10);
        assert!(config.escola_whatsapp.is_none());
        assert!(!config.secure_cookies);
    }

    #[test]
    fn falha_sem_database_url() {
        let err = Config::from_lookup(lookup_from(&[("SESSION_SECRET", SEGREDO)])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn rejeita_segredo_curto() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("SESSION_SECRET", "curto"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn rejeita_dia_de_vencimento_fora_do_mes() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("SESSION_SECRET", SEGREDO),
            ("DIA_VENCIMENTO", "32"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn le_valores_opcionais() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("SESSION_SECRET", SEGREDO),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("SECURE_COOKIES", "true"),
            ("ESCOLA_WHATSAPP", "11988887777"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.escola_whatsapp.as_deref(), Some("11988887777"));
        assert!(config.secure_cookies);
    }
}
