// src/models/profile.rs
use serde::Deserialize;
use sqlx::FromRow;
use validator::Validate;

pub const NOME_PADRAO_RESPONSAVEL: &str = "Responsável";

// Representa uma conta (responsável ou administrador) lida da tabela 'profiles'
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub telefone: Option<String>,
    pub is_admin: bool,
}

/// Linha da lista de responsáveis no painel admin.
#[derive(Debug, Clone, FromRow)]
pub struct ResponsavelResumo {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub telefone: Option<String>,
    pub is_admin: bool,
    pub qtd_alunos: i64,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpForm {
    #[validate(email(message = "Informe um email válido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter pelo menos 6 caracteres."))]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub telefone: String,
}

impl SignUpForm {
    /// Nome a gravar: o padrão "Responsável" quando o campo vem vazio.
    pub fn nome_ou_padrao(&self) -> &str {
        let nome = self.full_name.trim();
        if nome.is_empty() {
            NOME_PADRAO_RESPONSAVEL
        } else {
            nome
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PerfilForm {
    #[validate(length(min = 1, max = 120, message = "Informe o nome do responsável."))]
    pub full_name: String,
    #[serde(default)]
    #[validate(length(max = 30, message = "Telefone demasiado longo."))]
    pub telefone: String,
}

/// Converte campos opcionais de formulário: texto vazio vira `None`.
pub fn texto_opcional(valor: &str) -> Option<String> {
    let valor = valor.trim();
    (!valor.is_empty()).then(|| valor.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadastro_sem_nome_usa_padrao() {
        let form = SignUpForm {
            email: "mae@example.com".into(),
            password: "segredo1".into(),
            full_name: "   ".into(),
            telefone: String::new(),
        };
        assert_eq!(form.nome_ou_padrao(), "Responsável");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn cadastro_valida_email_e_senha() {
        let form = SignUpForm {
            email: "nao-e-email".into(),
            password: "123".into(),
            full_name: "Ana".into(),
            telefone: String::new(),
        };
        let erros = form.validate().unwrap_err();
        let campos = erros.field_errors();
        assert!(campos.contains_key("email"));
        assert!(campos.contains_key("password"));
    }

    #[test]
    fn texto_opcional_descarta_vazio() {
        assert_eq!(texto_opcional("  "), None);
        assert_eq!(texto_opcional(" Zagueiro "), Some("Zagueiro".to_string()));
    }
}
