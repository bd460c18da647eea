// src/models/mensalidade.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum StatusMensalidade {
    Pendente,
    Pago,
}

impl StatusMensalidade {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusMensalidade::Pendente => "pendente",
            StatusMensalidade::Pago => "pago",
        }
    }

    /// Confirmação manual de pagamento: pendente <-> pago.
    pub fn alternado(self) -> Self {
        match self {
            StatusMensalidade::Pendente => StatusMensalidade::Pago,
            StatusMensalidade::Pago => StatusMensalidade::Pendente,
        }
    }
}

impl fmt::Display for StatusMensalidade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusMensalidade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pendente" => Ok(StatusMensalidade::Pendente),
            "pago" => Ok(StatusMensalidade::Pago),
            outro => Err(format!("status desconhecido: {}", outro)),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Mensalidade {
    pub id: String,
    pub aluno_id: String,
    pub mes_referencia: NaiveDate,
    pub vencimento: NaiveDate,
    pub valor: f64,
    pub status: StatusMensalidade,
}

impl Mensalidade {
    /// Pendente e com vencimento anterior a hoje.
    pub fn atrasada(&self, hoje: NaiveDate) -> bool {
        self.status == StatusMensalidade::Pendente && self.vencimento < hoje
    }
}

/// Mensalidade com o aluno e o responsável (aba financeiro e notificações).
#[derive(Debug, Clone, FromRow)]
pub struct MensalidadeComAluno {
    #[sqlx(flatten)]
    pub mensalidade: Mensalidade,
    pub aluno_nome: String,
    pub responsavel_nome: String,
    pub responsavel_email: String,
    pub responsavel_telefone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NovaMensalidadeForm {
    pub aluno_id: String,
    pub mes: String,
    pub vencimento: String,
    pub valor: String,
}

#[derive(Debug, Deserialize)]
pub struct GerarMensalidadesForm {
    pub mes: String,
    pub valor: String,
    // Vazio = dia configurado em DIA_VENCIMENTO
    #[serde(default)]
    pub dia_vencimento: String,
}
