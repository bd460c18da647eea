// src/models/aluno.rs
use crate::format;
use chrono::NaiveDate;
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow)]
pub struct Aluno {
    pub id: String,
    pub responsavel_id: String,
    pub nome: String,
    pub data_nascimento: Option<NaiveDate>,
    pub posicao: Option<String>,
    pub endereco: Option<String>,
    pub foto_url: Option<String>,
    pub data_inicio_pagamento: Option<NaiveDate>,
}

impl Aluno {
    pub fn idade(&self, hoje: NaiveDate) -> Option<u32> {
        self.data_nascimento.map(|n| format::idade(n, hoje))
    }

    /// Número da carteirinha: primeiros 8 caracteres hexadecimais do id, em maiúsculas.
    pub fn numero_carteirinha(&self) -> String {
        self.id
            .chars()
            .filter(|c| c.is_ascii_hexdigit())
            .take(8)
            .collect::<String>()
            .to_uppercase()
    }
}

/// Aluno com os dados do responsável (join com 'profiles').
#[derive(Debug, Clone, FromRow)]
pub struct AlunoComResponsavel {
    #[sqlx(flatten)]
    pub aluno: Aluno,
    pub responsavel_nome: String,
    pub responsavel_email: String,
    pub responsavel_telefone: Option<String>,
}

impl AlunoComResponsavel {
    /// Busca sem distinguir maiúsculas pelo nome do aluno ou do responsável.
    pub fn corresponde(&self, busca: &str) -> bool {
        let busca = busca.trim().to_lowercase();
        if busca.is_empty() {
            return true;
        }
        self.aluno.nome.to_lowercase().contains(&busca)
            || self.responsavel_nome.to_lowercase().contains(&busca)
    }
}

pub fn filtrar_alunos<'a>(
    alunos: &'a [AlunoComResponsavel],
    busca: &str,
) -> Vec<&'a AlunoComResponsavel> {
    alunos.iter().filter(|a| a.corresponde(busca)).collect()
}

/// Dados editáveis de um aluno, vindos do formulário (multipart) de matrícula/edição.
#[derive(Debug, Clone, Default, Validate)]
pub struct AlunoDados {
    #[validate(length(min = 1, max = 120, message = "Informe o nome do aluno."))]
    pub nome: String,
    pub data_nascimento: Option<NaiveDate>,
    #[validate(length(max = 60, message = "Posição demasiado longa."))]
    pub posicao: Option<String>,
    #[validate(length(max = 300, message = "Endereço demasiado longo."))]
    pub endereco: Option<String>,
    pub data_inicio_pagamento: Option<NaiveDate>,
}
