// src/models/inscricao.rs
use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::FromRow;

/// Um inscrito num evento (lista do admin).
#[derive(Debug, Clone, FromRow)]
pub struct InscritoEvento {
    pub inscricao_id: String,
    pub aluno_id: String,
    pub aluno_nome: String,
    pub responsavel_nome: String,
    pub responsavel_telefone: Option<String>,
    pub pago: bool,
}

/// Inscrição vista do lado do aluno (detalhe do aluno no admin).
#[derive(Debug, Clone, FromRow)]
pub struct InscricaoDoAluno {
    pub evento_id: String,
    pub evento_titulo: String,
    pub data_hora: NaiveDateTime,
    pub valor: f64,
    pub pago: bool,
}

#[derive(Debug, Deserialize)]
pub struct InscricaoForm {
    pub aluno_id: String,
    pub evento_id: String,
}
