// src/models/mod.rs
pub mod aluno;
pub mod evento;
pub mod inscricao;
pub mod mensalidade;
pub mod profile;
