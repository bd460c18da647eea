// src/services/mod.rs
pub mod aluno_service;
pub mod auth_service;
pub mod evento_service;
pub mod inscricao_service;
pub mod mensalidade_service;
pub mod notificacao_service;
pub mod profile_service;
pub mod storage_service;
