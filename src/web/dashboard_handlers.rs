// src/web/dashboard_handlers.rs
//! Painel do responsável: os seus alunos, mensalidades, eventos e carteirinhas.
use crate::{
    error::{AppError, AppResult},
    format,
    models::{
        aluno::{Aluno, AlunoDados},
        inscricao::InscricaoForm,
        mensalidade::StatusMensalidade,
        profile::{texto_opcional, PerfilForm},
    },
    services::{
        aluno_service, evento_service, inscricao_service, mensalidade_service, profile_service,
        storage_service::{self, Bucket},
    },
    state::AppState,
    templates::{
        mensagem_comprovante, render, validade_carteirinha, AlunoOpcao, AlunoView, CarteirinhaPage,
        DashboardPage, EventoParaAluno, MensalidadeView,
    },
    web::{agora, hoje, multipart::FormularioMultipart, mw_auth::UserId, redirect_erro, redirect_sucesso},
};
use axum::{
    extract::{Extension, Form, Multipart, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::collections::HashMap;
use validator::Validate;

#[derive(Deserialize, Debug, Default)]
pub struct DashboardParams {
    aluno: Option<String>,
    success: Option<String>,
    error: Option<String>,
}

fn dashboard_do_aluno(aluno_id: &str) -> String {
    format!("/dashboard?aluno={}", aluno_id)
}

/// Campos do formulário de matrícula/edição.
pub(crate) fn aluno_dados(form: &FormularioMultipart) -> AppResult<AlunoDados> {
    Ok(AlunoDados {
        nome: form.texto("nome"),
        data_nascimento: form.data("data_nascimento")?,
        posicao: form.opcional("posicao"),
        endereco: form.opcional("endereco"),
        data_inicio_pagamento: form.data("data_inicio_pagamento")?,
    })
}

/// Grava a foto, se veio uma no campo `foto`.
async fn gravar_foto(state: &AppState, form: &FormularioMultipart) -> AppResult<Option<String>> {
    match form.ficheiro("foto") {
        Some(foto) => {
            let url = storage_service::save_upload(
                &state.config.upload_dir,
                Bucket::Fotos,
                foto,
                state.config.max_upload_bytes,
            )
            .await?;
            Ok(Some(url))
        }
        None => Ok(None),
    }
}

pub(crate) fn carteirinha_page(
    state: &AppState,
    aluno: &Aluno,
    responsavel_nome: &str,
    responsavel_telefone: Option<&str>,
    voltar_url: String,
) -> AppResult<Html<String>> {
    let hoje = hoje();
    render(&CarteirinhaPage {
        escola_nome: state.config.escola_nome.clone(),
        aluno: AlunoView::from_aluno(aluno, hoje),
        responsavel_nome: responsavel_nome.to_string(),
        responsavel_telefone: responsavel_telefone.unwrap_or_default().to_string(),
        validade: validade_carteirinha(hoje),
        voltar_url,
    })
}

// GET /dashboard
pub async fn show_dashboard(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Query(params): Query<DashboardParams>,
) -> AppResult<Response> {
    let Some(profile) = profile_service::find_profile_by_id(&state.db_pool, &user_id).await? else {
        tracing::warn!("Sessão com perfil inexistente {}; terminando sessão.", user_id);
        return Ok(Redirect::to("/logout").into_response());
    };

    let alunos = aluno_service::list_alunos_do_responsavel(&state.db_pool, &user_id).await?;
    // O aluno pedido na query, se for desta família; senão o primeiro
    let selecionado = params
        .aluno
        .as_deref()
        .and_then(|id| alunos.iter().find(|a| a.id == id))
        .or_else(|| alunos.first());

    let hoje = hoje();
    let mut mensalidades = Vec::new();
    let mut eventos = Vec::new();

    // --- Dados do aluno selecionado ---

    if let Some(aluno) = selecionado {
        for m in mensalidade_service::list_mensalidades_do_aluno(&state.db_pool, &aluno.id).await? {
            // Comprovativo para o WhatsApp da escola, só enquanto pendente
            let link = match (&state.config.escola_whatsapp, m.status) {
                (Some(tel), StatusMensalidade::Pendente) => {
                    format::whatsapp_link(tel, &mensagem_comprovante(&aluno.nome, &m))
                }
                _ => None,
            };
            mensalidades.push(MensalidadeView::new(&m, hoje, link));
        }

        let inscricoes = inscricao_service::list_inscricoes_do_aluno(&state.db_pool, &aluno.id).await?;
        // Próximos eventos, marcando os que já têm inscrição
        let por_evento: HashMap<&str, _> = inscricoes.iter().map(|i| (i.evento_id.as_str(), i)).collect();
        eventos = evento_service::list_proximos_eventos(&state.db_pool, agora())
            .await?
            .iter()
            .map(|e| EventoParaAluno::new(e, por_evento.get(e.id.as_str()).copied()))
            .collect();
    }

    let page = DashboardPage {
        escola_nome: state.config.escola_nome.clone(),
        user_name: profile.full_name,
        user_telefone: profile.telefone.unwrap_or_default(),
        is_admin: profile.is_admin,
        alunos: alunos
            .iter()
            .map(|a| AlunoOpcao {
                id: a.id.clone(),
                nome: a.nome.clone(),
                selecionado: selecionado.is_some_and(|s| s.id == a.id),
            })
            .collect(),
        selecionado: selecionado.map(|a| AlunoView::from_aluno(a, hoje)),
        mensalidades,
        eventos,
        success_message: params.success,
        error_message: params.error,
    };
    Ok(render(&page)?.into_response())
}

async fn matricular(state: &AppState, responsavel_id: &str, form: &FormularioMultipart) -> AppResult<Aluno> {
    let dados = aluno_dados(form)?;
    dados.validate()?;
    let foto_url = gravar_foto(state, form).await?;

    match aluno_service::create_aluno(&state.db_pool, responsavel_id, &dados, foto_url.as_deref()).await {
        Ok(aluno) => Ok(aluno),
        Err(e) => {
            if let Some(url) = &foto_url {
                storage_service::remove_upload(&state.config.upload_dir, url).await;
            }
            Err(e)
        }
    }
}

/// Devolve o URL da nova foto, se houve troca.
async fn atualizar(state: &AppState, aluno_id: &str, form: &FormularioMultipart) -> AppResult<Option<String>> {
    let dados = aluno_dados(form)?;
    dados.validate()?;
    let nova_foto = gravar_foto(state, form).await?;

    if let Err(e) = aluno_service::update_aluno(&state.db_pool, aluno_id, &dados, nova_foto.as_deref()).await {
        // A foto nova ficaria órfã no disco
        if let Some(url) = &nova_foto {
            storage_service::remove_upload(&state.config.upload_dir, url).await;
        }
        return Err(e);
    }
    Ok(nova_foto)
}

// POST /dashboard/alunos (multipart)
pub async fn handle_create_aluno(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let form = FormularioMultipart::ler(multipart).await?;

    match matricular(&state, &user_id, &form).await {
        Ok(aluno) => Ok(redirect_sucesso(
            &dashboard_do_aluno(&aluno.id),
            &format!("{} matriculado com sucesso.", aluno.nome),
        )),
        Err(e) => {
            tracing::warn!("Matrícula recusada para responsável {}: {:?}", user_id, e);
            Ok(redirect_erro("/dashboard", &e.user_message()))
        }
    }
}

// POST /dashboard/alunos/{id} (multipart)
pub async fn handle_update_aluno(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(aluno_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let atual = aluno_service::find_aluno_do_responsavel(&state.db_pool, &user_id, &aluno_id).await?;
    let form = FormularioMultipart::ler(multipart).await?;
    let voltar = dashboard_do_aluno(&aluno_id);

    match atualizar(&state, &aluno_id, &form).await {
        Ok(nova_foto) => {
            // A foto antiga só sai depois de a nova estar gravada
            if let (Some(_), Some(antiga)) = (&nova_foto, &atual.foto_url) {
                storage_service::remove_upload(&state.config.upload_dir, antiga).await;
            }
            Ok(redirect_sucesso(&voltar, "Dados do aluno atualizados."))
        }
        Err(e) => {
            tracing::warn!("Edição do aluno {} recusada: {:?}", aluno_id, e);
            Ok(redirect_erro(&voltar, &e.user_message()))
        }
    }
}

// POST /dashboard/inscricoes
pub async fn handle_inscricao(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Form(form): Form<InscricaoForm>,
) -> AppResult<Redirect> {
    // Aluno de outra família -> 404
    let aluno = aluno_service::find_aluno_do_responsavel(&state.db_pool, &user_id, &form.aluno_id).await?;
    let voltar = dashboard_do_aluno(&aluno.id);

    if evento_service::find_evento_by_id(&state.db_pool, &form.evento_id).await?.is_none() {
        return Ok(redirect_erro(&voltar, "Evento não encontrado."));
    }

    // Duplicado é recusado pela base
    match inscricao_service::inscrever(&state.db_pool, &aluno.id, &form.evento_id).await {
        Ok(_) => Ok(redirect_sucesso(&voltar, &format!("{} inscrito no evento.", aluno.nome))),
        Err(e) => {
            tracing::warn!("Inscrição de {} no evento {} falhou: {:?}", aluno.id, form.evento_id, e);
            Ok(redirect_erro(&voltar, "Não foi possível realizar a inscrição."))
        }
    }
}

// POST /dashboard/perfil
pub async fn handle_update_perfil(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Form(form): Form<PerfilForm>,
) -> AppResult<Redirect> {
    if let Err(e) = form.validate() {
        let e = AppError::from(e);
        tracing::warn!("Perfil {} com dados inválidos: {}", user_id, e);
        return Ok(redirect_erro("/dashboard", &e.user_message()));
    }

    let telefone = texto_opcional(&form.telefone);
    profile_service::update_profile(&state.db_pool, &user_id, form.full_name.trim(), telefone.as_deref()).await?;
    Ok(redirect_sucesso("/dashboard", "Dados atualizados."))
}

// GET /dashboard/alunos/{id}/carteirinha
pub async fn show_carteirinha(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(aluno_id): Path<String>,
) -> AppResult<Html<String>> {
    let aluno = aluno_service::find_aluno_do_responsavel(&state.db_pool, &user_id, &aluno_id).await?;
    let responsavel = profile_service::find_profile_by_id(&state.db_pool, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Perfil".into()))?;

    carteirinha_page(
        &state,
        &aluno,
        &responsavel.full_name,
        responsavel.telefone.as_deref(),
        dashboard_do_aluno(&aluno.id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::storage_service::UploadedFile,
        test_utils::{seed_aluno, seed_profile, test_state},
    };

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    fn form_com_foto(nome: &str) -> FormularioMultipart {
        FormularioMultipart::com_dados(
            &[("nome", nome), ("data_nascimento", "2015-04-02")],
            vec![(
                "foto",
                UploadedFile {
                    file_name: "nova.png".into(),
                    bytes: PNG.to_vec(),
                },
            )],
        )
    }

    async fn fotos_no_disco(state: &AppState) -> usize {
        let dir = state.config.upload_dir.join("fotos");
        let Ok(mut entradas) = tokio::fs::read_dir(&dir).await else {
            return 0;
        };
        let mut total = 0;
        while entradas.next_entry().await.unwrap().is_some() {
            total += 1;
        }
        total
    }

    #[tokio::test]
    async fn edicao_falhada_nao_deixa_foto_orfa() {
        let state = test_state().await;

        let err = atualizar(&state, "aluno-inexistente", &form_com_foto("Zeca")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(fotos_no_disco(&state).await, 0);
    }

    #[tokio::test]
    async fn edicao_com_foto_grava_o_novo_url() {
        let state = test_state().await;
        let ana = seed_profile(&state.db_pool, "ana@example.com", "Ana").await;
        let aluno = seed_aluno(&state.db_pool, &ana.id, "Zeca").await;

        let url = atualizar(&state, &aluno.id, &form_com_foto("Zeca Souza")).await.unwrap().unwrap();
        assert!(url.starts_with("/uploads/fotos/"));
        assert_eq!(fotos_no_disco(&state).await, 1);

        let guardado = aluno_service::find_aluno_by_id(&state.db_pool, &aluno.id).await.unwrap().unwrap();
        assert_eq!(guardado.nome, "Zeca Souza");
        assert_eq!(guardado.foto_url.as_deref(), Some(url.as_str()));
    }
}
