// src/web/admin_handlers.rs
use crate::{
    error::{AppError, AppResult},
    format,
    models::{
        aluno::filtrar_alunos,
        evento::{parse_data_hora, EventoDados},
        mensalidade::{GerarMensalidadesForm, Mensalidade, NovaMensalidadeForm, StatusMensalidade},
        profile::texto_opcional,
    },
    services::{
        aluno_service, evento_service, inscricao_service, mensalidade_service, profile_service,
        storage_service::{self, Bucket},
    },
    state::AppState,
    templates::{
        mensagem_cobranca, render, AdminAlunoPage, AdminEventoPage, AdminPage, AlunoCard, AlunoOpcao,
        AlunoView, EventoAdminView, InscricaoView, InscritoView, MensalidadeAdminView, MensalidadeView,
        ResponsavelView,
    },
    web::{
        dashboard_handlers::carteirinha_page, hoje, multipart::FormularioMultipart, mw_auth::UserId,
        redirect_erro, redirect_sucesso, FeedbackParams,
    },
};
use axum::{
    extract::{Extension, Form, Multipart, Path, Query, State},
    response::{Html, Redirect},
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::str::FromStr;
use validator::Validate;

const ABA_ALUNOS: &str = "/admin?aba=alunos";
const ABA_EVENTOS: &str = "/admin?aba=eventos";
const ABA_FINANCEIRO: &str = "/admin?aba=financeiro";
const ABA_RESPONSAVEIS: &str = "/admin?aba=responsaveis";

#[derive(Deserialize, Debug, Default)]
pub struct AdminParams {
    #[serde(default)]
    aba: String,
    #[serde(default)]
    busca: String,
    #[serde(default)]
    status: String,
    success: Option<String>,
    error: Option<String>,
}

/// Página para onde voltar depois de uma ação na lista de mensalidades.
#[derive(Deserialize, Debug, Default)]
pub struct VoltarForm {
    #[serde(default)]
    voltar: String,
}

impl VoltarForm {
    // Só caminhos do próprio painel
    fn destino(&self) -> &str {
        if self.voltar.starts_with("/admin") {
            &self.voltar
        } else {
            ABA_FINANCEIRO
        }
    }
}

fn aba_valida(aba: &str) -> &'static str {
    match aba {
        "eventos" => "eventos",
        "financeiro" => "financeiro",
        "responsaveis" => "responsaveis",
        _ => "alunos",
    }
}

// --- PAINEL (ABAS) ---

// GET /admin
pub async fn show_admin_page(
    State(state): State<AppState>,
    Query(params): Query<AdminParams>,
) -> AppResult<Html<String>> {
    let aba = aba_valida(&params.aba);
    let hoje = hoje();
    tracing::debug!("GET /admin: aba '{}'", aba);

    let mut page = AdminPage {
        escola_nome: state.config.escola_nome.clone(),
        aba: aba.to_string(),
        busca: params.busca.trim().to_string(),
        alunos: Vec::new(),
        total_alunos: 0,
        eventos: Vec::new(),
        mensalidades: Vec::new(),
        filtro_status: String::new(),
        alunos_opcoes: Vec::new(),
        responsaveis: Vec::new(),
        mes_atual: hoje.format("%Y-%m").to_string(),
        dia_vencimento: state.config.dia_vencimento,
        success_message: params.success,
        error_message: params.error,
    };

    // Só carrega os dados da aba aberta
    match aba {
        "eventos" => {
            page.eventos = evento_service::list_eventos_com_contagem(&state.db_pool)
                .await?
                .iter()
                .map(EventoAdminView::from)
                .collect();
        }
        "financeiro" => {
            // Filtro desconhecido = todas
            let filtro = StatusMensalidade::from_str(&params.status).ok();
            page.filtro_status = filtro.map(|s| s.as_str().to_string()).unwrap_or_default();
            page.mensalidades = mensalidade_service::list_mensalidades(&state.db_pool, filtro)
                .await?
                .iter()
                .map(|m| MensalidadeAdminView::new(m, hoje, &state.config.escola_nome))
                .collect();
            page.alunos_opcoes = aluno_service::list_alunos_com_responsavel(&state.db_pool)
                .await?
                .iter()
                .map(|a| AlunoOpcao {
                    id: a.aluno.id.clone(),
                    nome: format!("{} ({})", a.aluno.nome, a.responsavel_nome),
                    selecionado: false,
                })
                .collect();
        }
        "responsaveis" => {
            page.responsaveis = profile_service::list_responsaveis(&state.db_pool)
                .await?
                .iter()
                .map(ResponsavelView::from)
                .collect();
        }
        _ => {
            let todos = aluno_service::list_alunos_com_responsavel(&state.db_pool).await?;
            page.total_alunos = todos.len();
            page.alunos = filtrar_alunos(&todos, &page.busca).into_iter().map(AlunoCard::from).collect();
        }
    }

    render(&page)
}

// --- ALUNOS ---

// GET /admin/alunos/{id}
pub async fn show_aluno_detalhe(
    State(state): State<AppState>,
    Path(aluno_id): Path<String>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Html<String>> {
    let detalhe = aluno_service::find_aluno_com_responsavel(&state.db_pool, &aluno_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Aluno".into()))?;
    let hoje = hoje();

    let mensalidades = mensalidade_service::list_mensalidades_do_aluno(&state.db_pool, &aluno_id)
        .await?
        .iter()
        .map(|m| {
            let link = match (m.status, detalhe.responsavel_telefone.as_deref()) {
                (StatusMensalidade::Pendente, Some(tel)) => format::whatsapp_link(
                    tel,
                    &mensagem_cobranca(
                        &state.config.escola_nome,
                        &detalhe.responsavel_nome,
                        &detalhe.aluno.nome,
                        m,
                        hoje,
                    ),
                ),
                _ => None,
            };
            MensalidadeView::new(m, hoje, link)
        })
        .collect();

    let inscricoes = inscricao_service::list_inscricoes_do_aluno(&state.db_pool, &aluno_id)
        .await?
        .iter()
        .map(InscricaoView::from)
        .collect();

    render(&AdminAlunoPage {
        escola_nome: state.config.escola_nome.clone(),
        aluno: AlunoView::from_aluno(&detalhe.aluno, hoje),
        responsavel_nome: detalhe.responsavel_nome.clone(),
        responsavel_email: detalhe.responsavel_email.clone(),
        responsavel_telefone: detalhe.responsavel_telefone.clone().unwrap_or_default(),
        inscricoes,
        mensalidades,
        success_message: params.success,
        error_message: params.error,
    })
}

// GET /admin/alunos/{id}/carteirinha
pub async fn show_aluno_carteirinha(
    State(state): State<AppState>,
    Path(aluno_id): Path<String>,
) -> AppResult<Html<String>> {
    let detalhe = aluno_service::find_aluno_com_responsavel(&state.db_pool, &aluno_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Aluno".into()))?;
    carteirinha_page(
        &state,
        &detalhe.aluno,
        &detalhe.responsavel_nome,
        detalhe.responsavel_telefone.as_deref(),
        format!("/admin/alunos/{}", aluno_id),
    )
}

// POST /admin/alunos/{id}/excluir
pub async fn handle_delete_aluno(
    State(state): State<AppState>,
    Path(aluno_id): Path<String>,
) -> AppResult<Redirect> {
    let Some(aluno) = aluno_service::find_aluno_by_id(&state.db_pool, &aluno_id).await? else {
        return Ok(redirect_erro(ABA_ALUNOS, "Aluno não encontrado."));
    };

    match aluno_service::delete_aluno(&state.db_pool, &aluno_id).await {
        Ok(()) => {
            // Ficheiro só sai depois das linhas
            if let Some(foto) = &aluno.foto_url {
                storage_service::remove_upload(&state.config.upload_dir, foto).await;
            }
            Ok(redirect_sucesso(ABA_ALUNOS, &format!("Aluno '{}' removido.", aluno.nome)))
        }
        Err(e) => {
            tracing::error!("Erro ao remover aluno {}: {:?}", aluno_id, e);
            Ok(redirect_erro(&format!("/admin/alunos/{}", aluno_id), &e.user_message()))
        }
    }
}

// --- EVENTOS E INSCRIÇÕES ---

fn evento_dados(form: &FormularioMultipart) -> AppResult<EventoDados> {
    let data_hora = parse_data_hora(&form.texto("data_hora"))
        .ok_or_else(|| AppError::Validation("Informe a data e a hora do evento.".into()))?;
    let valor_texto = form.texto("valor");
    let valor = if valor_texto.is_empty() {
        0.0
    } else {
        format::parse_valor(&valor_texto)
            .ok_or_else(|| AppError::Validation(format!("Valor inválido: {}", valor_texto)))?
    };

    Ok(EventoDados {
        titulo: form.texto("titulo"),
        data_hora,
        local: form.texto("local"),
        descricao: form.opcional("descricao"),
        valor,
    })
}

async fn criar_evento(state: &AppState, form: &FormularioMultipart) -> AppResult<String> {
    let dados = evento_dados(form)?;
    dados.validate()?;

    let arquivo_url = match form.ficheiro("arquivo") {
        Some(arquivo) => Some(
            storage_service::save_upload(
                &state.config.upload_dir,
                Bucket::Arquivos,
                arquivo,
                state.config.max_upload_bytes,
            )
            .await?,
        ),
        None => None,
    };

    match evento_service::create_evento(&state.db_pool, &dados, arquivo_url.as_deref()).await {
        Ok(evento) => Ok(evento.titulo),
        Err(e) => {
            if let Some(url) = &arquivo_url {
                storage_service::remove_upload(&state.config.upload_dir, url).await;
            }
            Err(e)
        }
    }
}

// POST /admin/eventos (multipart)
pub async fn handle_create_evento(State(state): State<AppState>, multipart: Multipart) -> AppResult<Redirect> {
    let form = FormularioMultipart::ler(multipart).await?;

    match criar_evento(&state, &form).await {
        Ok(titulo) => Ok(redirect_sucesso(ABA_EVENTOS, &format!("Evento '{}' criado.", titulo))),
        Err(e) => {
            tracing::warn!("Criação de evento recusada: {:?}", e);
            Ok(redirect_erro(ABA_EVENTOS, &e.user_message()))
        }
    }
}

// GET /admin/eventos/{id}
pub async fn show_evento_detalhe(
    State(state): State<AppState>,
    Path(evento_id): Path<String>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Html<String>> {
    let evento = evento_service::find_evento_by_id(&state.db_pool, &evento_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Evento".into()))?;
    let inscritos: Vec<InscritoView> = inscricao_service::list_inscritos_do_evento(&state.db_pool, &evento_id)
        .await?
        .iter()
        .map(InscritoView::from)
        .collect();

    render(&AdminEventoPage {
        escola_nome: state.config.escola_nome.clone(),
        evento: EventoAdminView::new(&evento, inscritos.len() as i64),
        inscritos,
        success_message: params.success,
        error_message: params.error,
    })
}

// POST /admin/eventos/{id}/excluir
pub async fn handle_delete_evento(
    State(state): State<AppState>,
    Path(evento_id): Path<String>,
) -> AppResult<Redirect> {
    let Some(evento) = evento_service::find_evento_by_id(&state.db_pool, &evento_id).await? else {
        return Ok(redirect_erro(ABA_EVENTOS, "Evento não encontrado."));
    };

    match evento_service::delete_evento(&state.db_pool, &evento_id).await {
        Ok(()) => {
            if let Some(arquivo) = &evento.arquivo_url {
                storage_service::remove_upload(&state.config.upload_dir, arquivo).await;
            }
            Ok(redirect_sucesso(ABA_EVENTOS, &format!("Evento '{}' removido.", evento.titulo)))
        }
        Err(e) => {
            tracing::error!("Erro ao remover evento {}: {:?}", evento_id, e);
            Ok(redirect_erro(ABA_EVENTOS, &e.user_message()))
        }
    }
}

// POST /admin/inscricoes/{id}/pago
pub async fn handle_toggle_inscricao_pago(
    State(state): State<AppState>,
    Path(inscricao_id): Path<String>,
) -> AppResult<Redirect> {
    match inscricao_service::toggle_pago(&state.db_pool, &inscricao_id).await {
        Ok((evento_id, pago)) => {
            let msg = if pago { "Inscrição marcada como paga." } else { "Inscrição marcada como pendente." };
            Ok(redirect_sucesso(&format!("/admin/eventos/{}", evento_id), msg))
        }
        Err(e) => {
            tracing::warn!("Falha ao alternar pagamento da inscrição {}: {:?}", inscricao_id, e);
            Ok(redirect_erro(ABA_EVENTOS, &e.user_message()))
        }
    }
}

// --- FINANCEIRO ---

async fn lancar_mensalidade(state: &AppState, form: &NovaMensalidadeForm) -> AppResult<Mensalidade> {
    let mes = format::parse_mes(&form.mes)
        .ok_or_else(|| AppError::Validation("Informe o mês de referência.".into()))?;
    let vencimento = NaiveDate::parse_from_str(form.vencimento.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Informe a data de vencimento.".into()))?;
    let valor = format::parse_valor(&form.valor)
        .ok_or_else(|| AppError::Validation("Valor da mensalidade inválido.".into()))?;
    if aluno_service::find_aluno_by_id(&state.db_pool, &form.aluno_id).await?.is_none() {
        return Err(AppError::NotFound("Aluno".into()));
    }
    mensalidade_service::create_mensalidade(&state.db_pool, &form.aluno_id, mes, vencimento, valor).await
}

// POST /admin/mensalidades
pub async fn handle_create_mensalidade(
    State(state): State<AppState>,
    Form(form): Form<NovaMensalidadeForm>,
) -> AppResult<Redirect> {
    match lancar_mensalidade(&state, &form).await {
        Ok(m) => Ok(redirect_sucesso(
            ABA_FINANCEIRO,
            &format!("Cobrança de {} lançada.", format::mes_label(m.mes_referencia)),
        )),
        Err(e) => {
            tracing::warn!("Cobrança recusada para aluno {}: {:?}", form.aluno_id, e);
            Ok(redirect_erro(ABA_FINANCEIRO, &e.user_message()))
        }
    }
}

// POST /admin/mensalidades/gerar
pub async fn handle_gerar_mensalidades(
    State(state): State<AppState>,
    Form(form): Form<GerarMensalidadesForm>,
) -> AppResult<Redirect> {
    let Some(mes) = format::parse_mes(&form.mes) else {
        return Ok(redirect_erro(ABA_FINANCEIRO, "Informe o mês de referência."));
    };
    let Some(valor) = format::parse_valor(&form.valor) else {
        return Ok(redirect_erro(ABA_FINANCEIRO, "Informe o valor da mensalidade."));
    };
    let dia = match texto_opcional(&form.dia_vencimento) {
        None => state.config.dia_vencimento,
        Some(d) => match d.parse::<u32>().ok().filter(|d| (1..=31).contains(d)) {
            Some(d) => d,
            None => return Ok(redirect_erro(ABA_FINANCEIRO, "Dia de vencimento inválido (1 a 31).")),
        },
    };

    match mensalidade_service::gerar_mensalidades_do_mes(&state.db_pool, mes, valor, dia).await {
        Ok(0) => Ok(redirect_sucesso(
            ABA_FINANCEIRO,
            &format!("Nenhuma mensalidade nova para {}.", format::mes_label(mes)),
        )),
        Ok(n) => Ok(redirect_sucesso(
            ABA_FINANCEIRO,
            &format!("{} mensalidades geradas para {}.", n, format::mes_label(mes)),
        )),
        Err(e) => {
            tracing::error!("Erro ao gerar mensalidades de {}: {:?}", mes, e);
            Ok(redirect_erro(ABA_FINANCEIRO, &e.user_message()))
        }
    }
}

// POST /admin/mensalidades/{id}/status
pub async fn handle_toggle_mensalidade(
    State(state): State<AppState>,
    Path(mensalidade_id): Path<String>,
    Form(form): Form<VoltarForm>,
) -> AppResult<Redirect> {
    match mensalidade_service::toggle_status(&state.db_pool, &mensalidade_id).await {
        Ok(StatusMensalidade::Pago) => Ok(redirect_sucesso(form.destino(), "Pagamento confirmado.")),
        Ok(StatusMensalidade::Pendente) => Ok(redirect_sucesso(form.destino(), "Mensalidade voltou a pendente.")),
        Err(e) => {
            tracing::warn!("Falha ao alternar mensalidade {}: {:?}", mensalidade_id, e);
            Ok(redirect_erro(form.destino(), &e.user_message()))
        }
    }
}

// POST /admin/mensalidades/{id}/excluir
pub async fn handle_delete_mensalidade(
    State(state): State<AppState>,
    Path(mensalidade_id): Path<String>,
    Form(form): Form<VoltarForm>,
) -> AppResult<Redirect> {
    match mensalidade_service::delete_mensalidade(&state.db_pool, &mensalidade_id).await {
        Ok(()) => Ok(redirect_sucesso(form.destino(), "Cobrança removida.")),
        Err(e) => {
            tracing::warn!("Falha ao remover mensalidade {}: {:?}", mensalidade_id, e);
            Ok(redirect_erro(form.destino(), &e.user_message()))
        }
    }
}

// --- RESPONSÁVEIS ---

// POST /admin/responsaveis/{id}/admin
pub async fn handle_toggle_admin(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(profile_id): Path<String>,
) -> AppResult<Redirect> {
    match profile_service::toggle_admin(&state.db_pool, &user_id, &profile_id).await {
        Ok(true) => Ok(redirect_sucesso(ABA_RESPONSAVEIS, "Perfil promovido a administrador.")),
        Ok(false) => Ok(redirect_sucesso(ABA_RESPONSAVEIS, "Acesso de administrador removido.")),
        Err(e) => {
            tracing::warn!("Admin {} não alterou o perfil {}: {:?}", user_id, profile_id, e);
            Ok(redirect_erro(ABA_RESPONSAVEIS, &e.user_message()))
        }
    }
}
