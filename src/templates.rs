// src/templates.rs
use crate::{
    error::AppResult,
    format,
    models::{
        aluno::{Aluno, AlunoComResponsavel},
        evento::{Evento, EventoComContagem},
        inscricao::{InscricaoDoAluno, InscritoEvento},
        mensalidade::{Mensalidade, MensalidadeComAluno},
        profile::ResponsavelResumo,
    },
};
use askama::Template;
use axum::response::Html;
use chrono::{Datelike, NaiveDate};

/// Renderiza um template; a falha vira `AppError::Template` (500).
pub fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    Ok(Html(template.render()?))
}

// --- Páginas ---

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub escola_nome: String,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub escola_nome: String,
    pub user_name: String,
    pub user_telefone: String,
    pub is_admin: bool,
    pub alunos: Vec<AlunoOpcao>,
    pub selecionado: Option<AlunoView>,
    pub mensalidades: Vec<MensalidadeView>,
    pub eventos: Vec<EventoParaAluno>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminPage {
    pub escola_nome: String,
    pub aba: String,
    pub busca: String,
    pub alunos: Vec<AlunoCard>,
    pub total_alunos: usize,
    pub eventos: Vec<EventoAdminView>,
    pub mensalidades: Vec<MensalidadeAdminView>,
    pub filtro_status: String,
    pub alunos_opcoes: Vec<AlunoOpcao>,
    pub responsaveis: Vec<ResponsavelView>,
    pub mes_atual: String,
    pub dia_vencimento: u32,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "admin_aluno.html")]
pub struct AdminAlunoPage {
    pub escola_nome: String,
    pub aluno: AlunoView,
    pub responsavel_nome: String,
    pub responsavel_email: String,
    pub responsavel_telefone: String,
    pub inscricoes: Vec<InscricaoView>,
    pub mensalidades: Vec<MensalidadeView>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "admin_evento.html")]
pub struct AdminEventoPage {
    pub escola_nome: String,
    pub evento: EventoAdminView,
    pub inscritos: Vec<InscritoView>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "carteirinha.html")]
pub struct CarteirinhaPage {
    pub escola_nome: String,
    pub aluno: AlunoView,
    pub responsavel_nome: String,
    pub responsavel_telefone: String,
    pub validade: String,
    pub voltar_url: String,
}

// --- Linhas e cartões já formatados para os templates ---

#[derive(Clone, Debug)]
pub struct AlunoOpcao {
    pub id: String,
    pub nome: String,
    pub selecionado: bool,
}

#[derive(Clone, Debug)]
pub struct AlunoView {
    pub id: String,
    pub nome: String,
    pub posicao: String,
    pub endereco: String,
    pub foto_url: String,
    pub idade: String,
    pub nascimento: String,
    // Valores para preencher <input type="date">
    pub data_nascimento_iso: String,
    pub data_inicio_pagamento_iso: String,
    pub numero_carteirinha: String,
}

impl AlunoView {
    pub fn from_aluno(aluno: &Aluno, hoje: NaiveDate) -> Self {
        AlunoView {
            id: aluno.id.clone(),
            nome: aluno.nome.clone(),
            posicao: aluno.posicao.clone().unwrap_or_default(),
            endereco: aluno.endereco.clone().unwrap_or_default(),
            foto_url: aluno.foto_url.clone().unwrap_or_default(),
            idade: aluno
                .idade(hoje)
                .map(|i| if i == 1 { "1 ano".to_string() } else { format!("{} anos", i) })
                .unwrap_or_default(),
            nascimento: aluno.data_nascimento.map(format::data_br).unwrap_or_default(),
            data_nascimento_iso: aluno
                .data_nascimento
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            data_inicio_pagamento_iso: aluno
                .data_inicio_pagamento
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            numero_carteirinha: aluno.numero_carteirinha(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AlunoCard {
    pub id: String,
    pub nome: String,
    pub posicao: String,
    pub foto_url: String,
    pub responsavel_nome: String,
}

impl From<&AlunoComResponsavel> for AlunoCard {
    fn from(a: &AlunoComResponsavel) -> Self {
        AlunoCard {
            id: a.aluno.id.clone(),
            nome: a.aluno.nome.clone(),
            posicao: a.aluno.posicao.clone().unwrap_or_default(),
            foto_url: a.aluno.foto_url.clone().unwrap_or_default(),
            responsavel_nome: a.responsavel_nome.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MensalidadeView {
    pub id: String,
    pub mes: String,
    pub vencimento: String,
    pub valor: String,
    pub status: String,
    pub pago: bool,
    pub atrasada: bool,
    pub whatsapp_link: String,
}

impl MensalidadeView {
    pub fn new(m: &Mensalidade, hoje: NaiveDate, whatsapp_link: Option<String>) -> Self {
        MensalidadeView {
            id: m.id.clone(),
            mes: format::mes_label(m.mes_referencia),
            vencimento: format::data_br(m.vencimento),
            valor: format::moeda(m.valor),
            status: m.status.as_str().to_uppercase(),
            pago: m.status == crate::models::mensalidade::StatusMensalidade::Pago,
            atrasada: m.atrasada(hoje),
            whatsapp_link: whatsapp_link.unwrap_or_default(),
        }
    }
}

/// Mensagem enviada pelo responsável à escola com o comprovativo.
pub fn mensagem_comprovante(aluno_nome: &str, m: &Mensalidade) -> String {
    format!(
        "Olá! Segue o comprovante da mensalidade de {} do(a) aluno(a) {} ({}).",
        format::mes_label(m.mes_referencia),
        aluno_nome,
        format::moeda(m.valor)
    )
}

/// Mensagem de cobrança enviada pela escola ao responsável.
/// Antes do vencimento é um lembrete; depois, um aviso de atraso.
pub fn mensagem_cobranca(
    escola_nome: &str,
    responsavel_nome: &str,
    aluno_nome: &str,
    m: &Mensalidade,
    hoje: NaiveDate,
) -> String {
    let prazo = if m.atrasada(hoje) {
        format!("venceu em {} e consta como pendente", format::data_br(m.vencimento))
    } else {
        format!("vence em {}", format::data_br(m.vencimento))
    };
    format!(
        "Olá, {}! A mensalidade de {} do(a) aluno(a) {} no valor de {} {}. {}",
        responsavel_nome,
        format::mes_label(m.mes_referencia),
        aluno_nome,
        format::moeda(m.valor),
        prazo,
        escola_nome
    )
}

#[derive(Clone, Debug)]
pub struct MensalidadeAdminView {
    pub linha: MensalidadeView,
    pub aluno_id: String,
    pub aluno_nome: String,
    pub responsavel_nome: String,
}

impl MensalidadeAdminView {
    pub fn new(m: &MensalidadeComAluno, hoje: NaiveDate, escola_nome: &str) -> Self {
        // Só faz sentido cobrar o que está pendente
        let link = if m.mensalidade.status == crate::models::mensalidade::StatusMensalidade::Pendente {
            m.responsavel_telefone.as_deref().and_then(|tel| {
                format::whatsapp_link(
                    tel,
                    &mensagem_cobranca(escola_nome, &m.responsavel_nome, &m.aluno_nome, &m.mensalidade, hoje),
                )
            })
        } else {
            None
        };
        MensalidadeAdminView {
            linha: MensalidadeView::new(&m.mensalidade, hoje, link),
            aluno_id: m.mensalidade.aluno_id.clone(),
            aluno_nome: m.aluno_nome.clone(),
            responsavel_nome: m.responsavel_nome.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EventoParaAluno {
    pub id: String,
    pub titulo: String,
    pub data_hora: String,
    pub local: String,
    pub descricao: String,
    pub valor: String,
    pub arquivo_url: String,
    pub inscrito: bool,
    pub pago: bool,
}

impl EventoParaAluno {
    pub fn new(e: &Evento, inscricao: Option<&InscricaoDoAluno>) -> Self {
        EventoParaAluno {
            id: e.id.clone(),
            titulo: e.titulo.clone(),
            data_hora: format::data_hora_br(e.data_hora),
            local: e.local.clone(),
            descricao: e.descricao.clone().unwrap_or_default(),
            valor: format::moeda(e.valor),
            arquivo_url: e.arquivo_url.clone().unwrap_or_default(),
            inscrito: inscricao.is_some(),
            pago: inscricao.map(|i| i.pago).unwrap_or(false),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EventoAdminView {
    pub id: String,
    pub titulo: String,
    pub data_hora: String,
    pub local: String,
    pub descricao: String,
    pub valor: String,
    pub arquivo_url: String,
    pub qtd_inscritos: i64,
}

impl EventoAdminView {
    pub fn new(e: &Evento, qtd_inscritos: i64) -> Self {
        EventoAdminView {
            id: e.id.clone(),
            titulo: e.titulo.clone(),
            data_hora: format::data_hora_br(e.data_hora),
            local: e.local.clone(),
            descricao: e.descricao.clone().unwrap_or_default(),
            valor: format::moeda(e.valor),
            arquivo_url: e.arquivo_url.clone().unwrap_or_default(),
            qtd_inscritos,
        }
    }
}

impl From<&EventoComContagem> for EventoAdminView {
    fn from(e: &EventoComContagem) -> Self {
        EventoAdminView::new(&e.evento, e.qtd_inscritos)
    }
}

#[derive(Clone, Debug)]
pub struct InscricaoView {
    pub evento_id: String,
    pub evento_titulo: String,
    pub data_hora: String,
    pub valor: String,
    pub pago: bool,
}

impl From<&InscricaoDoAluno> for InscricaoView {
    fn from(i: &InscricaoDoAluno) -> Self {
        InscricaoView {
            evento_id: i.evento_id.clone(),
            evento_titulo: i.evento_titulo.clone(),
            data_hora: format::data_hora_br(i.data_hora),
            valor: format::moeda(i.valor),
            pago: i.pago,
        }
    }
}

#[derive(Clone, Debug)]
pub struct InscritoView {
    pub inscricao_id: String,
    pub aluno_id: String,
    pub aluno_nome: String,
    pub responsavel_nome: String,
    pub responsavel_telefone: String,
    pub pago: bool,
}

impl From<&InscritoEvento> for InscritoView {
    fn from(i: &InscritoEvento) -> Self {
        InscritoView {
            inscricao_id: i.inscricao_id.clone(),
            aluno_id: i.aluno_id.clone(),
            aluno_nome: i.aluno_nome.clone(),
            responsavel_nome: i.responsavel_nome.clone(),
            responsavel_telefone: i.responsavel_telefone.clone().unwrap_or_default(),
            pago: i.pago,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResponsavelView {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub telefone: String,
    pub is_admin: bool,
    pub qtd_alunos: i64,
}

impl From<&ResponsavelResumo> for ResponsavelView {
    fn from(r: &ResponsavelResumo) -> Self {
        ResponsavelView {
            id: r.id.clone(),
            email: r.email.clone(),
            full_name: r.full_name.clone(),
            telefone: r.telefone.clone().unwrap_or_default(),
            is_admin: r.is_admin,
            qtd_alunos: r.qtd_alunos,
        }
    }
}

/// Validade da carteirinha: 31/12 do ano corrente.
pub fn validade_carteirinha(hoje: NaiveDate) -> String {
    format!("31/12/{}", hoje.year())
}
