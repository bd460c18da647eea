// src/format.rs
//! Formatação de datas, valores e links para exibição nas páginas.
use chrono::{Datelike, NaiveDate, NaiveDateTime};

const MESES: [&str; 12] = [
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho",
    "Julho", "Agosto", "Setembro", "Outubro", "Novembro", "Dezembro",
];

/// "2026-10-01" -> "Outubro/2026".
/// Trabalha sobre a data de calendário, sem fuso horário, por isso o mês nunca recua.
pub fn mes_label(mes_referencia: NaiveDate) -> String {
    format!("{}/{}", MESES[mes_referencia.month0() as usize], mes_referencia.year())
}

/// Aceita "2026-10" (input type=month) ou uma data completa "2026-10-15".
/// Devolve sempre o primeiro dia do mês.
pub fn parse_mes(texto: &str) -> Option<NaiveDate> {
    let texto = texto.trim();
    let data = NaiveDate::parse_from_str(&format!("{}-01", texto), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(texto, "%Y-%m-%d"))
        .ok()?;
    data.with_day(1)
}

pub fn ultimo_dia_do_mes(data: NaiveDate) -> NaiveDate {
    let (ano, mes) = if data.month() == 12 {
        (data.year() + 1, 1)
    } else {
        (data.year(), data.month() + 1)
    };
    NaiveDate::from_ymd_opt(ano, mes, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(data)
}

/// Dia `dia` do mês de `mes`, limitado ao último dia (ex: 31 em fevereiro -> 28/29).
pub fn dia_no_mes(mes: NaiveDate, dia: u32) -> NaiveDate {
    let ultimo = ultimo_dia_do_mes(mes);
    ultimo.with_day(dia.clamp(1, ultimo.day())).unwrap_or(ultimo)
}

pub fn data_br(data: NaiveDate) -> String {
    data.format("%d/%m/%Y").to_string()
}

pub fn data_hora_br(data_hora: NaiveDateTime) -> String {
    data_hora.format("%d/%m/%Y %H:%M").to_string()
}

/// Idade em anos completos na data `hoje`.
pub fn idade(nascimento: NaiveDate, hoje: NaiveDate) -> u32 {
    if hoje < nascimento {
        return 0;
    }
    let mut anos = hoje.year() - nascimento.year();
    if (hoje.month(), hoje.day()) < (nascimento.month(), nascimento.day()) {
        anos -= 1;
    }
    anos.max(0) as u32
}

/// 1234.5 -> "R$ 1.234,50"
pub fn moeda(valor: f64) -> String {
    let centavos_total = (valor.abs() * 100.0).round() as u64;
    let inteiro = (centavos_total / 100).to_string();
    let centavos = centavos_total % 100;

    let mut agrupado = String::with_capacity(inteiro.len() + inteiro.len() / 3);
    for (i, c) in inteiro.chars().enumerate() {
        if i > 0 && (inteiro.len() - i) % 3 == 0 {
            agrupado.push('.');
        }
        agrupado.push(c);
    }

    let sinal = if valor < 0.0 && centavos_total > 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sinal, agrupado, centavos)
}

/// Lê valores escritos à brasileira ("1.234,56", "150,00") ou com ponto ("150.5").
pub fn parse_valor(texto: &str) -> Option<f64> {
    let limpo: String = texto
        .trim()
        .trim_start_matches("R$")
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if limpo.is_empty() {
        return None;
    }
    let normalizado = if limpo.contains(',') {
        limpo.replace('.', "").replace(',', ".")
    } else if agrupado_por_milhares(&limpo) {
        // "1.500" é mil e quinhentos, não um e meio
        limpo.replace('.', "")
    } else {
        limpo
    };
    normalizado.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// "1.500", "1.234.567": 1 a 3 dígitos e depois grupos de exatamente 3.
fn agrupado_por_milhares(texto: &str) -> bool {
    let mut grupos = texto.split('.');
    let primeiro = grupos.next().unwrap_or_default();
    let mut resto = grupos.peekable();
    resto.peek().is_some()
        && (1..=3).contains(&primeiro.len())
        && primeiro.chars().all(|c| c.is_ascii_digit())
        && resto.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

/// Só os dígitos de um telefone; números nacionais (10 ou 11 dígitos) recebem o DDI 55.
pub fn telefone_whatsapp(telefone: &str) -> Option<String> {
    let digitos: String = telefone.chars().filter(|c| c.is_ascii_digit()).collect();
    match digitos.len() {
        0..=9 => None,
        10 | 11 => Some(format!("55{}", digitos)),
        _ => Some(digitos),
    }
}

/// Link `wa.me` com a mensagem já codificada; `None` se o telefone não servir.
pub fn whatsapp_link(telefone: &str, mensagem: &str) -> Option<String> {
    let numero = telefone_whatsapp(telefone)?;
    Some(format!("https://wa.me/{}?text={}", numero, urlencoding::encode(mensagem)))
}
