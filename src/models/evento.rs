// src/models/evento.rs
use chrono::NaiveDateTime;
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow)]
pub struct Evento {
    pub id: String,
    pub titulo: String,
    pub data_hora: NaiveDateTime,
    pub local: String,
    pub descricao: Option<String>,
    pub valor: f64,
    pub arquivo_url: Option<String>,
}

/// Evento com a contagem de inscritos, para a aba de eventos do admin.
#[derive(Debug, Clone, FromRow)]
pub struct EventoComContagem {
    #[sqlx(flatten)]
    pub evento: Evento,
    pub qtd_inscritos: i64,
}

#[derive(Debug, Clone, Validate)]
pub struct EventoDados {
    #[validate(length(min = 1, max = 150, message = "Informe o título do evento."))]
    pub titulo: String,
    pub data_hora: NaiveDateTime,
    #[validate(length(min = 1, max = 200, message = "Informe o local do evento."))]
    pub local: String,
    pub descricao: Option<String>,
    #[validate(range(min = 0.0, message = "O valor não pode ser negativo."))]
    pub valor: f64,
}

/// Lê o valor de um `<input type="datetime-local">` ("2026-11-05T19:30", com ou sem segundos).
pub fn parse_data_hora(texto: &str) -> Option<NaiveDateTime> {
    let texto = texto.trim();
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(texto, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le_datetime_local() {
        let dt = parse_data_hora("2026-11-05T19:30").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2026-11-05 19:30");
        assert!(parse_data_hora("2026-11-05T19:30:15").is_some());
        assert!(parse_data_hora("05/11/2026").is_none());
    }
}
