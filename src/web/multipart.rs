// src/web/multipart.rs
//! Leitura dos formulários `multipart/form-data` (matrícula com foto, evento com anexo).
use crate::{
    error::{AppError, AppResult},
    models::profile::texto_opcional,
    services::storage_service::UploadedFile,
};
use axum::extract::Multipart;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct FormularioMultipart {
    campos: HashMap<String, String>,
    ficheiros: HashMap<String, UploadedFile>,
}

impl FormularioMultipart {
    /// Consome o corpo todo. Campos de ficheiro sem conteúdo são ignorados.
    pub async fn ler(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = FormularioMultipart::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Upload(format!("Formulário inválido: {}", e)))?
        {
            let nome = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Upload(format!("Falha ao ler ficheiro: {}", e)))?;
                    if bytes.is_empty() {
                        continue;
                    }
                    tracing::debug!("Multipart: ficheiro '{}' ({} bytes) no campo {}", file_name, bytes.len(), nome);
                    form.ficheiros.insert(nome, UploadedFile { file_name, bytes: bytes.to_vec() });
                }
                None => {
                    let texto = field
                        .text()
                        .await
                        .map_err(|e| AppError::Upload(format!("Falha ao ler campo: {}", e)))?;
                    form.campos.insert(nome, texto);
                }
            }
        }
        Ok(form)
    }

    pub fn texto(&self, nome: &str) -> String {
        self.campos.get(nome).map(|v| v.trim().to_string()).unwrap_or_default()
    }

    /// Campo de texto, `None` quando vazio.
    pub fn opcional(&self, nome: &str) -> Option<String> {
        self.campos.get(nome).and_then(|v| texto_opcional(v))
    }

    /// Campo `<input type="date">`. Vazio é `None`; formato errado é erro de validação.
    pub fn data(&self, nome: &str) -> AppResult<Option<NaiveDate>> {
        match self.opcional(nome) {
            None => Ok(None),
            Some(v) => NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| AppError::Validation(format!("Data inválida: {}", v))),
        }
    }

    pub fn ficheiro(&self, nome: &str) -> Option<&UploadedFile> {
        self.ficheiros.get(nome)
    }

    #[cfg(test)]
    pub(crate) fn com_dados(campos: &[(&str, &str)], ficheiros: Vec<(&str, UploadedFile)>) -> Self {
        FormularioMultipart {
            campos: campos.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ficheiros: ficheiros.into_iter().map(|(k, f)| (k.to_string(), f)).collect(),
        }
    }
}
