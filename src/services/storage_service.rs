// src/services/storage_service.rs
//! Armazenamento de ficheiros (fotos dos alunos e anexos dos eventos) no disco local,
//! servidos publicamente em `/uploads/<bucket>/<ficheiro>`.
use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const PUBLIC_PREFIX: &str = "/uploads";

const IMAGE_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];
const DOCUMENT_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Fotos,
    Arquivos,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Fotos => "fotos",
            Bucket::Arquivos => "arquivos",
        }
    }

    fn formatos(&self) -> &'static [&'static str] {
        match self {
            Bucket::Fotos => IMAGE_FORMATS,
            Bucket::Arquivos => DOCUMENT_FORMATS,
        }
    }
}

/// Ficheiro recebido num formulário multipart.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

fn extensao(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Confere a assinatura do conteúdo com a extensão declarada.
fn assinatura_confere(ext: &str, bytes: &[u8]) -> bool {
    match ext {
        "png" => bytes.starts_with(&[0x89, b'P', b'N', b'G']),
        "jpg" | "jpeg" => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        "gif" => bytes.starts_with(b"GIF8"),
        "webp" => bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
        "pdf" => bytes.starts_with(b"%PDF"),
        _ => false,
    }
}

pub fn validate_upload(bucket: Bucket, file: &UploadedFile, max_bytes: usize) -> AppResult<String> {
    if file.bytes.is_empty() {
        return Err(AppError::Upload("Ficheiro vazio.".into()));
    }
    if file.bytes.len() > max_bytes {
        return Err(AppError::Upload(format!(
            "Ficheiro demasiado grande (máximo {} MB).",
            max_bytes / 1024 / 1024
        )));
    }

    let ext = extensao(&file.file_name)
        .filter(|e| bucket.formatos().contains(&e.as_str()))
        .ok_or_else(|| {
            AppError::Upload(format!(
                "Formato não suportado. Use: {}.",
                bucket.formatos().join(", ")
            ))
        })?;

    if !assinatura_confere(&ext, &file.bytes) {
        return Err(AppError::Upload("O conteúdo do ficheiro não corresponde ao formato.".into()));
    }
    Ok(ext)
}

/// Grava o ficheiro e devolve o URL público.
pub async fn save_upload(
    upload_dir: &Path,
    bucket: Bucket,
    file: &UploadedFile,
    max_bytes: usize,
) -> AppResult<String> {
    let ext = validate_upload(bucket, file, max_bytes)?;

    let dir = upload_dir.join(bucket.as_str());
    tokio::fs::create_dir_all(&dir).await?;

    let file_name = format!("{}.{}", Uuid::new_v4(), ext);
    tokio::fs::write(dir.join(&file_name), &file.bytes).await?;

    let url = format!("{}/{}/{}", PUBLIC_PREFIX, bucket.as_str(), file_name);
    tracing::info!("📎 Upload '{}' gravado em {} ({} bytes)", file.file_name, url, file.bytes.len());
    Ok(url)
}

/// Caminho local de um URL público devolvido por `save_upload`.
pub fn local_path(upload_dir: &Path, public_url: &str) -> Option<PathBuf> {
    let relativo = public_url.strip_prefix(PUBLIC_PREFIX)?.trim_start_matches('/');
    let mut partes = relativo.split('/');
    let bucket = partes.next()?;
    let nome = partes.next()?;
    if partes.next().is_some()
        || !matches!(bucket, "fotos" | "arquivos")
        || nome.is_empty()
        || nome.contains("..")
    {
        return None;
    }
    Some(upload_dir.join(bucket).join(nome))
}

/// Remove um ficheiro antigo. Falhas só ficam no log.
pub async fn remove_upload(upload_dir: &Path, public_url: &str) {
    let Some(path) = local_path(upload_dir, public_url) else {
        return;
    };
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!("Não foi possível remover {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    fn ficheiro(nome: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: nome.into(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn valida_formato_e_tamanho() {
        assert_eq!(validate_upload(Bucket::Fotos, &ficheiro("eu.PNG", PNG), 1024).unwrap(), "png");
        assert!(validate_upload(Bucket::Fotos, &ficheiro("doc.pdf", b"%PDF-1.7"), 1024).is_err());
        assert!(validate_upload(Bucket::Arquivos, &ficheiro("doc.pdf", b"%PDF-1.7"), 1024).is_ok());
        assert!(validate_upload(Bucket::Fotos, &ficheiro("falso.png", b"nada"), 1024).is_err());
        assert!(validate_upload(Bucket::Fotos, &ficheiro("eu.png", PNG), 4).is_err());
        assert!(validate_upload(Bucket::Fotos, &ficheiro("eu.png", &[]), 1024).is_err());
    }

    #[test]
    fn caminho_local_so_para_urls_validos() {
        let base = Path::new("/srv/uploads");
        assert_eq!(
            local_path(base, "/uploads/fotos/abc.png"),
            Some(PathBuf::from("/srv/uploads/fotos/abc.png"))
        );
        assert_eq!(local_path(base, "/uploads/fotos/../../etc/passwd"), None);
        assert_eq!(local_path(base, "/uploads/outros/abc.png"), None);
        assert_eq!(local_path(base, "https://exemplo.com/a.png"), None);
    }

    #[tokio::test]
    async fn grava_e_remove() {
        let dir = std::env::temp_dir().join(format!("escolinha-storage-{}", Uuid::new_v4()));
        let url = save_upload(&dir, Bucket::Fotos, &ficheiro("foto.png", PNG), 1024).await.unwrap();
        assert!(url.starts_with("/uploads/fotos/"));

        let path = local_path(&dir, &url).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), PNG);

        remove_upload(&dir, &url).await;
        assert!(!path.exists());
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
