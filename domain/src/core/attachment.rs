//! Attachment value object

use super::error::DomainError;

/// A file passed to backends alongside the prompt (Value Object)
///
/// Encoding and size policy belong to the backends; the domain only knows
/// the name, the MIME type and the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    name: String,
    mime_type: String,
    data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment with an explicit MIME type.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidAttachment(
                "attachment name cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            name,
            mime_type: mime_type.into(),
            data,
        })
    }

    /// Create an attachment, guessing the MIME type from the file extension.
    pub fn from_file_name(name: impl Into<String>, data: Vec<u8>) -> Result<Self, DomainError> {
        let name = name.into();
        let mime_type = guess_mime_type(&name);
        Self::new(name, mime_type, data)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the attachment can be read as text.
    pub fn is_text(&self) -> bool {
        let textual_mime = self.mime_type.starts_with("text/")
            || matches!(
                self.mime_type.as_str(),
                "application/json" | "application/toml" | "application/yaml"
            );
        textual_mime && std::str::from_utf8(&self.data).is_ok()
    }

    /// Render a text attachment as a fenced block for inclusion in a prompt.
    ///
    /// Returns `None` for binary attachments.
    pub fn inline_text(&self) -> Option<String> {
        if !self.is_text() {
            return None;
        }
        let body = std::str::from_utf8(&self.data).ok()?;
        Some(format!(
            "Attachment `{}` ({}):\n```\n{}\n```",
            self.name,
            self.mime_type,
            body.trim_end()
        ))
    }
}

fn guess_mime_type(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "rs" | "py" | "ts" | "js" | "go" | "java" | "c" | "h" | "cpp" | "sh" | "sql" => {
            "text/x-source"
        }
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "toml" => "application/toml",
        "yaml" | "yml" => "application/yaml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
