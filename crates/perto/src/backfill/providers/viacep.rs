//! ViaCEP postal-code expansion.
//!
//! ViaCEP resolves a Brazilian CEP to a street address but returns no
//! coordinates, so it feeds the geocoders instead of being one: the
//! pipeline calls [`expand_postal_code`] when an entity has a CEP but no
//! address, and geocodes the resulting address text.

use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::USER_AGENT;
use crate::backfill::BackfillError;

static CLIENT: Lazy<Client> = Lazy::new(Client::new);

#[derive(Debug, Deserialize)]
struct Payload {
    /// Present (any shape) only when the CEP does not exist.
    #[serde(default)]
    erro: Option<serde_json::Value>,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
}

impl Payload {
    fn into_address(self) -> Option<String> {
        if self.erro.is_some() {
            return None;
        }
        let parts: Vec<&str> = [
            self.logradouro.as_str(),
            self.bairro.as_str(),
            self.localidade.as_str(),
            self.uf.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Strip formatting from a CEP; `None` unless exactly eight digits remain.
fn normalize_cep(cep: &str) -> Option<String> {
    let digits: String = cep.chars().filter(char::is_ascii_digit).collect();
    (digits.len() == 8).then_some(digits)
}

/// Resolve a CEP like `"01304-001"` to a single-line street address, or
/// `None` when the CEP is malformed or unknown.
pub async fn expand_postal_code(cep: &str) -> Result<Option<String>, BackfillError> {
    let Some(digits) = normalize_cep(cep) else {
        return Ok(None);
    };

    let url = format!("https://viacep.com.br/ws/{digits}/json/");
    let payload: Payload = CLIENT
        .get(&url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let address = payload.into_address();
    debug!(cep = digits, ?address, "postal code expanded");
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cep() {
        assert_eq!(normalize_cep("01304-001"), Some("01304001".to_string()));
        assert_eq!(normalize_cep("01304001"), Some("01304001".to_string()));
        assert_eq!(normalize_cep("1304-001"), None);
        assert_eq!(normalize_cep("not a cep"), None);
    }

    #[test]
    fn test_payload_composes_address() {
        let raw = r#"{
            "cep": "01304-001",
            "logradouro": "Rua Augusta",
            "bairro": "Consolação",
            "localidade": "São Paulo",
            "uf": "SP"
        }"#;
        let payload: Payload = serde_json::from_str(raw).unwrap();
        assert_eq!(
            payload.into_address(),
            Some("Rua Augusta, Consolação, São Paulo, SP".to_string())
        );
    }

    #[test]
    fn test_error_payload_means_unknown_cep() {
        let older: Payload = serde_json::from_str(r#"{"erro": true}"#).unwrap();
        assert_eq!(older.into_address(), None);

        let newer: Payload = serde_json::from_str(r#"{"erro": "true"}"#).unwrap();
        assert_eq!(newer.into_address(), None);
    }

    #[test]
    fn test_empty_fields_are_skipped() {
        let payload: Payload =
            serde_json::from_str(r#"{"localidade": "São Paulo", "uf": "SP"}"#).unwrap();
        assert_eq!(payload.into_address(), Some("São Paulo, SP".to_string()));
    }
}
