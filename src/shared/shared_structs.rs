// src/shared/shared_structs.rs

use serde::Serialize;

/// Content-Type de todas as respostas JSON da API.
pub const CONTENT_TYPE_JSON: &str = "application/json;charset=UTF-8";

/// Estrutura padrão para as respostas de erro da API.
///
/// Segue o formato `{"code", "message", "fieldErrors"?}` documentado para
/// todos os endpoints de compras.
#[derive(Debug, Serialize)]
pub struct ErroResponse {
    pub code: String,
    pub message: String,
    #[serde(rename = "fieldErrors", skip_serializing_if = "Option::is_none")] // Só aparece nos erros de validação
    pub field_errors: Option<Vec<FieldError>>,
}

impl ErroResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        ErroResponse {
            code: code.to_string(),
            message: message.into(),
            field_errors: None,
        }
    }
}

/// Erro de validação de um único campo do recurso.
/// `field` pode ser um caminho indexado, ex.: `purchaseDetails[0].quantity`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub code: String,
    pub field: String,
    pub resource: String,
    pub message: String,
}
