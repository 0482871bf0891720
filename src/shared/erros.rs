// src/shared/erros.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use super::shared_structs::{ErroResponse, FieldError, CONTENT_TYPE_JSON};

/// Erros da aplicação.
///
/// Cada variante sabe qual status HTTP e qual corpo JSON devolver, então os
/// handlers só precisam propagar com `?`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid purchase")]
    CompraInvalida(Vec<FieldError>),

    #[error("Malformed purchase payload: {0}")]
    PayloadInvalido(String),

    #[error("{0}")]
    ViolacaoIntegridade(String),

    #[error("{0}")]
    NaoEncontrada(String),

    #[error("Response can only be produced as {0}")]
    FormatoNaoAceito(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Database Error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migracao(#[from] sqlx::migrate::MigrateError),

    #[error("Internal Server Error: {0}")]
    Interno(String),
}

impl AppError {
    /// Código de máquina enviado no campo `code` da resposta.
    pub fn codigo(&self) -> &'static str {
        match self {
            AppError::CompraInvalida(_) | AppError::PayloadInvalido(_) => "InvalidPurchase",
            AppError::ViolacaoIntegridade(_) => "DataIntegrityViolation",
            AppError::NaoEncontrada(_) => "NotFound",
            AppError::FormatoNaoAceito(_) => "NotAcceptable",
            AppError::Config(_) | AppError::Sqlx(_) | AppError::Migracao(_) | AppError::Interno(_) => {
                "InternalError"
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::CompraInvalida(_) | AppError::PayloadInvalido(_) => StatusCode::BAD_REQUEST,
            AppError::ViolacaoIntegridade(_) => StatusCode::CONFLICT,
            AppError::NaoEncontrada(_) => StatusCode::NOT_FOUND,
            AppError::FormatoNaoAceito(_) => StatusCode::NOT_ACCEPTABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let corpo = match self {
            AppError::CompraInvalida(field_errors) => ErroResponse {
                field_errors: Some(field_errors.clone()),
                ..ErroResponse::new(self.codigo(), self.to_string())
            },
            AppError::PayloadInvalido(_)
            | AppError::ViolacaoIntegridade(_)
            | AppError::NaoEncontrada(_)
            | AppError::FormatoNaoAceito(_) => {
                tracing::warn!(erro = %self, "Requisição rejeitada");
                ErroResponse::new(self.codigo(), self.to_string())
            }
            // Detalhes internos ficam apenas no log
            _ => {
                tracing::error!(erro = %self, "Erro interno ao processar a requisição");
                ErroResponse::new(self.codigo(), "Internal server error")
            }
        };

        HttpResponse::build(self.status_code())
            .content_type(CONTENT_TYPE_JSON)
            .json(corpo)
    }
}

/// Alias de `Result` usado em toda a aplicação.
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn corpo_json(erro: AppError) -> (StatusCode, serde_json::Value) {
        let resposta = erro.error_response();
        let status = resposta.status();
        let bytes = to_bytes(resposta.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn compra_invalida_lista_os_campos() {
        let erro = AppError::CompraInvalida(vec![FieldError {
            code: "NotEmpty".to_string(),
            field: "productType".to_string(),
            resource: "purchase".to_string(),
            message: "ProductType is empty".to_string(),
        }]);

        let (status, corpo) = corpo_json(erro).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(corpo["code"], "InvalidPurchase");
        assert_eq!(corpo["message"], "Invalid purchase");
        assert_eq!(corpo["fieldErrors"][0]["field"], "productType");
        assert_eq!(corpo["fieldErrors"][0]["resource"], "purchase");
    }

    #[actix_web::test]
    async fn violacao_de_integridade_nao_tem_field_errors() {
        let (status, corpo) =
            corpo_json(AppError::ViolacaoIntegridade("Purchase id already in use".to_string())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            corpo,
            serde_json::json!({"code": "DataIntegrityViolation", "message": "Purchase id already in use"})
        );
    }

    #[actix_web::test]
    async fn formato_nao_aceito_responde_406() {
        let (status, corpo) = corpo_json(AppError::FormatoNaoAceito("application/json".to_string())).await;

        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
        assert_eq!(
            corpo,
            serde_json::json!({"code": "NotAcceptable", "message": "Response can only be produced as application/json"})
        );
    }

    #[actix_web::test]
    async fn erro_interno_nao_vaza_detalhes() {
        let (status, corpo) = corpo_json(AppError::Interno("lock envenenado".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(corpo["code"], "InternalError");
        assert_eq!(corpo["message"], "Internal server error");
    }
}
