// src/compras/compras_validator.rs

use super::compras_structs::Compra;
use crate::shared::erros::{AppError, Result};
use crate::shared::shared_structs::FieldError;

// Nome do recurso enviado em cada FieldError
const RECURSO: &str = "purchase";

/// Valida os campos de uma compra recebida no create/update.
///
/// Todos os erros são acumulados, na ordem do payload, antes de devolver
/// `AppError::CompraInvalida`. Nada é persistido se houver erro.
pub fn validar_compra(compra: &Compra) -> Result<()> {
    let mut erros = Vec::new();

    let product_type_vazio = compra
        .product_type
        .as_deref()
        .map(|tipo| tipo.trim().is_empty())
        .unwrap_or(true);
    if product_type_vazio {
        erros.push(field_error("NotEmpty", "productType".to_string(), "ProductType is empty"));
    }

    for (indice, detalhe) in compra.purchase_details.iter().enumerate() {
        let campo = format!("purchaseDetails[{}].quantity", indice);
        match detalhe.quantity {
            None | Some(0) => erros.push(field_error(
                "NotNull",
                campo,
                "PurchaseDetail quantity is null or equals to 0",
            )),
            Some(quantidade) if quantidade < 0 => erros.push(field_error(
                "Positive",
                campo,
                "PurchaseDetail quantity must be greater than 0",
            )),
            Some(_) => {}
        }
    }

    if erros.is_empty() {
        Ok(())
    } else {
        Err(AppError::CompraInvalida(erros))
    }
}

fn field_error(code: &str, field: String, message: &str) -> FieldError {
    FieldError {
        code: code.to_string(),
        field,
        resource: RECURSO.to_string(),
        message: message.to_string(),
    }
}
