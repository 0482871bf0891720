// src/compras/compras_structs.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Estrutura que representa uma compra, tanto no corpo das requisições
/// quanto nas respostas e no repositório.
///
/// Os campos são opcionais porque o cliente pode omiti-los; o validador decide
/// o que é obrigatório. Uma compra salva sempre tem `id` e `expires`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    // Serializado como epoch em milissegundos
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub purchase_details: Vec<DetalheCompra>,
}

/// Item (linha) de uma compra.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetalheCompra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Compra {
    /// Compra válida = ainda não expirou no instante `agora`.
    pub fn valida_em(&self, agora: DateTime<Utc>) -> bool {
        self.expires
            .map(|expires| expires.timestamp_millis() >= agora.timestamp_millis())
            .unwrap_or(false)
    }

    /// Ids de detalhe informados, na ordem do payload.
    pub fn ids_detalhes(&self) -> impl Iterator<Item = i64> + '_ {
        self.purchase_details.iter().filter_map(|detalhe| detalhe.id)
    }
}
