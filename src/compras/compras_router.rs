// src/compras/compras_router.rs

use actix_web::http::header;
use actix_web::{error, get, post, route, web, HttpRequest, HttpResponse};
use chrono::Utc;
use tracing::info;

use super::compras_repositorio::compra_nao_encontrada;
use super::compras_structs::Compra;
use crate::shared::erros::{AppError, Result};
use crate::shared::shared_structs::CONTENT_TYPE_JSON;
use crate::AppState;

/// Rota para buscar as compras válidas (não expiradas).
///
/// Responde `204 No Content` quando não existe nenhuma compra válida.
#[get("/purchases")]
pub async fn buscar_compras_validas(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse> {
    exigir_json(&req)?;
    info!("Buscando todas as compras válidas");

    let compras = data.servico_compras.listar_validas(Utc::now()).await?;

    if compras.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }

    info!("{} compras válidas encontradas", compras.len());
    Ok(HttpResponse::Ok().content_type(CONTENT_TYPE_JSON).json(compras))
}

/// Rota para cadastrar uma nova compra com os seus detalhes.
///
/// Os ids ausentes são gerados pelo repositório; a expiração é sempre
/// calculada pelo servidor.
#[post("/purchases")]
pub async fn cadastrar_compra(
    req: HttpRequest,
    data: web::Data<AppState>,
    compra: web::Json<Compra>,
) -> Result<HttpResponse> {
    exigir_json(&req)?;
    info!("Salvando compra");

    let criada = data.servico_compras.criar(compra.into_inner(), Utc::now()).await?;

    Ok(HttpResponse::Created().content_type(CONTENT_TYPE_JSON).json(criada))
}

/// Rota para atualizar uma compra existente.
///
/// PUT e PATCH têm o mesmo comportamento: o tipo do produto e a lista de
/// detalhes são substituídos por completo.
#[route("/purchases/{purchase_id}", method = "PUT", method = "PATCH")]
pub async fn atualizar_compra(
    req: HttpRequest,
    data: web::Data<AppState>,
    purchase_id: web::Path<i64>,
    compra: web::Json<Compra>,
) -> Result<HttpResponse> {
    exigir_json(&req)?;
    let purchase_id = purchase_id.into_inner();
    info!("Atualizando compra {}", purchase_id);

    let atualizada = data
        .servico_compras
        .atualizar(purchase_id, compra.into_inner(), Utc::now())
        .await?;

    Ok(HttpResponse::Ok().content_type(CONTENT_TYPE_JSON).json(atualizada))
}

/// Registra as rotas de compras sob `/api`, junto com os tratadores de erro
/// dos extratores (JSON malformado e id não numérico).
pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(erro_de_json))
        .app_data(web::PathConfig::default().error_handler(erro_de_path))
        .service(
            web::scope("/api")
                .service(buscar_compras_validas)
                .service(cadastrar_compra)
                .service(atualizar_compra),
        );
}

/// Recusa requisições cujo `Accept` não admite JSON. Sem o cabeçalho, qualquer
/// formato serve.
fn exigir_json(req: &HttpRequest) -> Result<()> {
    let accept = match req.headers().get(header::ACCEPT) {
        Some(valor) => valor.to_str().unwrap_or(""),
        None => return Ok(()),
    };
    if accept.trim().is_empty() {
        return Ok(());
    }

    let aceita = accept.split(',').any(|faixa| {
        let tipo = faixa.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        matches!(tipo.as_str(), "*/*" | "application/*" | "application/json")
    });
    if aceita {
        Ok(())
    } else {
        Err(AppError::FormatoNaoAceito("application/json".to_string()))
    }
}

fn erro_de_json(erro: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::PayloadInvalido(erro.to_string()).into()
}

// Um id que não é número nunca corresponde a uma compra
fn erro_de_path(_erro: error::PathError, req: &HttpRequest) -> actix_web::Error {
    let id = req.match_info().get("purchase_id").unwrap_or_default();
    compra_nao_encontrada(id).into()
}
