// src/main.rs

use std::io;
use std::sync::Arc;

use actix_web::{get, web, App, HttpResponse, HttpServer};
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

// Importa os módulos
mod compras; // Módulo de compras
mod config; // Configuração via variáveis de ambiente
mod shared; // Módulo shared

use compras::compras_repositorio::RepositorioCompras;
use compras::compras_service::ServicoCompras;
use compras::repositorio_memoria::RepositorioMemoria;
use compras::repositorio_postgres::RepositorioPostgres;
use config::AppConfig;
use shared::erros::AppError;

// Estado compartilhado entre as rotas: o serviço de compras e o repositório por trás dele.
pub struct AppState {
    pub servico_compras: ServicoCompras,
}

/// Rota simples de verificação de saúde do serviço.
#[get("/health")]
async fn verificar_saude() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Escolhe o repositório: PostgreSQL quando há DATABASE_URL, memória caso contrário.
async fn criar_repositorio(config: &AppConfig) -> Result<Arc<dyn RepositorioCompras>, AppError> {
    match &config.database_url {
        Some(database_url) => {
            let db_pool = PgPool::connect(database_url).await?;
            tracing::info!("Conectado ao banco PostgreSQL.");

            let repositorio = RepositorioPostgres::new(db_pool);
            repositorio.migrar().await?;
            if config.seed_db {
                tracing::warn!("SEED_DB é ignorado quando DATABASE_URL está definido.");
            }
            Ok(Arc::new(repositorio))
        }
        None if config.seed_db => {
            tracing::info!("Usando repositório em memória com compras de demonstração.");
            Ok(Arc::new(RepositorioMemoria::com_dados_demo(chrono::Utc::now())))
        }
        None => {
            tracing::info!("Usando repositório em memória.");
            Ok(Arc::new(RepositorioMemoria::new()))
        }
    }
}

// Função principal da aplicação Actix Web.
#[actix_web::main]
async fn main() -> io::Result<()> {
    // Logs no formato texto; RUST_LOG sobrescreve o nível padrão
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!(erro = %e, "Falha ao carregar a configuração.");
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let repositorio = criar_repositorio(&config).await.map_err(|e| {
        tracing::error!(erro = %e, "Falha ao preparar o repositório de compras.");
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;

    // web::Data é usado para compartilhar o estado entre as rotas.
    let app_state = web::Data::new(AppState {
        servico_compras: ServicoCompras::new(repositorio, config.validade()),
    });

    tracing::info!(
        "Iniciando API de compras em {}:{}...",
        config.server_host,
        config.server_port
    );

    // Configura e inicia o servidor HTTP.
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(app_state.clone())
            .service(verificar_saude)
            // Módulo de Compras
            .configure(compras::compras_router::configurar)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};

    #[actix_web::test]
    async fn saude_responde_ok() {
        let app = test::init_service(App::new().service(verificar_saude)).await;

        let resposta = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

        assert_eq!(resposta.status(), StatusCode::OK);
        let corpo: serde_json::Value = test::read_body_json(resposta).await;
        assert_eq!(corpo, serde_json::json!({"status": "ok"}));
    }

    #[actix_web::test]
    async fn sem_database_url_usa_repositorio_em_memoria() {
        let config = AppConfig::from_lookup(|nome| match nome {
            "SEED_DB" => Some("true".to_string()),
            _ => None,
        })
        .unwrap();

        let repositorio = criar_repositorio(&config).await.unwrap();

        assert_eq!(repositorio.listar_todas().await.unwrap().len(), 4);
    }
}
