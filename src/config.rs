// src/config.rs

use std::env;

use dotenvy::dotenv;

use crate::shared::erros::{AppError, Result};

/// Configuração da aplicação, lida das variáveis de ambiente (ou do arquivo `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    // Sem DATABASE_URL as compras ficam apenas em memória
    pub database_url: Option<String>,
    // Quanto tempo uma compra continua válida depois de criada/atualizada
    pub validade_minutos: i64,
    pub seed_db: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Carrega o .env se existir

        Self::from_lookup(|nome| env::var(nome).ok())
    }

    /// Monta a configuração a partir de uma função de busca de variáveis.
    pub(crate) fn from_lookup(get_env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let server_host = get_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let server_port = get_env("SERVER_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
        let database_url = get_env("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let validade_minutos = get_env("COMPRAS_VALIDADE_MINUTOS")
            .unwrap_or_else(|| "60".to_string())
            .parse::<i64>()
            .map_err(|e| AppError::Config(format!("Invalid COMPRAS_VALIDADE_MINUTOS: {}", e)))?;
        if validade_minutos <= 0 {
            return Err(AppError::Config(
                "COMPRAS_VALIDADE_MINUTOS must be greater than 0".to_string(),
            ));
        }

        let seed_db = get_env("SEED_DB")
            .unwrap_or_else(|| "false".to_string())
            .parse::<bool>()
            .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;

        tracing::info!("Configuração da aplicação carregada.");

        Ok(Self {
            server_host,
            server_port,
            database_url,
            validade_minutos,
            seed_db,
        })
    }

    /// Janela de validade aplicada às compras.
    pub fn validade(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.validade_minutos)
    }
}
