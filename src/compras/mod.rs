// src/compras/mod.rs

// Estruturas de compra e detalhe de compra
pub mod compras_structs;
// Regras de validação dos campos
pub mod compras_validator;
// Trait do repositório e as mensagens de conflito
pub mod compras_repositorio;
pub mod repositorio_memoria;
pub mod repositorio_postgres;
// Regras de negócio (validade e expiração)
pub mod compras_service;
// Rotas HTTP
pub mod compras_router;
