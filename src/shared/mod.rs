// src/shared/mod.rs

// Estruturas de resposta compartilhadas entre os módulos
pub mod shared_structs;
// Erro da aplicação e o mapeamento para respostas HTTP
pub mod erros;
