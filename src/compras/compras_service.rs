// src/compras/compras_service.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::compras_repositorio::{compra_nao_encontrada, RepositorioCompras};
use super::compras_structs::Compra;
use super::compras_validator::validar_compra;
use crate::shared::erros::Result;

/// Regras de negócio das compras.
///
/// O instante atual é sempre recebido por parâmetro (`agora`), o que permite
/// testar a validade e a expiração sem depender do relógio.
pub struct ServicoCompras {
    repositorio: Arc<dyn RepositorioCompras>,
    // Janela de validade somada a `agora` em cada criação/atualização
    validade: Duration,
}

impl ServicoCompras {
    pub fn new(repositorio: Arc<dyn RepositorioCompras>, validade: Duration) -> Self {
        ServicoCompras { repositorio, validade }
    }

    /// Compras válidas (com `expires >= agora`), com os detalhes.
    pub async fn listar_validas(&self, agora: DateTime<Utc>) -> Result<Vec<Compra>> {
        let ids_validos: Vec<i64> = self
            .repositorio
            .listar_todas()
            .await?
            .into_iter()
            .filter(|compra| compra.valida_em(agora))
            .filter_map(|compra| compra.id)
            .collect();

        if ids_validos.is_empty() {
            return Ok(Vec::new());
        }

        self.repositorio.buscar_por_ids(ids_validos).await
    }

    pub async fn buscar_por_id(&self, id: i64) -> Result<Compra> {
        self.repositorio
            .buscar_por_id(id)
            .await?
            .ok_or_else(|| compra_nao_encontrada(id))
    }

    /// Valida e grava uma nova compra. Qualquer `expires` enviado é substituído.
    pub async fn criar(&self, mut compra: Compra, agora: DateTime<Utc>) -> Result<Compra> {
        validar_compra(&compra)?;

        compra.expires = Some(self.nova_expiracao(agora));
        let salva = self.repositorio.salvar(compra).await?;

        tracing::info!(compra_id = ?salva.id, detalhes = salva.purchase_details.len(), "Compra criada");
        Ok(salva)
    }

    /// Substitui o tipo e os detalhes da compra `id` e renova a expiração.
    ///
    /// A existência é verificada antes da validação dos campos, então um id
    /// inexistente sempre resulta em `NaoEncontrada`.
    pub async fn atualizar(&self, id: i64, dados: Compra, agora: DateTime<Utc>) -> Result<Compra> {
        let mut compra = self.buscar_por_id(id).await?;
        validar_compra(&dados)?;

        compra.product_type = dados.product_type;
        compra.purchase_details = dados.purchase_details;
        compra.expires = Some(self.nova_expiracao(agora));
        let atualizada = self.repositorio.atualizar(compra).await?;

        tracing::info!(compra_id = id, detalhes = atualizada.purchase_details.len(), "Compra atualizada");
        Ok(atualizada)
    }

    fn nova_expiracao(&self, agora: DateTime<Utc>) -> DateTime<Utc> {
        agora + self.validade
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compras::compras_structs::DetalheCompra;
    use crate::compras::repositorio_memoria::RepositorioMemoria;
    use crate::shared::erros::AppError;

    fn servico(repositorio: RepositorioMemoria) -> ServicoCompras {
        ServicoCompras::new(Arc::new(repositorio), Duration::hours(1))
    }

    fn bolo(quantidade: Option<i32>) -> Compra {
        Compra {
            product_type: Some("Cake".to_string()),
            purchase_details: vec![DetalheCompra {
                description: Some("XXL wedding cake".to_string()),
                quantity: quantidade,
                value: Some(500.0),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn lista_apenas_compras_nao_expiradas() {
        let agora = Utc::now();
        let servico = servico(RepositorioMemoria::com_dados_demo(agora));

        let validas = servico.listar_validas(agora).await.unwrap();

        assert_eq!(validas.iter().filter_map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(validas.iter().all(|c| c.purchase_details.len() == 1));
    }

    #[actix_web::test]
    async fn lista_vazia_sem_compras_validas() {
        let agora = Utc::now();
        let servico = servico(RepositorioMemoria::com_dados_demo(agora));

        let validas = servico.listar_validas(agora + Duration::days(30)).await.unwrap();

        assert!(validas.is_empty());
    }

    #[actix_web::test]
    async fn criar_define_expiracao_e_ignora_a_enviada() {
        let agora = Utc::now();
        let servico = servico(RepositorioMemoria::new());
        let mut compra = bolo(Some(1));
        compra.expires = Some(agora - Duration::days(365));

        let criada = servico.criar(compra, agora).await.unwrap();

        assert_eq!(criada.id, Some(1));
        assert_eq!(criada.expires, Some(agora + Duration::hours(1)));
        assert_eq!(servico.buscar_por_id(1).await.unwrap(), criada);
    }

    #[actix_web::test]
    async fn criar_invalida_nao_grava_nada() {
        let servico = servico(RepositorioMemoria::new());

        let resultado = servico.criar(bolo(Some(0)), Utc::now()).await;

        assert!(matches!(resultado, Err(AppError::CompraInvalida(_))));
        assert!(matches!(servico.buscar_por_id(1).await, Err(AppError::NaoEncontrada(_))));
    }

    #[actix_web::test]
    async fn atualizar_renova_expiracao_e_mantem_o_id() {
        let agora = Utc::now();
        let servico = servico(RepositorioMemoria::new());
        servico.criar(bolo(Some(1)), agora).await.unwrap();

        let depois = agora + Duration::minutes(30);
        let mut dados = bolo(Some(2));
        dados.id = Some(77);
        dados.product_type = Some("Bakery".to_string());
        let atualizada = servico.atualizar(1, dados, depois).await.unwrap();

        assert_eq!(atualizada.id, Some(1));
        assert_eq!(atualizada.product_type.as_deref(), Some("Bakery"));
        assert_eq!(atualizada.purchase_details[0].quantity, Some(2));
        assert_eq!(atualizada.expires, Some(depois + Duration::hours(1)));
    }

    #[actix_web::test]
    async fn atualizar_inexistente_tem_prioridade_sobre_validacao() {
        let servico = servico(RepositorioMemoria::new());

        let resultado = servico.atualizar(999, bolo(Some(0)), Utc::now()).await;

        assert!(matches!(resultado, Err(AppError::NaoEncontrada(m)) if m == "Purchase 999 not found"));
    }
}
