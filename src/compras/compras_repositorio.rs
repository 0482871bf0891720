// src/compras/compras_repositorio.rs

use futures::future::BoxFuture;

use super::compras_structs::Compra;
use crate::shared::erros::{AppError, Result};

// Mensagens devolvidas nos conflitos de identificador
pub const ID_COMPRA_EM_USO: &str = "Purchase id already in use";
pub const ID_DETALHE_EM_USO: &str = "Purchase detail id already in use";
pub const ID_DETALHE_INVALIDO: &str = "Invalid purchase detail id";
pub const IDS_COMPRA_ESGOTADOS: &str = "No purchase id left to assign";
pub const IDS_DETALHE_ESGOTADOS: &str = "No purchase detail id left to assign";

/// Mensagem de compra inexistente.
pub fn compra_nao_encontrada(id: impl std::fmt::Display) -> AppError {
    AppError::NaoEncontrada(format!("Purchase {} not found", id))
}

/// Armazenamento das compras.
///
/// As implementações garantem que `salvar` e `atualizar` sejam atômicos:
/// a verificação de ids e a escrita acontecem sob o mesmo lock/transação.
pub trait RepositorioCompras: Send + Sync {
    /// Todas as compras, ordenadas por id, sem os detalhes.
    fn listar_todas(&self) -> BoxFuture<'_, Result<Vec<Compra>>>;

    /// Compras completas (com detalhes) para os ids informados, ordenadas por id.
    /// Ids inexistentes são ignorados.
    fn buscar_por_ids(&self, ids: Vec<i64>) -> BoxFuture<'_, Result<Vec<Compra>>>;

    fn buscar_por_id(&self, id: i64) -> BoxFuture<'_, Result<Option<Compra>>>;

    /// Insere uma nova compra, gerando os ids que faltarem.
    ///
    /// Falha com `ViolacaoIntegridade` se o id da compra ou de algum detalhe
    /// já existir (ou se repetir dentro da própria compra).
    fn salvar(&self, compra: Compra) -> BoxFuture<'_, Result<Compra>>;

    /// Substitui o tipo, a expiração e os detalhes de uma compra existente.
    ///
    /// Detalhes que não vierem na compra são removidos. Falha com
    /// `NaoEncontrada` se a compra não existir e com `ViolacaoIntegridade` se um
    /// id de detalhe pertencer a outra compra.
    fn atualizar(&self, compra: Compra) -> BoxFuture<'_, Result<Compra>>;
}

/// Devolve o primeiro id repetido na lista, se houver.
pub(crate) fn id_repetido(ids: impl IntoIterator<Item = i64>) -> Option<i64> {
    let mut vistos = std::collections::HashSet::new();
    ids.into_iter().find(|id| !vistos.insert(*id))
}

/// Próximo id depois do maior já usado.
pub(crate) fn proximo_id(maior: i64, esgotado: &str) -> Result<i64> {
    maior
        .checked_add(1)
        .ok_or_else(|| AppError::ViolacaoIntegridade(esgotado.to_string()))
}

/// Gera ids sequenciais para os detalhes sem id, a partir do maior id já usado
/// (no armazenamento ou no próprio payload).
pub(crate) fn atribuir_ids_detalhes(compra: &mut Compra, maior_usado: i64) -> Result<()> {
    let mut maior = compra.ids_detalhes().fold(maior_usado, i64::max);
    for detalhe in compra.purchase_details.iter_mut().filter(|d| d.id.is_none()) {
        maior = proximo_id(maior, IDS_DETALHE_ESGOTADOS)?;
        detalhe.id = Some(maior);
    }
    Ok(())
}
