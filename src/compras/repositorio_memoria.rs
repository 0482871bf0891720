// src/compras/repositorio_memoria.rs

use std::collections::{BTreeMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use futures::future::{ready, BoxFuture, FutureExt};

use super::compras_repositorio::{
    atribuir_ids_detalhes, compra_nao_encontrada, id_repetido, proximo_id, RepositorioCompras,
    IDS_COMPRA_ESGOTADOS, ID_COMPRA_EM_USO, ID_DETALHE_EM_USO, ID_DETALHE_INVALIDO,
};
use super::compras_structs::{Compra, DetalheCompra};
use crate::shared::erros::{AppError, Result};

/// Repositório de compras em memória.
///
/// Um único `RwLock` protege todas as compras: cada escrita verifica e grava
/// sob o mesmo lock de escrita, o que torna `salvar`/`atualizar` atômicos.
#[derive(Default)]
pub struct RepositorioMemoria {
    compras: RwLock<BTreeMap<i64, Compra>>,
}

impl RepositorioMemoria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repositório com quatro compras de demonstração: duas válidas e duas
    /// expiradas em relação a `agora`.
    pub fn com_dados_demo(agora: DateTime<Utc>) -> Self {
        let valida = agora + Duration::days(10);
        let expirada = agora - Duration::days(10);

        let demo = [
            (1, "Bakery", valida, "XXL wedding cake", 1, 500.0),
            (2, "Gadget", valida, "One plus 3", 2, 798.0),
            (3, "Bakery", expirada, "Mickey mouse cake", 1, 70.0),
            (4, "Gadget", expirada, "IPhone 7 64Gb", 1, 700.0),
        ];

        let compras = demo
            .into_iter()
            .map(|(id, tipo, expires, descricao, quantidade, valor)| {
                let compra = Compra {
                    id: Some(id),
                    product_type: Some(tipo.to_string()),
                    expires: Some(expires),
                    purchase_details: vec![DetalheCompra {
                        id: Some(id),
                        description: Some(descricao.to_string()),
                        quantity: Some(quantidade),
                        value: Some(valor),
                    }],
                };
                (id, compra)
            })
            .collect();

        RepositorioMemoria {
            compras: RwLock::new(compras),
        }
    }

    fn leitura(&self) -> Result<RwLockReadGuard<'_, BTreeMap<i64, Compra>>> {
        self.compras
            .read()
            .map_err(|_| AppError::Interno("Lock do repositório de compras envenenado".to_string()))
    }

    fn escrita(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<i64, Compra>>> {
        self.compras
            .write()
            .map_err(|_| AppError::Interno("Lock do repositório de compras envenenado".to_string()))
    }

    fn listar_todas_sync(&self) -> Result<Vec<Compra>> {
        let compras = self.leitura()?;
        Ok(compras
            .values()
            .map(|compra| Compra {
                purchase_details: Vec::new(),
                ..compra.clone()
            })
            .collect())
    }

    fn buscar_por_ids_sync(&self, ids: Vec<i64>) -> Result<Vec<Compra>> {
        let compras = self.leitura()?;
        let ids: HashSet<i64> = ids.into_iter().collect();
        Ok(compras
            .iter()
            .filter(|(id, _)| ids.contains(id))
            .map(|(_, compra)| compra.clone())
            .collect())
    }

    fn buscar_por_id_sync(&self, id: i64) -> Result<Option<Compra>> {
        Ok(self.leitura()?.get(&id).cloned())
    }

    fn salvar_sync(&self, mut compra: Compra) -> Result<Compra> {
        let mut compras = self.escrita()?;

        if let Some(id) = compra.id {
            if compras.contains_key(&id) {
                return Err(AppError::ViolacaoIntegridade(ID_COMPRA_EM_USO.to_string()));
            }
        }

        let existentes = ids_detalhes(compras.values());
        if id_repetido(compra.ids_detalhes()).is_some()
            || compra.ids_detalhes().any(|id| existentes.contains(&id))
        {
            return Err(AppError::ViolacaoIntegridade(ID_DETALHE_EM_USO.to_string()));
        }

        let id = match compra.id {
            Some(id) => id,
            None => {
                let maior = compras.keys().next_back().copied().unwrap_or(0);
                proximo_id(maior, IDS_COMPRA_ESGOTADOS)?
            }
        };
        compra.id = Some(id);
        atribuir_ids_detalhes(&mut compra, existentes.into_iter().max().unwrap_or(0))?;

        compras.insert(id, compra.clone());
        Ok(compra)
    }

    fn atualizar_sync(&self, mut compra: Compra) -> Result<Compra> {
        let id = compra
            .id
            .ok_or_else(|| AppError::Interno("Compra sem id para atualizar".to_string()))?;
        let mut compras = self.escrita()?;

        if !compras.contains_key(&id) {
            return Err(compra_nao_encontrada(id));
        }

        // Ids da própria compra podem ser mantidos; os das outras não
        let de_outras = ids_detalhes(compras.values().filter(|outra| outra.id != Some(id)));
        if id_repetido(compra.ids_detalhes()).is_some()
            || compra.ids_detalhes().any(|id_detalhe| de_outras.contains(&id_detalhe))
        {
            return Err(AppError::ViolacaoIntegridade(ID_DETALHE_INVALIDO.to_string()));
        }

        let maior = ids_detalhes(compras.values()).into_iter().max().unwrap_or(0);
        atribuir_ids_detalhes(&mut compra, maior)?;

        compras.insert(id, compra.clone());
        Ok(compra)
    }
}

fn ids_detalhes<'a>(compras: impl Iterator<Item = &'a Compra>) -> HashSet<i64> {
    compras.flat_map(|compra| compra.ids_detalhes()).collect()
}

impl RepositorioCompras for RepositorioMemoria {
    fn listar_todas(&self) -> BoxFuture<'_, Result<Vec<Compra>>> {
        ready(self.listar_todas_sync()).boxed()
    }

    fn buscar_por_ids(&self, ids: Vec<i64>) -> BoxFuture<'_, Result<Vec<Compra>>> {
        ready(self.buscar_por_ids_sync(ids)).boxed()
    }

    fn buscar_por_id(&self, id: i64) -> BoxFuture<'_, Result<Option<Compra>>> {
        ready(self.buscar_por_id_sync(id)).boxed()
    }

    fn salvar(&self, compra: Compra) -> BoxFuture<'_, Result<Compra>> {
        ready(self.salvar_sync(compra)).boxed()
    }

    fn atualizar(&self, compra: Compra) -> BoxFuture<'_, Result<Compra>> {
        ready(self.atualizar_sync(compra)).boxed()
    }
}
