// src/compras/repositorio_postgres.rs

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::compras_repositorio::{
    atribuir_ids_detalhes, compra_nao_encontrada, id_repetido, proximo_id, RepositorioCompras,
    IDS_COMPRA_ESGOTADOS, ID_COMPRA_EM_USO, ID_DETALHE_EM_USO, ID_DETALHE_INVALIDO,
};
use super::compras_structs::{Compra, DetalheCompra};
use crate::shared::erros::{AppError, Result};

/// Linha da tabela `compras`.
#[derive(FromRow)]
struct CompraRow {
    id: i64,
    tipo_produto: String,
    expira_em: DateTime<Utc>,
}

/// Linha da tabela `detalhes_compra`.
#[derive(FromRow)]
struct DetalheRow {
    id: i64,
    compra_id: i64,
    descricao: Option<String>,
    quantidade: Option<i32>,
    valor: Option<f64>,
}

impl From<CompraRow> for Compra {
    fn from(row: CompraRow) -> Self {
        Compra {
            id: Some(row.id),
            product_type: Some(row.tipo_produto),
            expires: Some(row.expira_em),
            purchase_details: Vec::new(),
        }
    }
}

impl From<DetalheRow> for DetalheCompra {
    fn from(row: DetalheRow) -> Self {
        DetalheCompra {
            id: Some(row.id),
            description: row.descricao,
            quantity: row.quantidade,
            value: row.valor,
        }
    }
}

/// Repositório de compras no PostgreSQL.
///
/// Cada `salvar`/`atualizar` roda numa transação que bloqueia as duas tabelas
/// antes de verificar e gerar ids.
pub struct RepositorioPostgres {
    db_pool: PgPool,
}

impl RepositorioPostgres {
    pub fn new(db_pool: PgPool) -> Self {
        RepositorioPostgres { db_pool }
    }

    /// Aplica as migrações de `migrations/`.
    pub async fn migrar(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.db_pool).await?;
        Ok(())
    }

    async fn listar_todas_impl(&self) -> Result<Vec<Compra>> {
        let compras = sqlx::query_as::<_, CompraRow>(
            "SELECT id, tipo_produto, expira_em FROM compras ORDER BY id",
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(compras.into_iter().map(Compra::from).collect())
    }

    async fn buscar_por_ids_impl(&self, ids: Vec<i64>) -> Result<Vec<Compra>> {
        let compras = sqlx::query_as::<_, CompraRow>(
            "SELECT id, tipo_produto, expira_em FROM compras WHERE id = ANY($1) ORDER BY id",
        )
        .bind(&ids[..])
        .fetch_all(&self.db_pool)
        .await?;

        let detalhes = sqlx::query_as::<_, DetalheRow>(
            "SELECT id, compra_id, descricao, quantidade, valor FROM detalhes_compra \
             WHERE compra_id = ANY($1) ORDER BY compra_id, posicao",
        )
        .bind(&ids[..])
        .fetch_all(&self.db_pool)
        .await?;

        // Agrupa os detalhes na compra correspondente
        let mut compras: Vec<Compra> = compras.into_iter().map(Compra::from).collect();
        for detalhe in detalhes {
            if let Some(compra) = compras.iter_mut().find(|c| c.id == Some(detalhe.compra_id)) {
                compra.purchase_details.push(detalhe.into());
            }
        }

        Ok(compras)
    }

    async fn buscar_por_id_impl(&self, id: i64) -> Result<Option<Compra>> {
        Ok(self.buscar_por_ids_impl(vec![id]).await?.pop())
    }

    async fn salvar_impl(&self, mut compra: Compra) -> Result<Compra> {
        let expira_em = expiracao(&compra)?;
        let mut transaction = self.db_pool.begin().await?;
        bloquear_tabelas(&mut transaction).await?;

        if let Some(id) = compra.id {
            let em_uso = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM compras WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *transaction)
                .await?;
            if em_uso {
                return Err(AppError::ViolacaoIntegridade(ID_COMPRA_EM_USO.to_string()));
            }
        }

        let ids_informados: Vec<i64> = compra.ids_detalhes().collect();
        if id_repetido(ids_informados.iter().copied()).is_some()
            || detalhes_existem(&mut transaction, &ids_informados, None).await?
        {
            return Err(AppError::ViolacaoIntegridade(ID_DETALHE_EM_USO.to_string()));
        }

        let id = match compra.id {
            Some(id) => id,
            None => {
                let maior = sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(id), 0) FROM compras")
                    .fetch_one(&mut *transaction)
                    .await?;
                proximo_id(maior, IDS_COMPRA_ESGOTADOS)?
            }
        };
        compra.id = Some(id);
        gerar_ids_detalhes(&mut transaction, &mut compra).await?;

        sqlx::query("INSERT INTO compras (id, tipo_produto, expira_em) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(compra.product_type.as_deref().unwrap_or_default())
            .bind(expira_em)
            .execute(&mut *transaction)
            .await
            .map_err(|e| conflito_ou_erro(e, ID_COMPRA_EM_USO))?;

        inserir_detalhes(&mut transaction, id, &compra.purchase_details)
            .await
            .map_err(|e| conflito_ou_erro(e, ID_DETALHE_EM_USO))?;

        transaction.commit().await?;
        tracing::debug!(compra_id = id, "Compra inserida no PostgreSQL");
        Ok(compra)
    }

    async fn atualizar_impl(&self, mut compra: Compra) -> Result<Compra> {
        let id = compra
            .id
            .ok_or_else(|| AppError::Interno("Compra sem id para atualizar".to_string()))?;
        let expira_em = expiracao(&compra)?;
        let mut transaction = self.db_pool.begin().await?;
        bloquear_tabelas(&mut transaction).await?;

        let atualizadas = sqlx::query("UPDATE compras SET tipo_produto = $1, expira_em = $2 WHERE id = $3")
            .bind(compra.product_type.as_deref().unwrap_or_default())
            .bind(expira_em)
            .bind(id)
            .execute(&mut *transaction)
            .await?
            .rows_affected();
        if atualizadas == 0 {
            return Err(compra_nao_encontrada(id));
        }

        let ids_informados: Vec<i64> = compra.ids_detalhes().collect();
        if id_repetido(ids_informados.iter().copied()).is_some()
            || detalhes_existem(&mut transaction, &ids_informados, Some(id)).await?
        {
            return Err(AppError::ViolacaoIntegridade(ID_DETALHE_INVALIDO.to_string()));
        }

        // Os novos ids são gerados antes da remoção para não reaproveitar ids antigos
        gerar_ids_detalhes(&mut transaction, &mut compra).await?;

        sqlx::query("DELETE FROM detalhes_compra WHERE compra_id = $1")
            .bind(id)
            .execute(&mut *transaction)
            .await?;
        inserir_detalhes(&mut transaction, id, &compra.purchase_details)
            .await
            .map_err(|e| conflito_ou_erro(e, ID_DETALHE_INVALIDO))?;

        transaction.commit().await?;
        tracing::debug!(compra_id = id, "Compra atualizada no PostgreSQL");
        Ok(compra)
    }
}

fn expiracao(compra: &Compra) -> Result<DateTime<Utc>> {
    compra
        .expires
        .ok_or_else(|| AppError::Interno("Compra sem data de expiração".to_string()))
}

async fn bloquear_tabelas(transaction: &mut Transaction<'static, Postgres>) -> Result<()> {
    sqlx::query("LOCK TABLE compras, detalhes_compra IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut **transaction)
        .await?;
    Ok(())
}

/// Verifica se algum dos ids de detalhe já existe, ignorando os da compra `dona`.
async fn detalhes_existem(
    transaction: &mut Transaction<'static, Postgres>,
    ids: &[i64],
    dona: Option<i64>,
) -> Result<bool> {
    if ids.is_empty() {
        return Ok(false);
    }

    let existe = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM detalhes_compra WHERE id = ANY($1) \
         AND ($2::BIGINT IS NULL OR compra_id <> $2))",
    )
    .bind(ids)
    .bind(dona)
    .fetch_one(&mut **transaction)
    .await?;
    Ok(existe)
}

async fn gerar_ids_detalhes(
    transaction: &mut Transaction<'static, Postgres>,
    compra: &mut Compra,
) -> Result<()> {
    let maior_no_banco = sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(id), 0) FROM detalhes_compra")
        .fetch_one(&mut **transaction)
        .await?;
    atribuir_ids_detalhes(compra, maior_no_banco)
}

async fn inserir_detalhes(
    transaction: &mut Transaction<'static, Postgres>,
    compra_id: i64,
    detalhes: &[DetalheCompra],
) -> std::result::Result<(), sqlx::Error> {
    for (posicao, detalhe) in detalhes.iter().enumerate() {
        sqlx::query(
            "INSERT INTO detalhes_compra (id, compra_id, posicao, descricao, quantidade, valor) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(detalhe.id)
        .bind(compra_id)
        .bind(posicao as i32)
        .bind(detalhe.description.as_deref())
        .bind(detalhe.quantity)
        .bind(detalhe.value)
        .execute(&mut **transaction)
        .await?;
    }
    Ok(())
}

/// Violação de chave primária vira conflito; o resto é erro de banco.
fn conflito_ou_erro(erro: sqlx::Error, mensagem: &str) -> AppError {
    match &erro {
        sqlx::Error::Database(db_erro) if db_erro.is_unique_violation() => {
            AppError::ViolacaoIntegridade(mensagem.to_string())
        }
        _ => AppError::Sqlx(erro),
    }
}

impl RepositorioCompras for RepositorioPostgres {
    fn listar_todas(&self) -> BoxFuture<'_, Result<Vec<Compra>>> {
        self.listar_todas_impl().boxed()
    }

    fn buscar_por_ids(&self, ids: Vec<i64>) -> BoxFuture<'_, Result<Vec<Compra>>> {
        self.buscar_por_ids_impl(ids).boxed()
    }

    fn buscar_por_id(&self, id: i64) -> BoxFuture<'_, Result<Option<Compra>>> {
        self.buscar_por_id_impl(id).boxed()
    }

    fn salvar(&self, compra: Compra) -> BoxFuture<'_, Result<Compra>> {
        self.salvar_impl(compra).boxed()
    }

    fn atualizar(&self, compra: Compra) -> BoxFuture<'_, Result<Compra>> {
        self.atualizar_impl(compra).boxed()
    }
}
