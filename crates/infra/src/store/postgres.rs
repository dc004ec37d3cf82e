//! Postgres-backed invoice store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) on insert | `23505` | `CreacionFallida` |
//! | Database (foreign key violation) on insert | `23503` | `ClienteNoEncontrado` |
//! | Database (numeric out of range) on payment | `22003` | `AbonoFallido` |
//! | Anything else | any | `Backend` |
//!
//! Updates and payments that touch zero rows report `FacturaNoEncontrada`;
//! deletes that touch zero rows report `EliminacionFallida`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use facturas_core::{FacturaId, FacturadorId};
use facturas_invoicing::{
    CambiosFactura, Factura, FacturaStore, NuevaFactura, ProductoFactura, StoreError,
    calcular_total, validar_abono,
};

const SCHEMA: &str = include_str!("../../migrations/0001_facturas.sql");

/// Postgres-backed `FacturaStore`.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; every operation is a
/// single statement, so each one is atomic on its own.
#[derive(Debug, Clone)]
pub struct PostgresFacturaStore {
    pool: Arc<PgPool>,
}

impl PostgresFacturaStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    pub async fn register_facturador(&self, id: &FacturadorId) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO facturadores (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(id.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("register_facturador", e))?;
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    StoreError::backend(anyhow::Error::new(err).context(format!("postgres {operation}")))
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => return StoreError::CreacionFallida,
            Some("23503") => return StoreError::ClienteNoEncontrado,
            _ => {}
        }
    }
    map_sqlx_error("create", err)
}

fn map_abono_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("22003") {
            return StoreError::AbonoFallido;
        }
    }
    map_sqlx_error("abonar", err)
}

fn row_to_factura(row: &PgRow) -> Result<Factura, sqlx::Error> {
    let id: String = row.try_get("id")?;
    let id_facturador: String = row.try_get("id_facturador")?;
    let productos: Json<Vec<ProductoFactura>> = row.try_get("productos")?;
    let fecha: DateTime<Utc> = row.try_get("fecha")?;

    let id = id
        .parse::<FacturaId>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let id_facturador = id_facturador
        .parse::<FacturadorId>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Factura {
        id,
        nombre: row.try_get("nombre")?,
        fecha,
        productos: productos.0,
        tipo: row.try_get("tipo")?,
        total: row.try_get("total")?,
        id_facturador,
        pagado: row.try_get("pagado")?,
    })
}

const SELECT_FACTURA: &str =
    "SELECT id, nombre, fecha, productos, tipo, total, id_facturador, pagado FROM facturas";

#[async_trait::async_trait]
impl FacturaStore for PostgresFacturaStore {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Factura>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_FACTURA} ORDER BY fecha, id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter()
            .map(row_to_factura)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("list", e))
    }

    #[instrument(skip(self), fields(factura_id = %id))]
    async fn get(&self, id: &FacturaId) -> Result<Option<Factura>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_FACTURA} WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref()
            .map(row_to_factura)
            .transpose()
            .map_err(|e| map_sqlx_error("get", e))
    }

    #[instrument(skip(self, nueva), fields(facturador = %nueva.id_facturador))]
    async fn create(&self, nueva: NuevaFactura) -> Result<FacturaId, StoreError> {
        let id = nueva.id.clone().unwrap_or_else(FacturaId::generate);
        let factura = nueva.into_factura(id.clone())?;

        sqlx::query(
            r#"
            INSERT INTO facturas (id, nombre, fecha, productos, tipo, total, id_facturador, pagado)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(factura.id.as_str())
        .bind(&factura.nombre)
        .bind(factura.fecha)
        .bind(Json(&factura.productos))
        .bind(&factura.tipo)
        .bind(factura.total)
        .bind(factura.id_facturador.as_str())
        .bind(factura.pagado)
        .execute(&*self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(id)
    }

    #[instrument(skip(self, cambios), fields(factura_id = %id))]
    async fn update(&self, id: &FacturaId, cambios: CambiosFactura) -> Result<(), StoreError> {
        let total = calcular_total(&cambios.productos);
        if !total.is_finite() || !cambios.pagado.is_none_or(f64::is_finite) {
            return Err(StoreError::ActualizacionFallida);
        }

        let result = sqlx::query(
            r#"
            UPDATE facturas
            SET productos = $2,
                total = $3,
                tipo = COALESCE($4, tipo),
                pagado = COALESCE($5, pagado)
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(Json(&cambios.productos))
        .bind(total)
        .bind(cambios.tipo.as_deref())
        .bind(cambios.pagado)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::FacturaNoEncontrada);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(factura_id = %id))]
    async fn delete(&self, id: &FacturaId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM facturas WHERE id = $1")
            .bind(id.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::EliminacionFallida);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(factura_id = %id))]
    async fn abonar(&self, id: &FacturaId, abono: f64) -> Result<(), StoreError> {
        validar_abono(abono)?;

        let result = sqlx::query("UPDATE facturas SET pagado = pagado + $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(abono)
            .execute(&*self.pool)
            .await
            .map_err(map_abono_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::FacturaNoEncontrada);
        }
        Ok(())
    }
}
