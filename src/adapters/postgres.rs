use crate::domain::model::{Attendance, IncomeBreakdown, NewAttendance, PaymentMethod};
use crate::domain::ports::LedgerStore;
use crate::utils::error::{LedgerError, Result};
use crate::utils::validation::redact_url;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

const LEDGER_SCHEMA: &str = include_str!("../../resources/schema.sql");

// Amount columns are cast so rows written as NUMERIC by other tools still load.
const SELECT_ALL: &str = r#"
    SELECT id,
           fecha,
           lugar,
           item,
           paciente,
           metodo_pago,
           COALESCE(valor_bruto::float8, 0)     AS valor_bruto,
           COALESCE(desc_fijo_lugar::float8, 0) AS desc_fijo_lugar,
           COALESCE(desc_tarjeta::float8, 0)    AS desc_tarjeta,
           COALESCE(desc_adicional::float8, 0)  AS desc_adicional,
           COALESCE(total_recibido::float8, 0)  AS total_recibido
    FROM public.atenciones
    ORDER BY fecha DESC, id DESC
"#;

const INSERT: &str = r#"
    INSERT INTO public.atenciones
        (fecha, lugar, item, paciente, metodo_pago,
         valor_bruto, desc_fijo_lugar, desc_tarjeta, desc_adicional, total_recibido)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    RETURNING id
"#;

#[derive(sqlx::FromRow)]
struct AttendanceEntity {
    id: i64,
    fecha: NaiveDate,
    lugar: String,
    item: String,
    paciente: String,
    metodo_pago: String,
    valor_bruto: f64,
    desc_fijo_lugar: f64,
    desc_tarjeta: f64,
    desc_adicional: f64,
    total_recibido: f64,
}

impl TryFrom<AttendanceEntity> for Attendance {
    type Error = LedgerError;

    fn try_from(entity: AttendanceEntity) -> Result<Self> {
        Ok(Self {
            id: entity.id,
            date: entity.fecha,
            location: entity.lugar,
            item: entity.item,
            patient: entity.paciente,
            payment_method: entity.metodo_pago.parse::<PaymentMethod>()?,
            breakdown: IncomeBreakdown {
                gross: entity.valor_bruto,
                location_discount: entity.desc_fijo_lugar,
                card_fee: entity.desc_tarjeta,
                extra_discount: entity.desc_adicional,
                net: entity.total_recibido,
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Opens a pool and probes it with `SELECT 1` before handing it out.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to PostgreSQL at {}: {}", redact_url(url), e);
                LedgerError::DatabaseError(e)
            })?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        tracing::info!(
            "Connected to PostgreSQL at {} (max {} connections)",
            redact_url(url),
            max_connections
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn schema_statements(schema: &str) -> impl Iterator<Item = &str> {
    schema
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn init(&self) -> Result<()> {
        for stmt in schema_statements(LEDGER_SCHEMA) {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        tracing::info!("Ledger schema is in place");
        Ok(())
    }

    async fn insert(&self, attendance: &NewAttendance) -> Result<Attendance> {
        let b = &attendance.breakdown;
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(INSERT)
            .bind(attendance.date)
            .bind(&attendance.location)
            .bind(&attendance.item)
            .bind(&attendance.patient)
            .bind(attendance.payment_method.as_str())
            .bind(b.gross)
            .bind(b.location_discount)
            .bind(b.card_fee)
            .bind(b.extra_discount)
            .bind(b.net)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Attendance::from_new(id, attendance.clone()))
    }

    async fn load_all(&self) -> Result<Vec<Attendance>> {
        let entities = sqlx::query_as::<_, AttendanceEntity>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await?;

        entities.into_iter().map(Attendance::try_from).collect()
    }
}
