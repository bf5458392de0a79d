//! Schema revisions and the projection each one reads CRT rows with.
//!
//! Every adapter selects the same canonical column aliases (`numero_crt`,
//! `remitente_nombre`, ...) so a single decoder fills `RawCrtRow` for all of
//! them. Columns a revision does not have are simply not selected and
//! resolve to empty strings later.

use std::fmt;
use std::str::FromStr;

use sqlx::postgres::PgRow;
use sqlx::{Column, Row};

use cartaporte_documents::{ChargeLine, RawCrtRow};

use super::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaRevision {
    /// Parties carry only a name; no address, document or location data.
    Legacy,
    /// Full party detail with city → country relations and charge lines.
    Normalized,
    /// Decide by probing the live catalog.
    Auto,
}

impl SchemaRevision {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaRevision::Legacy => "legacy",
            SchemaRevision::Normalized => "normalized",
            SchemaRevision::Auto => "auto",
        }
    }
}

impl fmt::Display for SchemaRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaRevision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(SchemaRevision::Legacy),
            "normalized" => Ok(SchemaRevision::Normalized),
            "auto" => Ok(SchemaRevision::Auto),
            other => Err(format!(
                "unknown schema revision '{other}' (expected legacy, normalized or auto)"
            )),
        }
    }
}

/// Capability probe: the normalized schema has `remitentes.direccion`.
pub(crate) const PROBE_SQL: &str = r#"
    SELECT EXISTS (
        SELECT 1 FROM information_schema.columns
        WHERE table_name = 'remitentes' AND column_name = 'direccion'
    )
"#;

/// How one schema revision projects CRT rows.
pub trait SchemaAdapter: Send + Sync + fmt::Debug {
    fn revision(&self) -> SchemaRevision;

    /// `SELECT ... FROM crts c <joins>` without a filter; the crt table is
    /// aliased `c` and the id column is selected as a `bigint` named `id`.
    fn projection_sql(&self) -> &'static str;

    fn decode(&self, row: &PgRow) -> Result<RawCrtRow, StoreError> {
        decode_columns(row)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyAdapter;

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedAdapter;

impl SchemaAdapter for LegacyAdapter {
    fn revision(&self) -> SchemaRevision {
        SchemaRevision::Legacy
    }

    fn projection_sql(&self) -> &'static str {
        LEGACY_PROJECTION
    }
}

impl SchemaAdapter for NormalizedAdapter {
    fn revision(&self) -> SchemaRevision {
        SchemaRevision::Normalized
    }

    fn projection_sql(&self) -> &'static str {
        NORMALIZED_PROJECTION
    }
}

/// Adapter for a concrete revision; `Auto` must be resolved first.
pub fn adapter_for(revision: SchemaRevision) -> Option<Box<dyn SchemaAdapter>> {
    match revision {
        SchemaRevision::Legacy => Some(Box::new(LegacyAdapter)),
        SchemaRevision::Normalized => Some(Box::new(NormalizedAdapter)),
        SchemaRevision::Auto => None,
    }
}

fn decode_columns(row: &PgRow) -> Result<RawCrtRow, StoreError> {
    let id: i64 = row.try_get("id").map_err(decode_error)?;
    let mut raw = RawCrtRow::new(id);
    for column in row.columns() {
        match column.name() {
            "id" => {}
            "gastos" => {
                let value: Option<serde_json::Value> =
                    row.try_get(column.ordinal()).map_err(decode_error)?;
                if let Some(value) = value {
                    raw.charges = serde_json::from_value::<Vec<ChargeLine>>(value).map_err(|e| {
                        StoreError::Storage(format!("failed to decode charge lines of crt {id}: {e}"))
                    })?;
                }
            }
            name => {
                let value: Option<String> = row.try_get(column.ordinal()).map_err(decode_error)?;
                raw.set(name, value);
            }
        }
    }
    Ok(raw)
}

fn decode_error(e: sqlx::Error) -> StoreError {
    StoreError::Storage(format!("failed to decode crt row: {e}"))
}

const LEGACY_PROJECTION: &str = r#"
    SELECT
        c.id::bigint AS id,
        c.numero_crt,
        c.estado,
        to_char(c.fecha_emision, 'YYYY-MM-DD') AS fecha_emision,
        c.lugar_entrega,
        c.transporte_sucesivos,
        c.detalles_mercaderia,
        c.peso_bruto::text AS peso_bruto,
        c.peso_neto::text AS peso_neto,
        c.volumen::text AS volumen,
        c.valor_incoterm::text AS valor,
        m.codigo AS moneda,
        m.nombre AS moneda_nombre,
        c.incoterm,
        c.valor_mercaderia::text AS valor_mercaderia,
        c.declaracion_mercaderia AS declaracion_valor_mercaderia,
        c.factura_exportacion,
        c.nro_despacho,
        c.valor_flete_externo::text AS valor_flete_externo,
        c.valor_reembolso::text AS valor_reembolso,
        c.observaciones,
        t.nombre AS transportadora,
        rm.nombre AS remitente,
        d.nombre AS destinatario,
        cons.nombre AS consignatario
    FROM crts c
    LEFT JOIN transportadoras t ON t.id = c.transportadora_id
    LEFT JOIN remitentes rm ON rm.id = c.remitente_id
    LEFT JOIN remitentes d ON d.id = c.destinatario_id
    LEFT JOIN remitentes cons ON cons.id = c.consignatario_id
    LEFT JOIN monedas m ON m.id = c.moneda_id
"#;

const NORMALIZED_PROJECTION: &str = r#"
    SELECT
        c.id::bigint AS id,
        c.numero_crt,
        c.estado,
        to_char(c.fecha_emision, 'YYYY-MM-DD') AS fecha_emision,
        NULLIF(concat_ws(' - ', ce.nombre, pe.nombre), '') AS lugar_emision,
        NULLIF(concat_ws(' - ', ce.nombre, pe.nombre, to_char(c.fecha_emision, 'DD-MM-YYYY')), '')
            AS lugar_pais_fecha_transportador,
        NULLIF(concat_ws(' - ', c.lugar_entrega, to_char(c.fecha_entrega, 'DD-MM-YYYY')), '')
            AS lugar_pais_plazo_entrega,
        c.lugar_entrega,
        c.transporte_sucesivos,
        c.detalles_mercaderia,
        c.peso_bruto::text AS peso_bruto,
        c.peso_neto::text AS peso_neto,
        c.volumen::text AS volumen,
        c.valor_incoterm::text AS valor,
        m.codigo AS moneda,
        m.nombre AS moneda_nombre,
        c.incoterm,
        c.valor_mercaderia::text AS valor_mercaderia,
        c.declaracion_mercaderia AS declaracion_valor_mercaderia,
        c.factura_exportacion,
        c.nro_despacho,
        c.formalidades_aduana AS instrucciones_aduana,
        c.valor_flete_externo::text AS valor_flete_externo,
        c.valor_reembolso::text AS valor_reembolso,
        c.observaciones,
        rm.nombre AS firma_remitente,
        to_char(c.fecha_firma, 'YYYY-MM-DD') AS fecha_firma_remitente,
        t.nombre AS firma_transportador,
        to_char(c.fecha_firma, 'YYYY-MM-DD') AS fecha_firma_transportador,
        d.nombre AS firma_destinatario,
        to_char(c.fecha_firma, 'YYYY-MM-DD') AS fecha_firma_destinatario,

        t.nombre AS transportadora_nombre,
        t.direccion AS transportadora_direccion,
        t.numero_documento AS transportadora_documento,
        t.tipo_documento AS transportadora_tipo_documento,
        t.telefono AS transportadora_telefono,
        tc.nombre AS transportadora_ciudad,
        tp.nombre AS transportadora_pais,

        rm.nombre AS remitente_nombre,
        rm.direccion AS remitente_direccion,
        rm.numero_documento AS remitente_documento,
        rm.tipo_documento AS remitente_tipo_documento,
        rmc.nombre AS remitente_ciudad,
        rmp.nombre AS remitente_pais,

        d.nombre AS destinatario_nombre,
        d.direccion AS destinatario_direccion,
        d.numero_documento AS destinatario_documento,
        d.tipo_documento AS destinatario_tipo_documento,
        dc.nombre AS destinatario_ciudad,
        dp.nombre AS destinatario_pais,

        cons.nombre AS consignatario_nombre,
        cons.direccion AS consignatario_direccion,
        cons.numero_documento AS consignatario_documento,
        cons.tipo_documento AS consignatario_tipo_documento,
        consc.nombre AS consignatario_ciudad,
        consp.nombre AS consignatario_pais,

        n.nombre AS notificar_a_nombre,
        n.direccion AS notificar_a_direccion,
        n.numero_documento AS notificar_a_documento,
        n.tipo_documento AS notificar_a_tipo_documento,
        nc.nombre AS notificar_a_ciudad,
        np.nombre AS notificar_a_pais,

        (
            SELECT json_agg(json_build_object(
                'tramo', COALESCE(g.tramo, ''),
                'valor_remitente', COALESCE(g.valor_remitente::text, ''),
                'moneda_remitente', COALESCE(mr.codigo, ''),
                'valor_destinatario', COALESCE(g.valor_destinatario::text, ''),
                'moneda_destinatario', COALESCE(md.codigo, '')
            ) ORDER BY g.id)
            FROM crt_gastos g
            LEFT JOIN monedas mr ON mr.id = g.moneda_remitente_id
            LEFT JOIN monedas md ON md.id = g.moneda_destinatario_id
            WHERE g.crt_id = c.id
        ) AS gastos
    FROM crts c
    LEFT JOIN ciudades ce ON ce.id = c.ciudad_emision_id
    LEFT JOIN paises pe ON pe.id = c.pais_emision_id

    LEFT JOIN transportadoras t ON t.id = c.transportadora_id
    LEFT JOIN ciudades tc ON tc.id = t.ciudad_id
    LEFT JOIN paises tp ON tp.id = tc.pais_id

    LEFT JOIN remitentes rm ON rm.id = c.remitente_id
    LEFT JOIN ciudades rmc ON rmc.id = rm.ciudad_id
    LEFT JOIN paises rmp ON rmp.id = rmc.pais_id

    LEFT JOIN remitentes d ON d.id = c.destinatario_id
    LEFT JOIN ciudades dc ON dc.id = d.ciudad_id
    LEFT JOIN paises dp ON dp.id = dc.pais_id

    LEFT JOIN remitentes cons ON cons.id = c.consignatario_id
    LEFT JOIN ciudades consc ON consc.id = cons.ciudad_id
    LEFT JOIN paises consp ON consp.id = consc.pais_id

    LEFT JOIN remitentes n ON n.id = c.notificar_a_id
    LEFT JOIN ciudades nc ON nc.id = n.ciudad_id
    LEFT JOIN paises np ON np.id = nc.pais_id

    LEFT JOIN monedas m ON m.id = c.moneda_id
"#;
