//! Request DTOs and their validation into domain inputs.
//!
//! Bodies are deserialized leniently (every field optional, any JSON type) so
//! that shape problems surface as a 400 `Faltan datos` from validation rather
//! than as a framework rejection.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use facturas_core::{DomainError, DomainResult, FacturaId, FacturadorId};
use facturas_invoicing::{CambiosFactura, NuevaFactura, ProductoFactura};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CrearFacturaRequest {
    pub id: Option<JsonValue>,
    pub nombre: Option<JsonValue>,
    pub productos: Option<JsonValue>,
    pub tipo: Option<JsonValue>,
    pub facturador: Option<JsonValue>,
    pub fecha: Option<JsonValue>,
    pub pagado: Option<JsonValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActualizarFacturaRequest {
    pub productos: Option<JsonValue>,
    pub tipo: Option<JsonValue>,
    pub pagado: Option<JsonValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AbonoRequest {
    pub abono: Option<JsonValue>,
}

impl TryFrom<CrearFacturaRequest> for NuevaFactura {
    type Error = DomainError;

    fn try_from(body: CrearFacturaRequest) -> DomainResult<Self> {
        let nombre = required_text(body.nombre, "nombre")?;
        let productos = productos(body.productos)?;
        let tipo = required_text(body.tipo, "tipo")?;
        let id_facturador: FacturadorId = required_text(body.facturador, "facturador")?.parse()?;
        let fecha = body
            .fecha
            .as_ref()
            .and_then(parse_fecha)
            .ok_or_else(|| DomainError::validation("fecha is missing or not a valid date"))?;

        let id = match body.id {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) if s.trim().is_empty() => None,
            Some(JsonValue::String(s)) => Some(s.parse::<FacturaId>()?),
            Some(JsonValue::Number(n)) => Some(n.to_string().parse::<FacturaId>()?),
            Some(_) => return Err(DomainError::invalid_id("id must be a string")),
        };

        Ok(NuevaFactura {
            id,
            nombre,
            fecha,
            productos,
            tipo,
            id_facturador,
            pagado: optional_amount(body.pagado, "pagado")?.unwrap_or(0.0),
        })
    }
}

impl TryFrom<ActualizarFacturaRequest> for CambiosFactura {
    type Error = DomainError;

    fn try_from(body: ActualizarFacturaRequest) -> DomainResult<Self> {
        let productos = productos(body.productos)?;
        let tipo = match body.tipo {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) => Some(s),
            Some(_) => return Err(DomainError::validation("tipo must be a string")),
        };

        Ok(CambiosFactura {
            productos,
            tipo,
            pagado: optional_amount(body.pagado, "pagado")?,
        })
    }
}

impl AbonoRequest {
    /// The payment amount as a number. Numeric strings are accepted.
    pub fn monto(&self) -> DomainResult<f64> {
        self.abono
            .as_ref()
            .and_then(parse_amount)
            .ok_or_else(|| DomainError::validation("abono must be numeric"))
    }
}

// -------------------------
// Field helpers
// -------------------------

/// Non-blank text. Numbers are accepted and kept in their JSON spelling.
fn required_text(value: Option<JsonValue>, field: &str) -> DomainResult<String> {
    match value {
        Some(JsonValue::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(JsonValue::Number(n)) => Ok(n.to_string()),
        _ => Err(DomainError::validation(format!("{field} is required"))),
    }
}

fn productos(value: Option<JsonValue>) -> DomainResult<Vec<ProductoFactura>> {
    match value {
        Some(JsonValue::Array(items)) => Ok(items.into_iter().map(ProductoFactura::new).collect()),
        _ => Err(DomainError::validation("productos must be an array")),
    }
}

fn optional_amount(value: Option<JsonValue>, field: &str) -> DomainResult<Option<f64>> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => parse_amount(&v)
            .map(Some)
            .ok_or_else(|| DomainError::validation(format!("{field} must be numeric"))),
    }
}

fn parse_amount(value: &JsonValue) -> Option<f64> {
    let n = match value {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y/%m/%d %H:%M:%S%.f"];
const NAIVE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Accepts RFC 3339 and RFC 2822 timestamps, naive `YYYY-MM-DDTHH:MM:SS` or
/// `YYYY/MM/DD HH:MM:SS` timestamps (read as UTC), `YYYY-MM-DD` or `YYYY/MM/DD`
/// dates (midnight UTC), and epoch milliseconds. Fractional milliseconds are
/// truncated.
pub fn parse_fecha(value: &JsonValue) -> Option<DateTime<Utc>> {
    match value {
        JsonValue::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Some(dt) = NAIVE_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            {
                return Some(dt.and_utc());
            }
            NAIVE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        }
        JsonValue::Number(n) => {
            let millis = match n.as_i64() {
                Some(ms) => ms,
                None => {
                    let ms = n.as_f64().filter(|ms| ms.is_finite())?.trunc();
                    if ms.abs() > i64::MAX as f64 {
                        return None;
                    }
                    ms as i64
                }
            };
            DateTime::<Utc>::from_timestamp_millis(millis)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn crear(body: JsonValue) -> DomainResult<NuevaFactura> {
        let req: CrearFacturaRequest = serde_json::from_value(body).unwrap();
        NuevaFactura::try_from(req)
    }

    fn valid_body() -> JsonValue {
        json!({
            "nombre": "Distribuidora Sol",
            "productos": [{ "nombre": "Cemento", "precio": 12.5, "cantidad": 4 }],
            "tipo": "credito",
            "facturador": "cli-1",
            "fecha": "2024-02-10",
            "pagado": 0
        })
    }

    #[test]
    fn valid_creation_body() {
        let nueva = crear(valid_body()).unwrap();
        assert_eq!(nueva.id, None);
        assert_eq!(nueva.nombre, "Distribuidora Sol");
        assert_eq!(nueva.id_facturador.as_str(), "cli-1");
        assert_eq!(nueva.fecha.to_rfc3339(), "2024-02-10T00:00:00+00:00");
        assert_eq!(nueva.productos.len(), 1);
        assert_eq!(nueva.pagado, 0.0);
    }

    #[test]
    fn each_required_field_is_enforced() {
        for (field, bad) in [
            ("nombre", json!("")),
            ("nombre", JsonValue::Null),
            ("productos", json!({ "nombre": "Cemento" })),
            ("productos", json!("Cemento")),
            ("tipo", json!(null)),
            ("facturador", json!("   ")),
            ("fecha", json!("no es fecha")),
            ("fecha", json!(true)),
        ] {
            let mut body = valid_body();
            body[field] = bad;
            assert!(
                matches!(crear(body), Err(DomainError::Validation(_))),
                "{field} should be rejected"
            );
        }

        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("fecha");
        assert!(crear(body).is_err());
    }

    #[test]
    fn empty_product_list_is_allowed() {
        let mut body = valid_body();
        body["productos"] = json!([]);
        assert!(crear(body).unwrap().productos.is_empty());
    }

    #[test]
    fn client_supplied_id_is_kept() {
        let mut body = valid_body();
        body["id"] = json!("F-2024-001");
        assert_eq!(crear(body).unwrap().id.unwrap().as_str(), "F-2024-001");

        let mut body = valid_body();
        body["id"] = json!(17);
        assert_eq!(crear(body).unwrap().id.unwrap().as_str(), "17");
    }

    #[test]
    fn numeric_biller_is_accepted_as_text() {
        let mut body = valid_body();
        body["facturador"] = json!(42);
        assert_eq!(crear(body).unwrap().id_facturador.as_str(), "42");

        let mut body = valid_body();
        body["facturador"] = json!(true);
        assert!(crear(body).is_err());
    }

    #[test]
    fn date_formats() {
        let expected: DateTime<Utc> = "2024-02-10T15:30:00Z".parse().unwrap();
        assert_eq!(parse_fecha(&json!("2024-02-10T15:30:00Z")), Some(expected));
        assert_eq!(parse_fecha(&json!("2024-02-10T10:30:00-05:00")), Some(expected));
        assert_eq!(parse_fecha(&json!("2024-02-10T15:30:00")), Some(expected));
        assert_eq!(parse_fecha(&json!(expected.timestamp_millis())), Some(expected));
        assert_eq!(parse_fecha(&json!("Sat, 10 Feb 2024 15:30:00 GMT")), Some(expected));
        assert_eq!(parse_fecha(&json!("2024/02/10 15:30:00")), Some(expected));
        assert_eq!(
            parse_fecha(&json!(expected.timestamp_millis() as f64 + 0.75)),
            Some(expected)
        );
        assert_eq!(
            parse_fecha(&json!("2024/02/10")),
            parse_fecha(&json!("2024-02-10"))
        );
        assert_eq!(parse_fecha(&json!(1e300)), None);
        assert_eq!(parse_fecha(&json!("2024-13-45")), None);
        assert_eq!(parse_fecha(&json!([])), None);
    }

    #[test]
    fn update_requires_product_array_only() {
        let req: ActualizarFacturaRequest =
            serde_json::from_value(json!({ "productos": [] })).unwrap();
        let cambios = CambiosFactura::try_from(req).unwrap();
        assert_eq!(cambios.tipo, None);
        assert_eq!(cambios.pagado, None);

        let req: ActualizarFacturaRequest =
            serde_json::from_value(json!({ "tipo": "contado" })).unwrap();
        assert!(CambiosFactura::try_from(req).is_err());

        let req: ActualizarFacturaRequest =
            serde_json::from_value(json!({ "productos": [], "tipo": "contado", "pagado": "15" }))
                .unwrap();
        let cambios = CambiosFactura::try_from(req).unwrap();
        assert_eq!(cambios.tipo.as_deref(), Some("contado"));
        assert_eq!(cambios.pagado, Some(15.0));
    }

    #[test]
    fn payment_amounts() {
        let monto = |v: JsonValue| AbonoRequest { abono: Some(v) }.monto();
        assert_eq!(monto(json!(25.5)).unwrap(), 25.5);
        assert_eq!(monto(json!(" 40 ")).unwrap(), 40.0);
        assert!(monto(json!("cuarenta")).is_err());
        assert!(monto(json!(null)).is_err());
        assert!(monto(json!({ "valor": 1 })).is_err());
        assert!(AbonoRequest::default().monto().is_err());
    }
}
