use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use facturas_core::{FacturaId, FacturadorId};

use crate::error::StoreError;

/// Invoice line item.
///
/// The service treats products as opaque JSON. The only fields it ever reads
/// are `precio` and `cantidad`, and only to compute the invoice total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductoFactura(pub JsonValue);

impl ProductoFactura {
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    /// `precio * cantidad`, or 0 when either is missing or not a number.
    pub fn importe(&self) -> f64 {
        let precio = self.0.get("precio").and_then(JsonValue::as_f64);
        let cantidad = self.0.get("cantidad").and_then(JsonValue::as_f64);
        match (precio, cantidad) {
            (Some(p), Some(c)) if (p * c).is_finite() => p * c,
            _ => 0.0,
        }
    }
}

/// Sum of line item amounts. Can overflow to infinity for huge amounts.
pub fn calcular_total(productos: &[ProductoFactura]) -> f64 {
    productos.iter().map(ProductoFactura::importe).sum()
}

/// Payments must be finite and strictly positive.
pub fn validar_abono(abono: f64) -> Result<(), StoreError> {
    if !abono.is_finite() || abono <= 0.0 {
        return Err(StoreError::AbonoFallido);
    }
    Ok(())
}

/// Stored invoice as returned to API clients.
///
/// `total` and `pagado` are always finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factura {
    pub id: FacturaId,
    pub nombre: String,
    pub fecha: DateTime<Utc>,
    pub productos: Vec<ProductoFactura>,
    pub tipo: String,
    pub total: f64,
    #[serde(rename = "id-facturador")]
    pub id_facturador: FacturadorId,
    pub pagado: f64,
}

impl Factura {
    /// Apply an update: products are replaced and the total recomputed;
    /// `tipo` and `pagado` only change when provided.
    ///
    /// Nothing changes when the new total or amount paid is not finite.
    pub fn aplicar_cambios(&mut self, cambios: CambiosFactura) -> Result<(), StoreError> {
        let total = calcular_total(&cambios.productos);
        let pagado_finito = cambios.pagado.is_none_or(f64::is_finite);
        if !total.is_finite() || !pagado_finito {
            return Err(StoreError::ActualizacionFallida);
        }

        self.total = total;
        self.productos = cambios.productos;
        if let Some(tipo) = cambios.tipo {
            self.tipo = tipo;
        }
        if let Some(pagado) = cambios.pagado {
            self.pagado = pagado;
        }
        Ok(())
    }

    /// Add a partial payment to the amount paid.
    pub fn registrar_abono(&mut self, abono: f64) -> Result<(), StoreError> {
        validar_abono(abono)?;
        let pagado = self.pagado + abono;
        if !pagado.is_finite() {
            return Err(StoreError::AbonoFallido);
        }
        self.pagado = pagado;
        Ok(())
    }
}

/// Validated creation input.
#[derive(Debug, Clone, PartialEq)]
pub struct NuevaFactura {
    /// Client-supplied id; the store generates one when absent.
    pub id: Option<FacturaId>,
    pub nombre: String,
    pub fecha: DateTime<Utc>,
    pub productos: Vec<ProductoFactura>,
    pub tipo: String,
    pub id_facturador: FacturadorId,
    pub pagado: f64,
}

impl NuevaFactura {
    /// Materialize the stored record. The total is always derived from the products.
    pub fn into_factura(self, id: FacturaId) -> Result<Factura, StoreError> {
        let total = calcular_total(&self.productos);
        if !total.is_finite() || !self.pagado.is_finite() {
            return Err(StoreError::CreacionFallida);
        }
        Ok(Factura {
            id,
            nombre: self.nombre,
            fecha: self.fecha,
            productos: self.productos,
            tipo: self.tipo,
            total,
            id_facturador: self.id_facturador,
            pagado: self.pagado,
        })
    }
}

/// Validated update input.
#[derive(Debug, Clone, PartialEq)]
pub struct CambiosFactura {
    pub productos: Vec<ProductoFactura>,
    pub tipo: Option<String>,
    pub pagado: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn producto(precio: f64, cantidad: f64) -> ProductoFactura {
        ProductoFactura::new(json!({ "nombre": "Tornillo", "precio": precio, "cantidad": cantidad }))
    }

    fn nueva() -> NuevaFactura {
        NuevaFactura {
            id: None,
            nombre: "Ferreteria Lopez".to_string(),
            fecha: "2024-03-01T00:00:00Z".parse().unwrap(),
            productos: vec![producto(2.5, 4.0), producto(10.0, 1.0)],
            tipo: "contado".to_string(),
            id_facturador: "cli-1".parse().unwrap(),
            pagado: 0.0,
        }
    }

    fn factura() -> Factura {
        nueva().into_factura("F-1".parse().unwrap()).unwrap()
    }

    #[test]
    fn total_is_derived_from_products() {
        assert_eq!(factura().total, 20.0);
    }

    #[test]
    fn products_without_price_contribute_nothing() {
        let productos = vec![
            ProductoFactura::new(json!({ "nombre": "Servicio" })),
            ProductoFactura::new(json!("texto libre")),
            ProductoFactura::new(json!({ "precio": "12", "cantidad": 1 })),
            producto(3.0, 2.0),
        ];
        assert_eq!(calcular_total(&productos), 6.0);
    }

    #[test]
    fn json_uses_hyphenated_biller_field() {
        let value = serde_json::to_value(factura()).unwrap();
        assert_eq!(value["id-facturador"], "cli-1");
        assert_eq!(value["productos"][0]["nombre"], "Tornillo");
        assert!(value.get("id_facturador").is_none());
    }

    #[test]
    fn update_keeps_fields_that_were_not_sent() {
        let mut factura = factura();
        factura.pagado = 5.0;

        factura
            .aplicar_cambios(CambiosFactura {
                productos: vec![producto(1.0, 1.0)],
                tipo: None,
                pagado: None,
            })
            .unwrap();
        assert_eq!(factura.total, 1.0);
        assert_eq!(factura.tipo, "contado");
        assert_eq!(factura.pagado, 5.0);

        factura
            .aplicar_cambios(CambiosFactura {
                productos: vec![],
                tipo: Some("credito".to_string()),
                pagado: Some(0.0),
            })
            .unwrap();
        assert_eq!(factura.total, 0.0);
        assert_eq!(factura.tipo, "credito");
        assert_eq!(factura.pagado, 0.0);
    }

    #[test]
    fn invalid_payments_are_rejected() {
        let mut factura = factura();
        for abono in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                factura.registrar_abono(abono),
                Err(StoreError::AbonoFallido)
            ));
        }
        assert_eq!(factura.pagado, 0.0);
    }

    #[test]
    fn overflowing_amounts_are_refused() {
        let mut huge = nueva();
        huge.productos = vec![producto(1e308, 1.0), producto(1e308, 1.0)];
        assert!(calcular_total(&huge.productos).is_infinite());
        assert!(matches!(
            huge.into_factura("F-1".parse().unwrap()),
            Err(StoreError::CreacionFallida)
        ));

        let mut factura = factura();
        let err = factura
            .aplicar_cambios(CambiosFactura {
                productos: vec![producto(1e308, 1.0), producto(1e308, 1.0)],
                tipo: Some("credito".to_string()),
                pagado: None,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::ActualizacionFallida));
        assert_eq!(factura.total, 20.0);
        assert_eq!(factura.tipo, "contado");

        factura.registrar_abono(1e308).unwrap();
        assert!(matches!(
            factura.registrar_abono(1e308),
            Err(StoreError::AbonoFallido)
        ));
        assert_eq!(factura.pagado, 1e308);

        let value = serde_json::to_value(&factura).unwrap();
        assert!(value["total"].is_number());
        assert!(value["pagado"].is_number());
    }

    proptest! {
        #[test]
        fn total_matches_sum_of_line_amounts(
            lines in proptest::collection::vec((0u32..10_000, 0u32..100), 0..20)
        ) {
            let productos: Vec<_> = lines
                .iter()
                .map(|(p, c)| producto(*p as f64, *c as f64))
                .collect();
            let expected: f64 = lines.iter().map(|(p, c)| (*p as f64) * (*c as f64)).sum();
            prop_assert_eq!(calcular_total(&productos), expected);
        }

        #[test]
        fn payments_accumulate(abonos in proptest::collection::vec(1u32..1_000, 1..10)) {
            let mut factura = factura();
            for abono in &abonos {
                factura.registrar_abono(*abono as f64).unwrap();
            }
            let expected: f64 = abonos.iter().map(|a| *a as f64).sum();
            prop_assert_eq!(factura.pagado, expected);
        }
    }
}
