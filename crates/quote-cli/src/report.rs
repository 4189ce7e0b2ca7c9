use quote_types::{ErrorCode, MeshBounds, Metrics, Platform, PriceBreakdown, PricingSelection};
use serde::Serialize;

use crate::messages::describe;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteReport {
    pub file: String,
    pub platform: Platform,
    pub selection: PricingSelection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<MeshBounds>,
    pub price: PriceBreakdown,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub title: &'static str,
    pub message: &'static str,
}

impl From<ErrorCode> for ErrorReport {
    fn from(code: ErrorCode) -> Self {
        let (title, message) = describe(code);
        Self {
            code,
            title,
            message,
        }
    }
}

impl QuoteReport {
    pub fn to_text(&self) -> String {
        let mut lines = vec![format!("File: {}", self.file)];
        if let Some(err) = &self.error {
            lines.push(format!("Error [{}]: {}", err.code, err.title));
            lines.push(format!("  {}", err.message));
            return lines.join("\n");
        }
        if let Some(m) = &self.metrics {
            lines.push(format!("Volume:          {:.2} cm³", m.volume_cm3()));
            lines.push(format!("Surface area:    {:.2} cm²", m.surface_area_cm2()));
            lines.push(format!("Horizontal area: {:.2} cm²", m.horizontal_area_cm2()));
        }
        if let Some(b) = &self.bounds {
            let (w, d) = b.footprint();
            lines.push(format!("Size (W×D×H):    {w:.1} × {d:.1} × {:.1} mm", b.height));
        }
        let s = &self.selection;
        lines.push(format!(
            "Selection:       {} {} {}% infill × {}",
            s.material, s.color_hex, s.infill_percent, s.quantity
        ));
        let p = &self.price;
        lines.push(format!("Weight:          {:.2} g", p.weight_grams));
        lines.push(format!("Unit price:      {:.2} {}", p.unit_price, self.currency));
        lines.push(format!("Total:           {:.2} {}", p.total_price, self.currency));
        if p.color_surcharge_applied {
            lines.push("                 (color surcharge applied)".to_string());
        }
        if p.minimum_applied {
            lines.push(format!(
                "Final total:     {:.2} {} (minimum order)",
                p.final_total_price, self.currency
            ));
        } else {
            lines.push(format!("Final total:     {:.2} {}", p.final_total_price, self.currency));
        }
        lines.join("\n")
    }
}
