//! Plain-language summary of a computed route for the purchasing team.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use model::order::OrderContext;
use model::plan::RoutePlan;

use crate::provider::TextGenerationProvider;

/// Labour cost per driving hour, in baht.
pub const LABOUR_COST_PER_HOUR: f64 = 500.0;
/// Transport cost below this share of the order value is worth it.
pub const COST_EFFECTIVE_PERCENTAGE: f64 = 10.0;

const SYSTEM_PROMPT: &str =
    "คุณเป็น AI Consultant ผู้เชี่ยวชาญด้านการวางแผนการขนส่งต้นไม้และจัดสวน ตอบเป็นภาษาไทย";

#[derive(Debug, Clone)]
pub struct ExplainerOptions {
    pub timeout: Duration,
}

impl Default for ExplainerOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Clone, Default)]
pub struct Explainer {
    provider: Option<Arc<dyn TextGenerationProvider>>,
    options: ExplainerOptions,
}

impl Explainer {
    /// Without a provider every explanation is the built-in summary.
    pub fn new(
        provider: Option<Arc<dyn TextGenerationProvider>>,
        options: ExplainerOptions,
    ) -> Self {
        Self { provider, options }
    }

    pub async fn explain(&self, plan: &RoutePlan, order: &OrderContext) -> String {
        let Some(provider) = &self.provider else {
            return fallback_summary(plan, order);
        };

        let prompt = build_prompt(plan, order);
        let reply = provider.generate(SYSTEM_PROMPT, &prompt);
        match tokio::time::timeout(self.options.timeout, reply).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_owned(),
            Ok(Ok(_)) => {
                log::warn!("Route explanation came back empty, using the fallback summary");
                fallback_summary(plan, order)
            }
            Ok(Err(e)) => {
                log::warn!("Route explanation unavailable, using the fallback summary: {e}");
                fallback_summary(plan, order)
            }
            Err(_) => {
                log::warn!(
                    "Route explanation timed out after {:?}, using the fallback summary",
                    self.options.timeout
                );
                fallback_summary(plan, order)
            }
        }
    }
}

/// `1234567.891` → `1,234,567.89`
fn baht(amount: f64) -> String {
    let text = format!("{:.2}", amount.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

fn transport_percentage(plan: &RoutePlan, order: &OrderContext) -> Option<f64> {
    (order.total_price > 0.0).then(|| plan.fuel_cost / order.total_price * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn for_distance_km(distance_km: f64) -> Self {
        if distance_km > 200.0 {
            RiskLevel::High
        } else if distance_km > 100.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "ต่ำ",
            RiskLevel::Medium => "ปานกลาง",
            RiskLevel::High => "สูง",
        }
    }
}

fn write_stops(out: &mut String, plan: &RoutePlan) {
    for (position, stop) in plan.route.stops.iter().enumerate() {
        let _ = write!(out, "{}. {}", position + 1, stop.name);
        let label = stop.location.label();
        if !label.is_empty() && label != stop.name {
            let _ = write!(out, " ({label})");
        }
        match stop.distance_from_previous {
            Some(meters) if !stop.is_origin() => {
                let _ = write!(out, " ← {:.1} กม.", meters / 1000.0);
            }
            None if !stop.is_origin() => out.push_str(" ← ไม่ทราบระยะทาง"),
            _ => {}
        }
        out.push('\n');
    }
    if let Some(meters) = plan.route.return_distance_meters {
        let _ = writeln!(out, "กลับจุดเริ่มต้น ← {:.1} กม.", meters / 1000.0);
    }
}

fn build_prompt(plan: &RoutePlan, order: &OrderContext) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "ข้อมูลคำสั่งซื้อ:");
    let _ = writeln!(prompt, "- ปลายทาง: {}", plan.project_location.address);
    let _ = writeln!(prompt, "- ราคาสินค้ารวม: ฿{}", baht(order.total_price));
    let _ = writeln!(prompt, "- จำนวนรายการ: {} รายการ", order.items.len());
    let _ = writeln!(prompt, "- จำนวนต้นไม้ทั้งหมด: {} ต้น", order.plant_count());

    let summaries = order.location_summaries();
    let _ = writeln!(prompt, "- จำนวนที่ตั้งที่ต้องไป: {} แห่ง", summaries.len());
    for summary in &summaries {
        let _ = writeln!(
            prompt,
            "  - {}: {} รายการ, ราคารวม ฿{}",
            summary.location,
            summary.item_count,
            baht(summary.total_value)
        );
    }

    let _ = writeln!(prompt, "\nข้อมูลเส้นทาง:");
    let _ = writeln!(prompt, "- ระยะทางรวม: {:.1} กม.", plan.total_distance_km);
    let _ = writeln!(prompt, "- เวลาโดยประมาณ: {} ชั่วโมง", plan.estimated_hours);
    let _ = writeln!(prompt, "- ค่าน้ำมัน: ฿{}", baht(plan.fuel_cost));
    if plan.route.unknown_legs > 0 {
        let _ = writeln!(
            prompt,
            "- ช่วงที่ไม่ทราบระยะทาง: {} ช่วง",
            plan.route.unknown_legs
        );
    }

    let _ = writeln!(prompt, "\nเส้นทางที่แนะนำ:");
    write_stops(&mut prompt, plan);

    prompt.push_str(
        "\nกรุณาวิเคราะห์และให้คำแนะนำในหัวข้อต่อไปนี้:\n\
         1. การวิเคราะห์ต้นทุนรวม (ต้นทุนสินค้า ค่าขนส่ง ค่าแรง และสัดส่วนค่าขนส่งต่อราคาสินค้า)\n\
         2. จำนวนรถที่เหมาะสม\n\
         3. ความเสี่ยงจากระยะทาง เวลาขนส่ง และสภาพอากาศ (ต่ำ/ปานกลาง/สูง)\n\
         4. ลำดับการจัดซื้อและการจัดเรียงสินค้าในรถ\n\
         5. ความคุ้มค่าและทางเลือกอื่น\n\
         6. คำแนะนำการประหยัดต้นทุน\n\
         7. เวลาเริ่มต้นและเวลาเผื่อที่แนะนำ\n",
    );
    prompt
}

/// Summary used whenever the text-generation provider can not be used.
pub fn fallback_summary(plan: &RoutePlan, order: &OrderContext) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "สรุปเส้นทางไปยัง {}", plan.project_location.address);
    write_stops(&mut out, plan);

    let _ = writeln!(
        out,
        "\nระยะทางรวม {:.1} กม. | เวลาโดยประมาณ {} ชั่วโมง | ค่าน้ำมัน ฿{}",
        plan.total_distance_km,
        plan.estimated_hours,
        baht(plan.fuel_cost)
    );
    if plan.route.unknown_legs > 0 {
        let _ = writeln!(
            out,
            "หมายเหตุ: มี {} ช่วงที่ไม่สามารถคำนวณระยะทางได้ ระยะทางรวมจึงอาจต่ำกว่าความเป็นจริง",
            plan.route.unknown_legs
        );
    }
    if !plan.failed_suppliers.is_empty() {
        let names = plan
            .failed_suppliers
            .iter()
            .map(|supplier| supplier.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "ร้านที่ไม่สามารถระบุตำแหน่งได้: {names}");
    }

    let labour_cost = f64::from(plan.estimated_hours) * LABOUR_COST_PER_HOUR;
    if let Some(percentage) = transport_percentage(plan, order) {
        let total_cost = order.total_price + plan.fuel_cost + labour_cost;
        let _ = writeln!(
            out,
            "\nต้นทุนสินค้า ฿{} | ค่าขนส่ง ฿{} | ค่าแรงโดยประมาณ ฿{} | ต้นทุนรวม ฿{}",
            baht(order.total_price),
            baht(plan.fuel_cost),
            baht(labour_cost),
            baht(total_cost)
        );
        let verdict = if percentage < COST_EFFECTIVE_PERCENTAGE {
            "ค่าขนส่งต่ำกว่า 10% ของราคาสินค้า ถือว่าคุ้มค่า"
        } else {
            "ค่าขนส่งสูงกว่า 10% ของราคาสินค้า ควรพิจารณาเพิ่มเติม"
        };
        let _ = writeln!(out, "สัดส่วนค่าขนส่ง {percentage:.2}%: {verdict}");
    } else {
        let _ = writeln!(out, "\nค่าแรงโดยประมาณ ฿{}", baht(labour_cost));
    }

    let risk = RiskLevel::for_distance_km(plan.total_distance_km);
    let _ = writeln!(
        out,
        "ความเสี่ยงจากระยะทาง: {} (ระยะทาง {:.1} กม.)",
        risk.label(),
        plan.total_distance_km
    );
    out.push_str("คำแนะนำ: ใช้รถ 1 คัน และดำเนินการตามแผนที่วางไว้");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTextGenerator, TextBehavior};
    use chrono::Utc;
    use model::location::{Coordinates, Location};
    use model::plan::ProjectLocation;
    use model::route::{Route, Stop};
    use rstest::rstest;

    fn plan(total_distance_km: f64) -> RoutePlan {
        let origin = Location::from_coordinates(Coordinates::new(13.7563, 100.5018));
        let supplier = Location::from_address("นนทบุรี");
        RoutePlan {
            route: Route {
                stops: vec![
                    Stop {
                        sequence_index: 0,
                        supplier_id: None,
                        name: "โปรเจกต์".to_owned(),
                        location: origin.clone(),
                        distance_from_previous: None,
                        duration_from_previous: None,
                    },
                    Stop {
                        sequence_index: 1,
                        supplier_id: None,
                        name: "สวนคุณสมชาย".to_owned(),
                        location: supplier,
                        distance_from_previous: Some(total_distance_km * 1000.0),
                        duration_from_previous: Some(600.0),
                    },
                ],
                total_distance_meters: total_distance_km * 1000.0,
                total_duration_seconds: 600.0,
                unknown_legs: 0,
                optimal: true,
                returns_to_origin: false,
                return_distance_meters: None,
                return_duration_seconds: None,
                computed_at: Utc::now(),
            },
            project_location: ProjectLocation {
                address: "หมู่บ้านสวนหลวง".to_owned(),
                location: origin,
            },
            suppliers: vec![],
            failed_suppliers: vec![],
            total_distance_km,
            estimated_hours: (total_distance_km / 50.0).ceil() as u32,
            fuel_cost: total_distance_km * 0.75,
            map_url: None,
            reasoning: String::new(),
        }
    }

    fn order(total_price: f64) -> OrderContext {
        OrderContext {
            total_price,
            ..Default::default()
        }
    }

    #[rstest]
    #[case(0.0, "0.00")]
    #[case(999.5, "999.50")]
    #[case(1234.5, "1,234.50")]
    #[case(1234567.891, "1,234,567.89")]
    fn formats_baht(#[case] amount: f64, #[case] expected: &str) {
        assert_eq!(baht(amount), expected);
    }

    #[rstest]
    #[case(50.0, RiskLevel::Low)]
    #[case(100.0, RiskLevel::Low)]
    #[case(150.0, RiskLevel::Medium)]
    #[case(250.0, RiskLevel::High)]
    fn grades_distance_risk(#[case] distance_km: f64, #[case] expected: RiskLevel) {
        assert_eq!(RiskLevel::for_distance_km(distance_km), expected);
    }

    #[tokio::test]
    async fn uses_provider_text() {
        let provider = Arc::new(ScriptedTextGenerator::new(TextBehavior::Reply(
            "  ควรออกเดินทาง 06:00  ".to_owned(),
        )));
        let explainer = Explainer::new(Some(provider.clone()), ExplainerOptions::default());
        let text = explainer.explain(&plan(12.0), &order(5000.0)).await;
        assert_eq!(text, "ควรออกเดินทาง 06:00");
        assert_eq!(provider.calls(), 1);
    }

    #[rstest]
    #[case(TextBehavior::Fail)]
    #[case(TextBehavior::Reply("   ".to_owned()))]
    #[tokio::test]
    async fn falls_back_when_provider_fails(#[case] behavior: TextBehavior) {
        let provider = Arc::new(ScriptedTextGenerator::new(behavior));
        let explainer = Explainer::new(Some(provider), ExplainerOptions::default());
        let text = explainer.explain(&plan(12.0), &order(5000.0)).await;
        assert_eq!(text, fallback_summary(&plan(12.0), &order(5000.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_on_timeout() {
        let provider = Arc::new(ScriptedTextGenerator::new(TextBehavior::Hang));
        let explainer = Explainer::new(Some(provider), ExplainerOptions::default());
        let text = explainer.explain(&plan(12.0), &order(5000.0)).await;
        assert!(text.starts_with("สรุปเส้นทางไปยัง หมู่บ้านสวนหลวง"));
    }

    #[tokio::test]
    async fn no_provider_means_fallback() {
        let text = Explainer::default().explain(&plan(12.0), &order(0.0)).await;
        assert!(!text.is_empty());
        assert!(text.contains("สวนคุณสมชาย"));
        assert!(text.contains("← 12.0 กม."));
        assert!(!text.contains("สัดส่วนค่าขนส่ง"));
    }

    #[test]
    fn fallback_judges_cost_effectiveness() {
        let cheap = fallback_summary(&plan(120.0), &order(10_000.0));
        assert!(cheap.contains("สัดส่วนค่าขนส่ง 0.90%"));
        assert!(cheap.contains("ถือว่าคุ้มค่า"));
        assert!(cheap.contains("ค่าแรงโดยประมาณ ฿1,500.00"));
        assert!(cheap.contains("ความเสี่ยงจากระยะทาง: ปานกลาง"));

        let expensive = fallback_summary(&plan(120.0), &order(500.0));
        assert!(expensive.contains("ควรพิจารณาเพิ่มเติม"));
    }

    #[test]
    fn prompt_mentions_route_and_order() {
        let prompt = build_prompt(&plan(12.0), &order(5000.0));
        assert!(prompt.contains("ปลายทาง: หมู่บ้านสวนหลวง"));
        assert!(prompt.contains("ราคาสินค้ารวม: ฿5,000.00"));
        assert!(prompt.contains("2. สวนคุณสมชาย (นนทบุรี) ← 12.0 กม."));
    }
}
