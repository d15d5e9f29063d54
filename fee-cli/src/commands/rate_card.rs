//! Offline commands over the static reference data.

use std::io::Write;

use anyhow::Result;
use fee_core::rate_card::{KNOWN_ANOMALIES, slab_regressions};
use fee_core::{
    EntityType, RateCard, RateCardKey, ServiceType, SlabId, classify_slab, format_inr,
    income_slabs,
};
use rust_decimal::Decimal;

pub fn slabs(out: &mut dyn Write) -> Result<()> {
    for slab in income_slabs() {
        writeln!(out, "{}  {}", slab.id, slab.description)?;
    }
    Ok(())
}

pub fn entities(out: &mut dyn Write) -> Result<()> {
    for entity in EntityType::ALL {
        writeln!(out, "{:<12}{}", entity.as_str(), entity.display_name())?;
    }
    Ok(())
}

pub fn services(out: &mut dyn Write) -> Result<()> {
    for service in ServiceType::ALL {
        writeln!(out, "{:<15}{}", service.as_str(), service.display_name())?;
    }
    Ok(())
}

/// One row per slab and entity, one column per service.
pub fn rate_card(
    out: &mut dyn Write,
    slab: Option<i64>,
    regressions: bool,
) -> Result<()> {
    let slabs = match slab {
        Some(id) => vec![SlabId::try_from(id)?],
        None => SlabId::ALL.to_vec(),
    };

    write!(out, "{:<6}{:<12}", "slab", "entity")?;
    for service in ServiceType::ALL {
        write!(out, "{:>15}", service.as_str())?;
    }
    writeln!(out)?;

    for slab in slabs {
        for entity in EntityType::ALL {
            write!(out, "{:<6}{:<12}", slab.get(), entity.as_str())?;
            for service in ServiceType::ALL {
                let key = RateCardKey {
                    slab,
                    entity_type: entity,
                    service_type: service,
                };
                write!(out, "{:>15}", format_inr(key.fee()))?;
            }
            writeln!(out)?;
        }
    }

    if regressions {
        writeln!(out)?;
        writeln!(out, "Cells cheaper than the slab below:")?;
        for r in slab_regressions() {
            writeln!(
                out,
                "  {}: {} (slab below: {})",
                r.key,
                format_inr(r.fee),
                format_inr(r.previous_fee)
            )?;
        }
        for anomaly in KNOWN_ANOMALIES {
            writeln!(out, "Known anomaly: {}: {}", anomaly.key, anomaly.note)?;
        }
    }
    Ok(())
}

pub fn quote(
    out: &mut dyn Write,
    slab: i64,
    entity: &str,
    service: &str,
) -> Result<()> {
    let slab = u8::from(SlabId::try_from(slab)?);
    let key = RateCardKey::parse(slab, entity, service)?;
    writeln!(out, "{key}: {}", format_inr(RateCard::quote(slab, entity, service)?))?;
    Ok(())
}

pub fn classify(
    out: &mut dyn Write,
    income: Decimal,
    turnover: Decimal,
    quote_for: Option<(EntityType, ServiceType)>,
) -> Result<()> {
    let classification = classify_slab(income, turnover)?;
    writeln!(
        out,
        "Slab {} (income alone: slab {}, turnover alone: slab {})",
        classification.slab, classification.by_income, classification.by_turnover
    )?;
    writeln!(out, "{}", classification.slab.slab().description)?;

    if let Some((entity_type, service_type)) = quote_for {
        let key = RateCardKey {
            slab: classification.slab,
            entity_type,
            service_type,
        };
        writeln!(out, "{key}: {}", format_inr(key.fee()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use fee_core::RateCardError;

    use super::*;

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn slabs_lists_five() {
        let text = render(slabs);

        assert_eq!(text.lines().count(), 5);
        assert!(text.starts_with("1  GROSS INCOME UPTO 15 LAKHS"));
    }

    #[test]
    fn quote_formats_rupees() {
        let text = render(|out| quote(out, 2, "company", "transfer"));

        assert_eq!(text, "slab 2 / company / transfer: ₹50,000\n");
    }

    #[test]
    fn quote_rejects_invalid_slab() {
        let mut out = Vec::new();

        let err = quote(&mut out, 6, "company", "transfer").unwrap_err();

        assert_eq!(err.to_string(), "invalid income slab: '6'");
    }

    #[test]
    fn quote_reports_wide_slab_as_invalid_key() {
        let mut out = Vec::new();

        let err = quote(&mut out, 300, "company", "transfer").unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RateCardError>(),
            Some(RateCardError::InvalidKey { .. })
        ));
        assert_eq!(err.to_string(), "invalid income slab: '300'");
    }

    #[test]
    fn rate_card_single_slab() {
        let text = render(|out| rate_card(out, Some(4), false));

        // Header plus one row per entity.
        assert_eq!(text.lines().count(), 5);
        let society = text.lines().last().unwrap();
        assert!(society.starts_with("4     society"));
        assert!(society.contains("₹1,000"));
    }

    #[test]
    fn rate_card_reports_regressions() {
        let text = render(|out| rate_card(out, None, true));

        assert_eq!(text.lines().count(), 21 + 5);
        assert!(text.contains("  slab 2 / society / rectification: ₹3,000 (slab below: ₹5,000)"));
        assert!(text.contains("  slab 4 / society / penalty: ₹1,000 (slab below: ₹10,000)"));
        assert!(text.contains("Known anomaly: slab 4 / society / penalty"));
    }

    #[test]
    fn classify_with_quote() {
        let text = render(|out| {
            classify(
                out,
                dec!(12),
                dec!(1200),
                Some((EntityType::Company, ServiceType::Assessment)),
            )
        });

        assert!(text.starts_with("Slab 4 (income alone: slab 1, turnover alone: slab 4)\n"));
        assert!(text.ends_with("slab 4 / company / assessment: ₹15,000\n"));
    }

    #[test]
    fn classify_rejects_negative_income() {
        let mut out = Vec::new();

        assert!(classify(&mut out, dec!(-1), dec!(0), None).is_err());
    }
}
