//! Email subject and body rendering for classified alerts

use types::ClassifiedAlert;

/// Adaptive precision so low-priced instruments keep meaningful digits
pub fn format_price(value: f64) -> String {
    let abs = value.abs();
    if abs >= 100.0 {
        format!("{value:.2}")
    } else if abs >= 1.0 {
        format!("{value:.4}")
    } else {
        format!("{value:.6}")
    }
}

/// `[LEVEL] SYMBOL STRATEGY DIRECTION @ entry (R:R x.xx)`
pub fn subject(alert: &ClassifiedAlert) -> String {
    let opp = &alert.opportunity;
    format!(
        "[{}] {} {} {} @ {} (R:R {:.2})",
        alert.level,
        opp.symbol,
        opp.strategy.as_str().to_uppercase(),
        opp.direction,
        format_price(opp.entry),
        opp.net_risk_reward
    )
}

pub fn html_body(alert: &ClassifiedAlert, snapshot_base_url: Option<&str>) -> String {
    let opp = &alert.opportunity;
    let risk = opp.risk_per_unit();
    let risk_pct = if opp.entry != 0.0 {
        risk / opp.entry * 100.0
    } else {
        0.0
    };
    let minutes = alert.time_to_trigger.as_secs() / 60;

    let mut rows = vec![
        ("Level", alert.level.to_string()),
        ("Strategy", opp.strategy.as_str().to_uppercase()),
        ("Direction", opp.direction.to_string()),
        ("Entry", format_price(opp.entry)),
        ("Stop loss", format_price(opp.stop_loss)),
        ("Take profit 1", format_price(opp.take_profit_1)),
        ("Take profit 2", format_price(opp.take_profit_2)),
        ("Risk", format!("{} ({risk_pct:.2}%)", format_price(risk))),
        (
            "Risk/reward",
            format!("{:.2} net / {:.2} raw", opp.net_risk_reward, opp.raw_risk_reward),
        ),
        ("Distance", format!("{:+.2}%", alert.distance * 100.0)),
        ("Time to trigger", format!("~{minutes} min")),
        ("Trigger", escape(&opp.trigger)),
    ];

    if let (Some(base), Some(id)) = (snapshot_base_url, opp.snapshot_id.as_deref()) {
        let href = format!("{}/{}", base.trim_end_matches('/'), escape(id));
        rows.push(("Snapshot", format!("<a href=\"{href}\">{}</a>", escape(id))));
    }

    let body: String = rows
        .iter()
        .map(|(label, value)| format!("<tr><th align=\"left\">{label}</th><td>{value}</td></tr>"))
        .collect();

    format!(
        "<h2>{} {}</h2><table cellpadding=\"4\">{}</table><p><small>Generated {}</small></p>",
        escape(&opp.symbol),
        alert.level,
        body,
        alert.classified_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
